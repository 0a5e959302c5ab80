//! # Error Types
//!
//! Crate-level error taxonomy. Each layer owns a narrower `thiserror` enum
//! (`ProviderError`, `PersistenceError`, `StateMachineError`) that converts into
//! [`CloudSweepError`] so orchestrators can propagate with `?`.

use crate::providers::ProviderError;
use crate::repository::PersistenceError;
use crate::state_machine::StateMachineError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CloudSweepError {
    /// Malformed input rejected before orchestration begins
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error(transparent)]
    StateTransition(#[from] StateMachineError),

    #[error("Scan {0} was cancelled")]
    ScanCancelled(Uuid),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CloudSweepError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether retrying the same request could succeed (provider and store hiccups)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::Persistence(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<config::ConfigError> for CloudSweepError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CloudSweepError>;
