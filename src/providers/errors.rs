use crate::models::CloudProvider;
use thiserror::Error;

/// Failures raised by the provider registry and by Scanner/Cleaner implementations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider not supported: {provider}")]
    Unsupported { provider: CloudProvider },

    #[error("invalid credentials for {provider}: {reason}")]
    CredentialsInvalid {
        provider: CloudProvider,
        reason: String,
    },

    #[error("{provider} {operation} failed: {message}")]
    Api {
        provider: CloudProvider,
        operation: String,
        message: String,
    },
}

impl ProviderError {
    pub fn credentials_invalid(provider: CloudProvider, reason: impl Into<String>) -> Self {
        Self::CredentialsInvalid {
            provider,
            reason: reason.into(),
        }
    }

    pub fn api(
        provider: CloudProvider,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            provider,
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Remote API failures may clear up on retry; registry failures will not
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
