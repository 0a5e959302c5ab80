use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint (such as the resource natural key) was violated
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    /// A stored value could not be mapped back onto the domain model
    #[error("Failed to decode {entity}: {reason}")]
    Decode { entity: &'static str, reason: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl PersistenceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn decode(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            entity,
            reason: reason.into(),
        }
    }

    /// Only store-level failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for PersistenceError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(format!("migration failed: {err}"))
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
