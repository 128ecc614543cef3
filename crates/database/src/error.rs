use core_types::ValidationError;
use thiserror::Error;
use uuid::Uuid;

/// Everything that can go wrong inside the data-access layer, split by how
/// the caller should react: validation and not-found failures are final,
/// connection failures are transient and worth retrying, and anything
/// uncategorized is logged in full and treated as retryable.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("soil report {0} not found")]
    NotFound(Uuid),

    #[error("database connection failure: {0}")]
    Connection(String),

    #[error("database environment is not configured: {0}")]
    Config(String),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("unexpected database error: {0}")]
    Unknown(#[from] sqlx::Error),
}

impl StoreError {
    /// Classifies a raw sqlx failure. Infrastructure-level errors become
    /// `Connection` so the retry executor will take another swing at them;
    /// everything else stays `Unknown`.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StoreError::Connection(err.to_string()),
            other => StoreError::Unknown(other),
        }
    }

    /// Whether this failure is worth retrying. Validation and not-found
    /// errors are final; retrying them would only repeat the answer.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Validation(_)
            | StoreError::NotFound(_)
            | StoreError::Config(_)
            | StoreError::Migration(_) => false,
            StoreError::Connection(_) | StoreError::Unknown(_) => true,
        }
    }
}
