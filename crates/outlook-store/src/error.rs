//! Adapter-local error type, grounded on the teacher's `CacheError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    #[error("failed to serialize/deserialize row data: {0}")]
    SerializationError(String),

    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl From<StoreError> for outlook_core::CoreError {
    fn from(err: StoreError) -> Self {
        outlook_core::CoreError::Internal {
            reason: err.to_string(),
        }
    }
}
