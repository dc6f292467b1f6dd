//! Adapter-local error type for OAuth transport/parsing failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid OAuth endpoint configuration: {0}")]
    InvalidEndpoint(String),

    #[error("token exchange request failed: {0}")]
    RequestFailed(String),

    #[error("token endpoint returned invalid_grant (refresh token expired or revoked)")]
    InvalidGrant,

    #[error("failed to resolve authenticated user's email from Graph profile")]
    UserIdentificationFailed,

    #[error("token store error: {0}")]
    Store(String),
}

impl From<AuthError> for outlook_core::CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidGrant => outlook_core::CoreError::TokenRefreshFailed {
                reason: err.to_string(),
            },
            other => outlook_core::CoreError::Internal {
                reason: other.to_string(),
            },
        }
    }
}
