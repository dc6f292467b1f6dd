use outlook_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session exists for {email}")]
    NotFound { email: String },
}

impl From<SessionError> for CoreError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { email } => CoreError::AuthenticationRequired { email },
        }
    }
}
