use outlook_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("storage I/O failed: {0}")]
    Io(String),
    #[error("storage backend request failed: {0}")]
    Request(String),
    #[error("upload session for {filename} returned unexpected status {status}")]
    UnexpectedUploadStatus { filename: String, status: u16 },
}

impl From<AttachmentError> for CoreError {
    fn from(err: AttachmentError) -> Self {
        CoreError::StorageError { reason: err.to_string() }
    }
}

impl From<std::io::Error> for AttachmentError {
    fn from(err: std::io::Error) -> Self {
        AttachmentError::Io(err.to_string())
    }
}
