use outlook_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum DispatcherError {
    #[error("failed to read tool catalog {path}: {reason}")]
    CatalogRead { path: String, reason: String },

    #[error("tool catalog {path} is not valid YAML: {reason}")]
    CatalogParse { path: String, reason: String },

    #[error("no tool named {name} in the catalog")]
    UnknownTool { name: String },
}

impl From<DispatcherError> for CoreError {
    fn from(err: DispatcherError) -> Self {
        CoreError::ValidationError { reason: err.to_string() }
    }
}
