//! Adapter-local error type for the Graph HTTP client, converted into
//! `CoreError` at the `GraphQueryEngine` trait boundary.

use outlook_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("request to {url} returned {status}: {body_prefix}")]
    HttpStatus {
        url: String,
        status: u16,
        body_prefix: String,
    },

    #[error("retries exhausted for {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("failed to decode response body from {url}: {reason}")]
    DecodeFailed { url: String, reason: String },
}

impl From<GraphError> for CoreError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::RequestFailed { url, reason } => CoreError::graph_query(url, 0, &reason),
            GraphError::HttpStatus {
                url,
                status,
                body_prefix,
            } => CoreError::graph_query(url, status, &body_prefix),
            GraphError::RetriesExhausted { url, attempts } => {
                CoreError::graph_query(url, 429, &format!("retries exhausted after {attempts} attempts"))
            }
            GraphError::DecodeFailed { url, reason } => CoreError::graph_query(url, 0, &reason),
        }
    }
}
