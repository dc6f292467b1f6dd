//! `CoreError` — the domain error taxonomy (§7).
//!
//! Domain and adapter code returns `CoreError` (or `Result<T, CoreError>`)
//! across crate boundaries; `anyhow::Error` is reserved for call sites that
//! only need to propagate and log a failure without matching on its kind,
//! per the teacher's `DomainError`/`anyhow::Context` split.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors raised while constructing a domain newtype (e.g.
/// [`crate::domain::Email`]), kept distinct from [`CoreError`] since
/// newtype construction happens below the level of any request/response
/// cycle and has no request context to attach.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        CoreError::ValidationError {
            reason: err.to_string(),
        }
    }
}

/// One failed item inside a partially-successful batch operation (§4.4.3's
/// `batch_fetch_by_ids`, §7's `GraphPartialFailure`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerItemError {
    pub item_id: String,
    pub message: String,
}

/// The nine-kind error taxonomy from §7. `DuplicateMessage` is intentionally
/// absent: per §4.5.2, an already-processed message is a skip, not a
/// failure, and is reported as a count rather than an error variant.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoreError {
    /// No valid session/token exists for the caller and interactive
    /// authentication is required before retrying.
    #[error("authentication required for {email}")]
    AuthenticationRequired { email: String },

    /// A refresh attempt failed; `kind` narrows why (see
    /// [`crate::domain::RefreshErrorKind`]).
    #[error("token refresh failed: {reason}")]
    TokenRefreshFailed { reason: String },

    /// The Graph API returned a non-2xx status for a single-request
    /// operation. `body_prefix` is truncated to avoid leaking large
    /// response bodies into logs.
    #[error("graph query failed ({status}) for {url}")]
    GraphQueryError {
        url: String,
        status: u16,
        body_prefix: String,
    },

    /// A multi-item operation (batch fetch, parallel pagination) completed
    /// with some items failing; `errors` carries the per-item detail and
    /// callers decide whether the partial result is usable.
    #[error("{} of a batch operation failed", errors.len())]
    GraphPartialFailure { errors: Vec<PerItemError> },

    /// An attachment could not be downloaded or saved and was skipped
    /// without aborting the rest of the message's pipeline (§4.5.2).
    #[error("attachment {filename} skipped: {reason}")]
    AttachmentSkipped { filename: String, reason: String },

    /// A document converter failed or no converter is registered for the
    /// attachment's content type.
    #[error("conversion failed for {filename}: {reason}")]
    ConversionError { filename: String, reason: String },

    /// The configured storage backend (local disk or OneDrive) failed to
    /// persist a file or folder.
    #[error("storage operation failed: {reason}")]
    StorageError { reason: String },

    /// Caller-supplied tool input failed JSON Schema validation or a
    /// structural invariant check before dispatch.
    #[error("validation failed: {reason}")]
    ValidationError { reason: String },

    /// A lower-level I/O, database, or HTTP transport failure that does not
    /// map onto a more specific variant above.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl CoreError {
    pub fn graph_query(url: impl Into<String>, status: u16, body: &str) -> Self {
        let body_prefix: String = body.chars().take(512).collect();
        Self::GraphQueryError {
            url: url.into(),
            status,
            body_prefix,
        }
    }

    /// Whether this error should cause the dispatcher to invalidate the
    /// caller's session before surfacing a response (per §4.6: token errors
    /// observed mid-call trigger session invalidation).
    pub fn requires_session_invalidation(&self) -> bool {
        matches!(
            self,
            CoreError::AuthenticationRequired { .. } | CoreError::TokenRefreshFailed { .. }
        )
    }
}
