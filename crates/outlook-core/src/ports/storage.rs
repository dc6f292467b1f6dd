//! Attachment Pipeline storage port (component E), grounded on the
//! teacher's `ICloudProvider::{upload_file, upload_file_session,
//! download_file}` — generalized from a single provider to a pluggable
//! local-disk-or-OneDrive backend per §4.5.3.

use async_trait::async_trait;

use crate::domain::{MailFile, MailFolder};
use crate::error::CoreError;

/// Reports chunked-upload progress; invoked after each chunk completes.
/// Mirrors the teacher's `upload_file_session` progress callback shape.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Persists mail bodies and attachments to either local disk or OneDrive,
/// chosen at startup via `OUTLOOK_MCP_STORAGE_BACKEND` (§2.1).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Ensures `folder` exists under the configured storage root, returning
    /// its fully-qualified path (local path or OneDrive folder id/URL).
    async fn ensure_folder(&self, folder: &MailFolder) -> Result<String, CoreError>;

    /// Writes `contents` as `file` inside `folder`. For OneDrive, uses a
    /// simple upload below the 4 MiB threshold and a resumable chunked
    /// upload session above it (10 MiB default chunk, 250 GiB ceiling),
    /// reporting progress via `on_progress` if given.
    async fn save_file(
        &self,
        folder: &MailFolder,
        file: &MailFile,
        contents: Vec<u8>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<String, CoreError>;

    /// True if `file` already exists inside `folder` (used for the
    /// collision-suffixing rule in [`crate::domain::MailFile::with_dedup_suffix`]).
    async fn file_exists(&self, folder: &MailFolder, file: &MailFile) -> Result<bool, CoreError>;
}
