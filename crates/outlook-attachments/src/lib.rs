//! Attachment pipeline, storage backends, and conversion registry for
//! outlook-mcp (component E, §4.5).

pub mod conversion;
pub mod error;
pub mod html;
pub mod local_storage;
pub mod metadata;
pub mod onedrive_storage;
pub mod orchestrator;

pub use conversion::{ConversionRegistry, Converter};
pub use error::AttachmentError;
pub use local_storage::LocalStorageBackend;
pub use metadata::MetadataStore;
pub use onedrive_storage::OneDriveStorageBackend;
pub use orchestrator::{AttachmentOrchestrator, ProcessOptions, ProcessedMessageResult};
