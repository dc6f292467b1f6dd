//! JSON-file-backed `ProcessedMessageMetadata` store (§4.5.5): a single
//! writer lock around read-modify-write, with a lossy reset to empty on
//! parse failure rather than propagating the error.

use std::path::PathBuf;

use outlook_core::domain::attachment::{ProcessedMessageMetadata, ProcessedMessageRecord};
use outlook_core::error::CoreError;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::AttachmentError;

pub struct MetadataStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> ProcessedMessageMetadata {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), %err, "processed-message metadata file is corrupt, resetting to empty");
                ProcessedMessageMetadata::default()
            }),
            Err(_) => ProcessedMessageMetadata::default(),
        }
    }

    async fn store(&self, metadata: &ProcessedMessageMetadata) -> Result<(), AttachmentError> {
        let bytes = serde_json::to_vec_pretty(metadata)
            .map_err(|e| AttachmentError::Io(format!("failed to serialize metadata: {e}")))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    pub async fn is_duplicate(&self, message_id: &str) -> bool {
        let _guard = self.lock.lock().await;
        self.load().await.is_duplicate(message_id)
    }

    pub async fn filter_new_messages(&self, ids: &[String]) -> Vec<String> {
        let _guard = self.lock.lock().await;
        self.load()
            .await
            .filter_new(ids)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub async fn add_processed_mail(&self, record: ProcessedMessageRecord) -> Result<(), CoreError> {
        let _guard = self.lock.lock().await;
        let mut metadata = self.load().await;
        metadata.add_processed(record);
        self.store(&metadata).await.map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str) -> ProcessedMessageRecord {
        ProcessedMessageRecord {
            message_id: id.to_string(),
            subject: "Hello".to_string(),
            sender: "a@example.com".to_string(),
            received_date_time: Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap(),
            folder_path: "20260305_a_Hello".to_string(),
            saved_file_paths: vec!["20260305_a_Hello/body.txt".to_string()],
            processed_at: Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 1).unwrap(),
            attachment_count: 0,
        }
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(tmp.path().join("processed.json"));
        assert!(!store.is_duplicate("m1").await);
        store.add_processed_mail(record("m1")).await.unwrap();
        assert!(store.is_duplicate("m1").await);
    }

    #[tokio::test]
    async fn filter_new_messages_excludes_processed_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(tmp.path().join("processed.json"));
        store.add_processed_mail(record("m1")).await.unwrap();
        let ids = vec!["m1".to_string(), "m2".to_string()];
        assert_eq!(store.filter_new_messages(&ids).await, vec!["m2".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_file_resets_to_empty_instead_of_erroring() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = MetadataStore::new(&path);
        assert!(!store.is_duplicate("m1").await);
        store.add_processed_mail(record("m1")).await.unwrap();
        assert!(store.is_duplicate("m1").await);
    }
}
