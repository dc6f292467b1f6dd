//! OneDrive [`StorageBackend`] (§4.5.3), grounded on the teacher's
//! `upload.rs` (`build_item_path`, `upload_small`, `create_upload_session`,
//! `upload_chunk`) generalized from a single personal drive to per-user
//! mailbox drives addressed by `user_email`.

use std::time::Duration;

use async_trait::async_trait;
use outlook_core::domain::{MailFile, MailFolder};
use outlook_core::error::CoreError;
use outlook_core::ports::storage::{ProgressCallback, StorageBackend};
use reqwest::{Method, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::AttachmentError;

/// Simple uploads are used below this size; above it a chunked resumable
/// session is used instead, per §4.5.3.
const SIMPLE_UPLOAD_CEILING: u64 = 4 * 1024 * 1024;

/// Default chunk size for resumable uploads.
const CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Graph's hard ceiling on a single OneDrive file.
const MAX_FILE_SIZE: u64 = 250 * 1024 * 1024 * 1024;

/// Delay before the single chunk-upload retry on an unexpected status,
/// per §4.5.3.
const CHUNK_RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct OneDriveStorageBackend {
    user_email: String,
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl OneDriveStorageBackend {
    pub fn new(user_email: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::with_base_url(user_email, access_token, outlook_graph::BASE_URL)
    }

    pub fn with_base_url(
        user_email: impl Into<String>,
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            user_email: user_email.into(),
            access_token: access_token.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn drive_root(&self) -> String {
        format!("{}/users/{}/drive/root", self.base_url, urlencoding::encode(&self.user_email))
    }

    /// Builds the item-by-path URL for a folder-level child, mirroring the
    /// teacher's `build_item_path` but scoped to the mailbox owner's drive.
    fn folder_item_url(&self, folder_name: &str) -> String {
        format!("{}:/{}", self.drive_root(), urlencoding::encode(folder_name))
    }

    fn file_item_url(&self, folder_name: &str, filename: &str, suffix: &str) -> String {
        format!(
            "{}:/{}/{}:/{}",
            self.drive_root(),
            urlencoding::encode(folder_name),
            urlencoding::encode(filename),
            suffix
        )
    }

    async fn get_json(&self, url: &str) -> Result<Option<Value>, AttachmentError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AttachmentError::Request(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(AttachmentError::Request(format!(
                "GET {url} returned status {status}"
            )));
        }
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| AttachmentError::Request(e.to_string()))
    }

    async fn upload_small(&self, folder_name: &str, file: &MailFile, data: &[u8]) -> Result<Value, AttachmentError> {
        let url = self.file_item_url(folder_name, &file.filename, "content");
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| AttachmentError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttachmentError::UnexpectedUploadStatus {
                filename: file.filename.clone(),
                status: status.as_u16(),
            });
        }
        response.json().await.map_err(|e| AttachmentError::Request(e.to_string()))
    }

    async fn create_upload_session(&self, folder_name: &str, file: &MailFile) -> Result<String, AttachmentError> {
        let url = self.file_item_url(folder_name, &file.filename, "createUploadSession");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "item": { "@microsoft.graph.conflictBehavior": "rename" } }))
            .send()
            .await
            .map_err(|e| AttachmentError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttachmentError::UnexpectedUploadStatus {
                filename: file.filename.clone(),
                status: status.as_u16(),
            });
        }
        let body: Value = response.json().await.map_err(|e| AttachmentError::Request(e.to_string()))?;
        body.get("uploadUrl")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AttachmentError::Request("createUploadSession response missing uploadUrl".into()))
    }

    async fn put_chunk(&self, upload_url: &str, data: &[u8], content_range: &str) -> Result<Response, AttachmentError> {
        self.client
            .put(upload_url)
            .header("Content-Length", data.len().to_string())
            .header("Content-Range", content_range)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| AttachmentError::Request(e.to_string()))
    }

    /// Uploads one chunk; returns `Some(body)` on the final chunk (200/201),
    /// `None` for an intermediate 202. On an unexpected status the chunk is
    /// retried once after a 2s delay; if the retry also fails, the upload
    /// session is cancelled with a single `DELETE` before returning the
    /// error, per §4.5.3's retry-once-then-cancel rule.
    async fn upload_chunk(
        &self,
        upload_url: &str,
        filename: &str,
        data: &[u8],
        offset: u64,
        total: u64,
    ) -> Result<Option<Value>, AttachmentError> {
        let end = offset + data.len() as u64 - 1;
        let content_range = format!("bytes {offset}-{end}/{total}");

        let mut response = self.put_chunk(upload_url, data, &content_range).await?;
        let mut status = response.status();

        if status != StatusCode::OK && status != StatusCode::CREATED && status != StatusCode::ACCEPTED {
            debug!(filename, %status, "unexpected chunk upload status, retrying once after a delay");
            tokio::time::sleep(CHUNK_RETRY_DELAY).await;
            response = self.put_chunk(upload_url, data, &content_range).await?;
            status = response.status();
        }

        if status == StatusCode::OK || status == StatusCode::CREATED {
            let body: Value = response.json().await.map_err(|e| AttachmentError::Request(e.to_string()))?;
            return Ok(Some(body));
        }
        if status == StatusCode::ACCEPTED {
            return Ok(None);
        }

        debug!(filename, %status, "chunk upload failed again after retry, cancelling session");
        let _ = self.client.delete(upload_url).send().await;
        Err(AttachmentError::UnexpectedUploadStatus {
            filename: filename.to_string(),
            status: status.as_u16(),
        })
    }

    async fn upload_large(
        &self,
        folder_name: &str,
        file: &MailFile,
        data: &[u8],
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Value, AttachmentError> {
        let total = data.len() as u64;
        let upload_url = self.create_upload_session(folder_name, file).await?;
        let mut offset: u64 = 0;
        let mut final_body = None;

        while offset < total {
            let end = std::cmp::min(offset + CHUNK_SIZE as u64, total);
            let chunk = &data[offset as usize..end as usize];
            let result = self
                .upload_chunk(&upload_url, &file.filename, chunk, offset, total)
                .await?;
            offset = end;
            if let Some(cb) = on_progress {
                cb(offset, total);
            }
            if let Some(body) = result {
                final_body = Some(body);
            }
        }

        final_body.ok_or_else(|| AttachmentError::Request("upload session completed without a final response".into()))
    }
}

#[async_trait]
impl StorageBackend for OneDriveStorageBackend {
    async fn ensure_folder(&self, folder: &MailFolder) -> Result<String, CoreError> {
        let url = self.folder_item_url(&folder.name);
        if let Some(existing) = self.get_json(&url).await.map_err(CoreError::from)? {
            return Ok(existing.get("id").and_then(Value::as_str).unwrap_or_default().to_string());
        }

        let create_url = format!("{}/children", self.drive_root());
        let response = self
            .client
            .request(Method::POST, &create_url)
            .bearer_auth(&self.access_token)
            .json(&json!({
                "name": folder.name,
                "folder": {},
                "@microsoft.graph.conflictBehavior": "fail",
            }))
            .send()
            .await
            .map_err(|e| AttachmentError::Request(e.to_string()))
            .map_err(CoreError::from)?;

        if !response.status().is_success() {
            return Err(AttachmentError::Request(format!(
                "failed to create OneDrive folder {}: status {}",
                folder.name,
                response.status()
            ))
            .into());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AttachmentError::Request(e.to_string()))
            .map_err(CoreError::from)?;
        Ok(body.get("id").and_then(Value::as_str).unwrap_or_default().to_string())
    }

    async fn save_file(
        &self,
        folder: &MailFolder,
        file: &MailFile,
        contents: Vec<u8>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<String, CoreError> {
        let total = contents.len() as u64;
        if total > MAX_FILE_SIZE {
            return Err(AttachmentError::Request(format!(
                "file {} ({} bytes) exceeds the 250 GiB OneDrive ceiling",
                file.filename, total
            ))
            .into());
        }

        let body = if total <= SIMPLE_UPLOAD_CEILING {
            let body = self
                .upload_small(&folder.name, file, &contents)
                .await
                .map_err(CoreError::from)?;
            if let Some(cb) = on_progress {
                cb(total, total);
            }
            body
        } else {
            self.upload_large(&folder.name, file, &contents, on_progress.as_ref())
                .await
                .map_err(CoreError::from)?
        };

        Ok(body
            .get("webUrl")
            .or_else(|| body.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn file_exists(&self, folder: &MailFolder, file: &MailFile) -> Result<bool, CoreError> {
        let url = self.file_item_url(&folder.name, &file.filename, "");
        let url = url.trim_end_matches(":/");
        Ok(self.get_json(url).await.map_err(CoreError::from)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OneDriveStorageBackend {
        OneDriveStorageBackend::with_base_url("user@example.com", "test-token", server.uri())
    }

    fn folder() -> MailFolder {
        MailFolder { name: "20260305_Ada_Hello".to_string() }
    }

    #[tokio::test]
    async fn ensure_folder_returns_existing_id_without_creating() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"/drive/root:/20260305_Ada_Hello$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "existing-id"})))
            .mount(&server)
            .await;

        let id = backend(&server).ensure_folder(&folder()).await.unwrap();
        assert_eq!(id, "existing-id");
    }

    #[tokio::test]
    async fn ensure_folder_creates_when_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"/drive/root:/20260305_Ada_Hello$"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"/drive/root/children$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "new-id"})))
            .mount(&server)
            .await;

        let id = backend(&server).ensure_folder(&folder()).await.unwrap();
        assert_eq!(id, "new-id");
    }

    #[tokio::test]
    async fn save_file_below_ceiling_uses_simple_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(r":/content$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"webUrl": "https://example.com/f"})))
            .mount(&server)
            .await;

        let file = MailFile::sanitize("notes.txt");
        let url = backend(&server)
            .save_file(&folder(), &file, b"hello".to_vec(), None)
            .await
            .unwrap();
        assert_eq!(url, "https://example.com/f");
    }

    #[tokio::test]
    async fn upload_chunk_retries_once_then_succeeds() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/upload-session", server.uri());

        Mock::given(method("PUT"))
            .and(path_regex(r"/upload-session$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "done"})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"/upload-session$"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let body = backend(&server)
            .upload_chunk(&upload_url, "file.bin", b"hello", 0, 5)
            .await
            .unwrap();
        assert_eq!(body.unwrap()["id"], "done");
    }

    #[tokio::test]
    async fn upload_chunk_cancels_session_after_the_retry_also_fails() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/upload-session", server.uri());

        Mock::given(method("PUT"))
            .and(path_regex(r"/upload-session$"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"/upload-session$"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = backend(&server)
            .upload_chunk(&upload_url, "file.bin", b"hello", 0, 5)
            .await
            .unwrap_err();
        match err {
            AttachmentError::UnexpectedUploadStatus { status, .. } => assert_eq!(status, 500),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
