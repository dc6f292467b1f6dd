//! Per-message attachment pipeline orchestrator (§4.5.2), composing a
//! [`StorageBackend`], [`ConversionRegistry`], and [`MetadataStore`].
//!
//! Message+attachment fetching goes through `outlook-graph`'s `GraphClient`
//! directly rather than `GraphQueryEngine::batch_fetch_by_ids`: that trait
//! method has no `$expand` parameter, and `$expand=attachments` is specific
//! to this pipeline's read path (§4.5.1), not a general mail-query concern.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use outlook_core::domain::attachment::{MailFile, MailFolder, ProcessedMessageRecord};
use outlook_core::error::CoreError;
use outlook_core::ports::storage::StorageBackend;
use outlook_graph::GraphClient;

use crate::conversion::ConversionRegistry;
use crate::error::AttachmentError;
use crate::html::html_to_text;
use crate::metadata::MetadataStore;

/// Default fields fetched for each message, per §4.5.1.
const DEFAULT_SELECT: &str = "id,subject,from,receivedDateTime,body,hasAttachments";

/// Graph caps a single `$batch` request at 20 sub-requests.
const BATCH_CHUNK_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub skip_duplicates: bool,
    pub save_file: bool,
    pub include_body: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            save_file: true,
            include_body: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessedMessageResult {
    pub message_id: String,
    pub skipped: bool,
    pub folder_path: Option<String>,
    pub saved_file_paths: Vec<String>,
    pub attachment_errors: Vec<String>,
}

pub struct AttachmentOrchestrator {
    user_email: String,
    access_token: String,
    base_url: String,
    storage: Arc<dyn StorageBackend>,
    metadata: MetadataStore,
    conversion: ConversionRegistry,
}

impl AttachmentOrchestrator {
    pub fn new(
        user_email: impl Into<String>,
        access_token: impl Into<String>,
        storage: Arc<dyn StorageBackend>,
        metadata: MetadataStore,
    ) -> Self {
        Self {
            user_email: user_email.into(),
            access_token: access_token.into(),
            base_url: outlook_graph::BASE_URL.to_string(),
            storage,
            metadata,
            conversion: ConversionRegistry::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the conversion pipeline's token budget (§2.1
    /// `OUTLOOK_MCP_TOKEN_BUDGET`), default set by [`ConversionRegistry::new`].
    pub fn with_token_budget(mut self, limit: usize) -> Self {
        self.conversion = ConversionRegistry::new().with_token_limit(limit);
        self
    }

    fn client(&self) -> GraphClient {
        GraphClient::new(self.access_token.clone()).with_base_url(self.base_url.clone())
    }

    fn build_expand_batch(&self, ids: &[String]) -> Value {
        let requests: Vec<Value> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let relative = format!(
                    "/users/{}/messages/{}?$select={}&$expand=attachments",
                    urlencoding::encode(&self.user_email),
                    urlencoding::encode(id),
                    DEFAULT_SELECT,
                );
                serde_json::json!({ "id": (i + 1).to_string(), "method": "GET", "url": relative })
            })
            .collect();
        serde_json::json!({ "requests": requests })
    }

    async fn fetch_with_attachments(&self, ids: &[String]) -> Result<Vec<Value>, CoreError> {
        let client = self.client();
        let batch_url = format!("{}/$batch", self.base_url);
        let mut messages = Vec::new();

        for chunk in ids.chunks(BATCH_CHUNK_SIZE) {
            let body = self.build_expand_batch(chunk);
            let response = client.post_json(&batch_url, body).await.map_err(CoreError::from)?;
            let responses = response
                .get("responses")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            for entry in responses {
                let status = entry.get("status").and_then(Value::as_u64).unwrap_or(0);
                if (200..300).contains(&status) {
                    if let Some(body) = entry.get("body") {
                        messages.push(body.clone());
                    }
                } else {
                    warn!(?entry, "message fetch with attachments failed");
                }
            }
        }

        Ok(messages)
    }

    /// Runs the full pipeline over `message_ids`: duplicate-skip, folder
    /// creation, body stripping, per-attachment conversion/save, and
    /// metadata bookkeeping, per §4.5.2's five-step flow.
    pub async fn process_messages(
        &self,
        message_ids: &[String],
        options: &ProcessOptions,
    ) -> Result<Vec<ProcessedMessageResult>, CoreError> {
        let ids_to_fetch: Vec<String> = if options.skip_duplicates {
            self.metadata.filter_new_messages(message_ids).await
        } else {
            message_ids.to_vec()
        };

        let mut results: Vec<ProcessedMessageResult> = message_ids
            .iter()
            .filter(|id| !ids_to_fetch.contains(id))
            .map(|id| ProcessedMessageResult {
                message_id: id.clone(),
                skipped: true,
                ..Default::default()
            })
            .collect();

        if ids_to_fetch.is_empty() {
            return Ok(results);
        }

        let messages = self.fetch_with_attachments(&ids_to_fetch).await?;
        for message in &messages {
            results.push(self.process_one(message, options).await);
        }
        Ok(results)
    }

    async fn process_one(&self, message: &Value, options: &ProcessOptions) -> ProcessedMessageResult {
        let message_id = message.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        let subject = message.get("subject").and_then(Value::as_str).unwrap_or_default();
        let sender = message
            .pointer("/from/emailAddress/name")
            .and_then(Value::as_str)
            .or_else(|| message.pointer("/from/emailAddress/address").and_then(Value::as_str))
            .unwrap_or("unknown");
        let received_at: DateTime<Utc> = message
            .get("receivedDateTime")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let folder = MailFolder::derive(received_at, sender, subject);
        let mut saved_file_paths = Vec::new();
        let mut attachment_errors = Vec::new();
        let mut folder_path = None;

        if options.save_file {
            match self.storage.ensure_folder(&folder).await {
                Ok(path) => folder_path = Some(path),
                Err(err) => {
                    return ProcessedMessageResult {
                        message_id,
                        skipped: false,
                        folder_path: None,
                        saved_file_paths,
                        attachment_errors: vec![err.to_string()],
                    };
                }
            }
        }

        if options.include_body {
            if let Some(html) = message.pointer("/body/content").and_then(Value::as_str) {
                let text = html_to_text(html);
                if options.save_file {
                    let file = MailFile::sanitize("body.txt");
                    match self.storage.save_file(&folder, &file, text.into_bytes(), None).await {
                        Ok(path) => saved_file_paths.push(path),
                        Err(err) => attachment_errors.push(err.to_string()),
                    }
                }
            }
        }

        if let Some(attachments) = message.get("attachments").and_then(Value::as_array) {
            for attachment in attachments {
                match self.process_attachment(&folder, attachment, options).await {
                    Ok(Some(path)) => saved_file_paths.push(path),
                    Ok(None) => {}
                    Err(err) => attachment_errors.push(err.to_string()),
                }
            }
        }

        if options.save_file {
            let record = ProcessedMessageRecord {
                message_id: message_id.clone(),
                subject: subject.to_string(),
                sender: sender.to_string(),
                received_date_time: received_at,
                folder_path: folder_path.clone().unwrap_or_else(|| folder.name.clone()),
                saved_file_paths: saved_file_paths.clone(),
                processed_at: Utc::now(),
                attachment_count: saved_file_paths.len() as u32,
            };
            if let Err(err) = self.metadata.add_processed_mail(record).await {
                attachment_errors.push(err.to_string());
            }
        }

        ProcessedMessageResult {
            message_id,
            skipped: false,
            folder_path,
            saved_file_paths,
            attachment_errors,
        }
    }

    /// Base64-decodes one attachment and converts it if a converter is
    /// registered for its extension, falling through to the original bytes
    /// on conversion failure, per §4.5.2 step 4.
    async fn process_attachment(
        &self,
        folder: &MailFolder,
        attachment: &Value,
        options: &ProcessOptions,
    ) -> Result<Option<String>, CoreError> {
        let name = attachment.get("name").and_then(Value::as_str).unwrap_or("attachment");
        let content_bytes = match attachment.get("contentBytes").and_then(Value::as_str) {
            Some(s) => s,
            None => return Ok(None),
        };
        let bytes = BASE64
            .decode(content_bytes)
            .map_err(|e| AttachmentError::Io(format!("failed to decode attachment {name}: {e}")))?;

        let (final_name, final_bytes) = if self.conversion.can_convert(name) {
            match self.conversion.convert(&bytes, name) {
                Ok(text) => {
                    let base = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
                    (format!("{base}.txt"), text.into_bytes())
                }
                Err(_) => (name.to_string(), bytes),
            }
        } else {
            (name.to_string(), bytes)
        };

        if !options.save_file {
            return Ok(None);
        }

        let file = MailFile::sanitize(&final_name);
        let path = self.storage.save_file(folder, &file, final_bytes, None).await?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_storage::LocalStorageBackend;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn orchestrator(server: &MockServer, root: &std::path::Path) -> AttachmentOrchestrator {
        let storage = Arc::new(LocalStorageBackend::new(root));
        let metadata = MetadataStore::new(root.join("processed.json"));
        AttachmentOrchestrator::new("user@example.com", "test-token", storage, metadata)
            .with_base_url(server.uri())
    }

    fn sample_response() -> Value {
        json!({
            "responses": [{
                "id": "1",
                "status": 200,
                "body": {
                    "id": "msg-1",
                    "subject": "Hello",
                    "from": { "emailAddress": { "name": "Ada Lovelace", "address": "ada@example.com" } },
                    "receivedDateTime": "2026-03-05T12:00:00Z",
                    "body": { "content": "<p>Hi there</p>" },
                    "hasAttachments": true,
                    "attachments": [{
                        "name": "notes.txt",
                        "contentType": "text/plain",
                        "size": 5,
                        "isInline": false,
                        "contentBytes": base64::engine::general_purpose::STANDARD.encode(b"hello"),
                    }],
                },
            }],
        })
    }

    #[tokio::test]
    async fn processes_message_saves_body_and_attachment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/$batch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(&server, tmp.path());
        let results = orch
            .process_messages(&["msg-1".to_string()], &ProcessOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(!result.skipped);
        assert!(result.attachment_errors.is_empty());
        assert_eq!(result.saved_file_paths.len(), 2);
    }

    #[tokio::test]
    async fn skips_already_processed_messages() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(&server, tmp.path());
        orch.metadata
            .add_processed_mail(ProcessedMessageRecord {
                message_id: "msg-1".to_string(),
                subject: "Hello".to_string(),
                sender: "ada@example.com".to_string(),
                received_date_time: Utc::now(),
                folder_path: "f".to_string(),
                saved_file_paths: vec![],
                processed_at: Utc::now(),
                attachment_count: 0,
            })
            .await
            .unwrap();

        let results = orch
            .process_messages(&["msg-1".to_string()], &ProcessOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].skipped);
    }
}
