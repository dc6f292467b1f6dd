//! Concrete [`ToolInvoker`]: routes `mcp_service.name` to the caller's
//! `Session`'s Graph query engine or to a freshly built
//! [`AttachmentOrchestrator`] (§4.6's dispatch-to-service step).
//!
//! `outlook-dispatcher` deliberately leaves this port unimplemented so its
//! catalog/factor-merge/validation logic can be tested without a live
//! Graph/storage stack; this is the adapter that closes the loop, grounded
//! on the teacher's `ICloudProvider`-behind-a-usecase wiring in
//! `lnxdrive-core/src/usecases/`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use outlook_attachments::{AttachmentOrchestrator, LocalStorageBackend, MetadataStore, OneDriveStorageBackend, ProcessOptions};
use outlook_core::domain::tool::Tool;
use outlook_core::domain::{Email, ExcludeParams, FilterParams, SelectParams};
use outlook_core::error::CoreError;
use outlook_core::ports::storage::StorageBackend;
use outlook_dispatcher::ToolInvoker;
use outlook_session::SessionManager;
use serde_json::Value;

use crate::config::{AppRuntimeConfig, StorageBackendKind};

/// Known `mcp_service.name` values a tool's catalog entry may bind to,
/// matching the method names on `outlook_core::ports::graph::GraphQueryEngine`
/// plus the one attachment-pipeline entry point.
const SERVICE_QUERY_FILTER: &str = "query_filter";
const SERVICE_QUERY_SEARCH: &str = "query_search";
const SERVICE_QUERY_URL: &str = "query_url";
const SERVICE_BATCH_FETCH: &str = "batch_fetch_by_ids";
const SERVICE_PROCESS_MESSAGES: &str = "process_messages";

pub struct ServiceInvoker {
    session_manager: Arc<SessionManager>,
    storage_root: PathBuf,
    storage_backend: StorageBackendKind,
    graph_base_url: String,
    token_budget: usize,
}

impl ServiceInvoker {
    pub fn new(session_manager: Arc<SessionManager>, config: &AppRuntimeConfig) -> Self {
        Self {
            session_manager,
            storage_root: PathBuf::from(&config.storage_root),
            storage_backend: config.storage_backend,
            graph_base_url: config.graph_base_url.clone(),
            token_budget: config.token_budget,
        }
    }

    fn user_dir(&self, email: &str) -> PathBuf {
        self.storage_root.join(email.replace(['@', '.'], "_"))
    }

    fn build_storage(&self, email: &str, access_token: &str) -> Arc<dyn StorageBackend> {
        match self.storage_backend {
            StorageBackendKind::Local => Arc::new(LocalStorageBackend::new(self.user_dir(email))),
            StorageBackendKind::OneDrive => Arc::new(OneDriveStorageBackend::new(email, access_token)),
        }
    }

    fn field<T: serde::de::DeserializeOwned + Default>(args: &Value, name: &str) -> Result<T, CoreError> {
        match args.get(name) {
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| CoreError::ValidationError {
                reason: format!("invalid `{name}` argument: {e}"),
            }),
            None => Ok(T::default()),
        }
    }

    fn required_string(args: &Value, name: &str) -> Result<String, CoreError> {
        args.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CoreError::ValidationError {
                reason: format!("missing required `{name}` argument"),
            })
    }
}

#[async_trait]
impl ToolInvoker for ServiceInvoker {
    async fn invoke(&self, tool: &Tool, user_email: &str, service_args: Value) -> Result<Value, CoreError> {
        let email = Email::new(user_email).map_err(CoreError::from)?;
        let session = self.session_manager.ensure_fresh(&email).await?;

        match tool.mcp_service.name.as_str() {
            SERVICE_QUERY_FILTER => {
                let filter: FilterParams = Self::field(&service_args, "filter")?;
                let select: SelectParams = Self::field(&service_args, "select")?;
                let exclude: Option<ExcludeParams> = service_args.get("exclude").cloned().and_then(|v| serde_json::from_value(v).ok());
                let max_results = service_args.get("max_results").and_then(Value::as_u64).map(|v| v as usize);

                let session = session.lock().await;
                let result = session
                    .graph_engine()
                    .query_filter(session.access_token(), &filter, &select, exclude.as_ref(), max_results)
                    .await?;
                Ok(serde_json::json!({ "messages": result.messages, "errors": result.errors }))
            }
            SERVICE_QUERY_SEARCH => {
                let search_text = Self::required_string(&service_args, "search_text")?;
                let select: SelectParams = Self::field(&service_args, "select")?;
                let exclude: Option<ExcludeParams> = service_args.get("exclude").cloned().and_then(|v| serde_json::from_value(v).ok());
                let max_results = service_args.get("max_results").and_then(Value::as_u64).map(|v| v as usize);

                let session = session.lock().await;
                let result = session
                    .graph_engine()
                    .query_search(session.access_token(), &search_text, &select, exclude.as_ref(), max_results)
                    .await?;
                Ok(serde_json::json!({ "messages": result.messages, "errors": result.errors }))
            }
            SERVICE_QUERY_URL => {
                let url = Self::required_string(&service_args, "url")?;
                let max_results = service_args.get("max_results").and_then(Value::as_u64).map(|v| v as usize);

                let session = session.lock().await;
                let page = session.graph_engine().query_url(session.access_token(), &url, max_results).await?;
                Ok(serde_json::json!({ "messages": page.messages, "next_link": page.next_link, "errors": page.errors }))
            }
            SERVICE_BATCH_FETCH => {
                let message_ids: Vec<String> = Self::field(&service_args, "message_ids")?;
                let select: SelectParams = Self::field(&service_args, "select")?;

                let session = session.lock().await;
                let result = session
                    .graph_engine()
                    .batch_fetch_by_ids(session.access_token(), &message_ids, &select)
                    .await?;
                Ok(serde_json::json!({ "messages": result.messages, "errors": result.errors }))
            }
            SERVICE_PROCESS_MESSAGES => {
                let message_ids: Vec<String> = Self::field(&service_args, "message_ids")?;
                let options: ProcessOptions = service_args
                    .get("options")
                    .cloned()
                    .map(|v| -> Result<ProcessOptions, CoreError> {
                        Ok(ProcessOptions {
                            skip_duplicates: v.get("skip_duplicates").and_then(Value::as_bool).unwrap_or(true),
                            save_file: v.get("save_file").and_then(Value::as_bool).unwrap_or(true),
                            include_body: v.get("include_body").and_then(Value::as_bool).unwrap_or(true),
                        })
                    })
                    .transpose()?
                    .unwrap_or_default();

                let access_token = session.lock().await.access_token().to_string();
                let storage = self.build_storage(user_email, &access_token);
                let metadata = MetadataStore::new(self.user_dir(user_email).join("processed_messages.json"));
                let orchestrator = AttachmentOrchestrator::new(user_email, access_token, storage, metadata)
                    .with_base_url(self.graph_base_url.clone())
                    .with_token_budget(self.token_budget);

                let results = orchestrator.process_messages(&message_ids, &options).await?;
                serde_json::to_value(
                    results
                        .into_iter()
                        .map(|r| {
                            serde_json::json!({
                                "message_id": r.message_id,
                                "skipped": r.skipped,
                                "folder_path": r.folder_path,
                                "saved_file_paths": r.saved_file_paths,
                                "attachment_errors": r.attachment_errors,
                            })
                        })
                        .collect::<Vec<_>>(),
                )
                .map(|v| serde_json::json!({ "results": v }))
                .map_err(|e| CoreError::ValidationError { reason: e.to_string() })
            }
            other => Err(CoreError::ValidationError {
                reason: format!("unknown mcp_service `{other}`"),
            }),
        }
    }
}
