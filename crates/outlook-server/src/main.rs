//! `outlook-mcp-server` — wires the token store, auth service, session
//! manager, and tool dispatcher together and runs the MCP stdio/JSON-RPC
//! loop (§2, §4.6).
//!
//! Grounded on `lnxdrive-daemon`'s `main.rs` wiring shape (load config,
//! install tracing, construct the adapter stack, run until a shutdown
//! signal) and `other_examples/.../nu_plugin_topology__src-mcp.rs`'s
//! `serve_stdio` entry point (`rmcp::transport::io::stdio()` +
//! `ServerHandler::serve` + `.waiting()`).

mod config;
mod invoker;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use outlook_auth::AzureAuthProvider;
use outlook_core::domain::config::AppConfig;
use outlook_dispatcher::{load_tool_definitions, OutlookMcpServer, ToolDispatcher};
use outlook_store::{DatabasePool, SqliteTokenStore};
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::config::AppRuntimeConfig;
use crate::invoker::ServiceInvoker;

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let runtime_config = AppRuntimeConfig::from_env().context("invalid runtime configuration")?;
    init_tracing(runtime_config.log_format_json);

    tracing::info!(
        storage_backend = ?runtime_config.storage_backend,
        tool_catalog_path = %runtime_config.tool_catalog_path,
        "starting outlook-mcp-server"
    );

    let pool = DatabasePool::new(Path::new(&runtime_config.db_path))
        .await
        .context("failed to open token store database")?;
    let token_store = Arc::new(SqliteTokenStore::new(pool.pool().clone()));

    let app_config = AppConfig::new(
        runtime_config.azure_client_id.clone(),
        runtime_config.azure_client_secret.clone(),
        runtime_config.azure_redirect_uri.clone(),
        "outlook-mcp",
    )
    .with_tenant_id(runtime_config.azure_tenant_id.clone());
    let auth_provider: Arc<dyn outlook_core::ports::auth::AuthProvider> =
        Arc::new(AzureAuthProvider::new(app_config, token_store.clone()));

    let session_manager = outlook_session::SessionManager::with_config(
        auth_provider,
        token_store.clone(),
        runtime_config.graph_base_url.clone(),
        runtime_config.session_ttl_secs,
        runtime_config.session_cleanup_interval_secs,
    );
    session_manager.spawn_cleanup_task();

    let catalog = load_tool_definitions(&runtime_config.tool_catalog_path)
        .with_context(|| format!("failed to load tool catalog at {}", runtime_config.tool_catalog_path))?;
    tracing::info!(tool_count = catalog.len(), "loaded tool catalog");

    let invoker = Arc::new(ServiceInvoker::new(session_manager.clone(), &runtime_config));
    let dispatcher = Arc::new(ToolDispatcher::new(catalog, session_manager.clone(), invoker));
    let server = OutlookMcpServer::new(dispatcher);

    let transport = rmcp::transport::io::stdio();
    let service = server
        .serve(transport)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to start MCP service"))?;

    service.waiting().await.context("MCP service loop exited with an error")?;

    session_manager.shutdown().await;
    Ok(())
}
