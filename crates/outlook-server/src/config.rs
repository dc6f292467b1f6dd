//! `AppRuntimeConfig` — environment-driven startup configuration (§2.1,
//! §6), grounded on `lnxdrive-core/src/config.rs`'s env-var-with-documented-
//! default pattern.

use std::env;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Local,
    OneDrive,
}

#[derive(Debug, Clone)]
pub struct AppRuntimeConfig {
    pub azure_client_id: String,
    pub azure_client_secret: String,
    pub azure_tenant_id: String,
    pub azure_redirect_uri: String,
    pub azure_scopes: Vec<String>,
    pub db_path: String,
    pub storage_root: String,
    pub storage_backend: StorageBackendKind,
    pub session_ttl_secs: i64,
    pub session_cleanup_interval_secs: u64,
    pub pagination_concurrency: usize,
    pub tool_catalog_path: String,
    pub token_budget: usize,
    pub boolean_schema_compat: bool,
    pub graph_base_url: String,
    pub log_format_json: bool,
}

impl AppRuntimeConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let azure_client_id =
            env::var("AZURE_CLIENT_ID").map_err(|_| anyhow::anyhow!("AZURE_CLIENT_ID is required"))?;
        let azure_client_secret =
            env::var("AZURE_CLIENT_SECRET").map_err(|_| anyhow::anyhow!("AZURE_CLIENT_SECRET is required"))?;

        let storage_backend = match env_or("OUTLOOK_MCP_STORAGE_BACKEND", "local").as_str() {
            "onedrive" => StorageBackendKind::OneDrive,
            _ => StorageBackendKind::Local,
        };

        let scopes = env_or("AZURE_SCOPES", "User.Read Mail.Read Mail.Send offline_access")
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Ok(Self {
            azure_client_id,
            azure_client_secret,
            azure_tenant_id: env_or("AZURE_TENANT_ID", "common"),
            azure_redirect_uri: env_or("AZURE_REDIRECT_URI", "http://localhost:5000/callback"),
            azure_scopes: scopes,
            db_path: env_or("OUTLOOK_MCP_DB_PATH", "database/auth.db"),
            storage_root: env_or("OUTLOOK_MCP_STORAGE_ROOT", "./storage"),
            storage_backend,
            session_ttl_secs: env_parse_or("OUTLOOK_MCP_SESSION_TTL_SECS", 1800),
            session_cleanup_interval_secs: env_parse_or("OUTLOOK_MCP_SESSION_CLEANUP_INTERVAL_SECS", 300),
            pagination_concurrency: env_parse_or("OUTLOOK_MCP_PAGINATION_CONCURRENCY", 3),
            tool_catalog_path: env_or(
                "OUTLOOK_MCP_TOOL_CATALOG_PATH",
                "config/tool_definition_templates.yaml",
            ),
            token_budget: env_parse_or("OUTLOOK_MCP_TOKEN_BUDGET", 50_000),
            boolean_schema_compat: env_parse_or("OUTLOOK_MCP_BOOLEAN_SCHEMA_COMPAT", false),
            graph_base_url: env_or("OUTLOOK_MCP_GRAPH_BASE_URL", outlook_graph::BASE_URL),
            log_format_json: env_or("OUTLOOK_MCP_LOG_FORMAT", "text") == "json",
        })
    }
}
