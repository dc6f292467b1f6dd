//! Minimal env-var configuration the CLI needs to stand up the same
//! `TokenStore`/`AuthProvider` pair `outlook-server` wires at startup
//! (§6's `AZURE_*` keys plus `OUTLOOK_MCP_DB_PATH`).

use std::env;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub struct CliConfig {
    pub azure_client_id: String,
    pub azure_client_secret: String,
    pub azure_tenant_id: String,
    pub azure_redirect_uri: String,
    pub db_path: String,
}

impl CliConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let azure_client_id = env::var("AZURE_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("AZURE_CLIENT_ID is required"))?;
        let azure_client_secret = env::var("AZURE_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("AZURE_CLIENT_SECRET is required"))?;

        Ok(Self {
            azure_client_id,
            azure_client_secret,
            azure_tenant_id: env_or("AZURE_TENANT_ID", "common"),
            azure_redirect_uri: env_or("AZURE_REDIRECT_URI", "http://localhost:5000/callback"),
            db_path: env_or("OUTLOOK_MCP_DB_PATH", "database/auth.db"),
        })
    }
}
