//! Token-store maintenance commands; no `lnxdrive-cli` counterpart exists
//! (the teacher stores a single account's tokens in the OS keyring), so
//! these are modeled directly on `outlook_core::ports::token_store::TokenStore`'s
//! `list_users`/`cleanup_expired_tokens` operations (§4.1).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use outlook_core::ports::token_store::TokenStore;
use outlook_store::{DatabasePool, SqliteTokenStore};

use crate::env_config::CliConfig;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum TokensCommand {
    /// List every user with a stored token record
    List,
    /// Delete token records whose refresh token has also expired
    Cleanup,
}

async fn open_store(db_path: &str) -> Result<Arc<SqliteTokenStore>> {
    let pool = DatabasePool::new(Path::new(db_path))
        .await
        .context("failed to open token store database")?;
    Ok(Arc::new(SqliteTokenStore::new(pool.pool().clone())))
}

impl TokensCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let fmt = get_formatter(format == OutputFormat::Json);
        let cli_config = CliConfig::from_env()?;
        let store = open_store(&cli_config.db_path).await?;

        match self {
            TokensCommand::List => self.execute_list(&*store, &*fmt, format).await,
            TokensCommand::Cleanup => self.execute_cleanup(&*store, &*fmt, format).await,
        }
    }

    async fn execute_list(
        &self,
        store: &dyn TokenStore,
        fmt: &dyn crate::output::OutputFormatter,
        format: OutputFormat,
    ) -> Result<()> {
        let users = store.list_users().await?;
        if matches!(format, OutputFormat::Json) {
            let json = serde_json::json!(users
                .iter()
                .map(|u| serde_json::json!({
                    "email": u.email().as_str(),
                    "display_name": u.display_name(),
                }))
                .collect::<Vec<_>>());
            fmt.print_json(&json);
        } else if users.is_empty() {
            fmt.info("No users with stored tokens.");
        } else {
            for user in &users {
                fmt.info(&format!("{} ({})", user.email().as_str(), user.display_name()));
            }
        }
        Ok(())
    }

    async fn execute_cleanup(
        &self,
        store: &dyn TokenStore,
        fmt: &dyn crate::output::OutputFormatter,
        format: OutputFormat,
    ) -> Result<()> {
        let removed = store.cleanup_expired_tokens().await?;
        if matches!(format, OutputFormat::Json) {
            fmt.print_json(&serde_json::json!({ "removed": removed }));
        } else {
            fmt.success(&format!("Removed {} expired token record(s)", removed));
        }
        Ok(())
    }
}
