//! Auth commands, grounded on `lnxdrive-cli`'s `commands/auth.rs` `login`/
//! `logout`/`status` triad, adapted from native PKCE to the confidential-
//! client authorization-code flow `outlook_core::ports::AuthProvider`
//! exposes (§4.2). The CLI only drives the port; it does not run a
//! callback server (out of scope per spec.md §1 — "the browser OAuth
//! callback capture ... remain[s] external collaborator[s] whose
//! interface[] only [is] specified").

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use outlook_auth::AzureAuthProvider;
use outlook_core::domain::config::AppConfig;
use outlook_core::domain::Email;
use outlook_core::ports::auth::AuthProvider;
use outlook_core::ports::token_store::TokenStore;
use outlook_store::{DatabasePool, SqliteTokenStore};

use crate::env_config::CliConfig;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Print the Azure AD authorize URL to start the OAuth2 flow
    Login,
    /// Exchange an authorization code for tokens, completing login
    Complete {
        /// The `code` query parameter from the redirect
        #[arg(long)]
        code: String,
        /// The `state` query parameter from the redirect
        #[arg(long)]
        state: String,
    },
    /// Remove stored credentials for a user
    Logout {
        #[arg(long)]
        email: String,
    },
    /// Check token status for a user
    Status {
        #[arg(long)]
        email: String,
    },
}

async fn open_store(db_path: &str) -> Result<Arc<SqliteTokenStore>> {
    let pool = DatabasePool::new(Path::new(db_path))
        .await
        .context("failed to open token store database")?;
    Ok(Arc::new(SqliteTokenStore::new(pool.pool().clone())))
}

fn build_auth_provider(cfg: &CliConfig, store: Arc<SqliteTokenStore>) -> AzureAuthProvider {
    let app_config = AppConfig::new(
        cfg.azure_client_id.clone(),
        cfg.azure_client_secret.clone(),
        cfg.azure_redirect_uri.clone(),
        "outlook-mcp",
    )
    .with_tenant_id(cfg.azure_tenant_id.clone());
    AzureAuthProvider::new(app_config, store)
}

impl AuthCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let fmt = get_formatter(format == OutputFormat::Json);
        let cli_config = CliConfig::from_env()?;
        let store = open_store(&cli_config.db_path).await?;
        let auth = build_auth_provider(&cli_config, store.clone());

        match self {
            AuthCommand::Login => self.execute_login(&auth, &*fmt, format),
            AuthCommand::Complete { code, state } => {
                self.execute_complete(&auth, code, state, &*fmt, format).await
            }
            AuthCommand::Logout { email } => self.execute_logout(&*store, email, &*fmt).await,
            AuthCommand::Status { email } => self.execute_status(&*store, email, &*fmt, format).await,
        }
    }

    fn execute_login(&self, auth: &AzureAuthProvider, fmt: &dyn crate::output::OutputFormatter, format: OutputFormat) -> Result<()> {
        let (url, state) = auth.start_auth_flow()?;
        if matches!(format, OutputFormat::Json) {
            fmt.print_json(&serde_json::json!({ "authorize_url": url, "state": state }));
        } else {
            fmt.success("Open this URL to sign in:");
            fmt.info(&url);
            fmt.info(&format!("state: {}", state));
            fmt.info("After sign-in, run `auth complete --code <code> --state <state>`.");
        }
        Ok(())
    }

    async fn execute_complete(
        &self,
        auth: &AzureAuthProvider,
        code: &str,
        state: &str,
        fmt: &dyn crate::output::OutputFormatter,
        format: OutputFormat,
    ) -> Result<()> {
        let (email, token) = auth.complete_auth_flow(code, state).await?;
        if matches!(format, OutputFormat::Json) {
            fmt.print_json(&serde_json::json!({
                "email": email.as_str(),
                "access_token_expires_at": token.access_token_expires_at.to_rfc3339(),
            }));
        } else {
            fmt.success(&format!("Authenticated as {}", email.as_str()));
        }
        Ok(())
    }

    async fn execute_logout(
        &self,
        store: &dyn TokenStore,
        email: &str,
        fmt: &dyn crate::output::OutputFormatter,
    ) -> Result<()> {
        let email = Email::new(email).context("invalid email")?;
        store.delete_token(&email).await?;
        fmt.success(&format!("Removed stored credentials for {}", email.as_str()));
        Ok(())
    }

    async fn execute_status(
        &self,
        store: &dyn TokenStore,
        email: &str,
        fmt: &dyn crate::output::OutputFormatter,
        format: OutputFormat,
    ) -> Result<()> {
        let email = Email::new(email).context("invalid email")?;
        let token = store.get_token(&email).await?;

        let token = match token {
            Some(t) => t,
            None => {
                if matches!(format, OutputFormat::Json) {
                    fmt.print_json(&serde_json::json!({ "authenticated": false, "email": email.as_str() }));
                } else {
                    fmt.info(&format!("No stored token for {}", email.as_str()));
                }
                return Ok(());
            }
        };

        let status = if token.is_access_token_expired(chrono::Duration::zero()) {
            "expired"
        } else {
            "valid"
        };

        if matches!(format, OutputFormat::Json) {
            fmt.print_json(&serde_json::json!({
                "authenticated": true,
                "email": email.as_str(),
                "access_token_status": status,
                "access_token_expires_at": token.access_token_expires_at().to_rfc3339(),
                "refresh_token_expires_at": token.refresh_token_expires_at().map(|t| t.to_rfc3339()),
            }));
        } else {
            fmt.success(&format!("{}: access token {}", email.as_str(), status));
            fmt.info(&format!("access token expires: {}", token.access_token_expires_at()));
            if let Some(rt) = token.refresh_token_expires_at() {
                fmt.info(&format!("refresh token expires: {}", rt));
            }
        }
        Ok(())
    }
}
