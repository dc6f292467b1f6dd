//! `AppConfig` — one record per registered OAuth application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered OAuth application configuration.
///
/// Keyed by `client_id`. Created by configuration import or CLI; mutated
/// only through admin operations (never by the runtime token/auth flow).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    client_id: String,
    client_secret: String,
    tenant_id: String,
    redirect_uri: String,
    display_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppConfig {
    /// The Azure default tenant alias accepting any work/school/personal account.
    pub const DEFAULT_TENANT: &'static str = "common";

    /// Creates a new `AppConfig` with `tenant_id` defaulted to `"common"`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: Self::DEFAULT_TENANT.to_string(),
            redirect_uri: redirect_uri.into(),
            display_name: display_name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overrides the tenant identifier (builder style).
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_tenant_to_common() {
        let cfg = AppConfig::new("client", "secret", "https://localhost/callback", "Test App");
        assert_eq!(cfg.tenant_id(), "common");
    }

    #[test]
    fn with_tenant_id_overrides_default() {
        let cfg = AppConfig::new("client", "secret", "https://localhost/callback", "Test App")
            .with_tenant_id("contoso.onmicrosoft.com");
        assert_eq!(cfg.tenant_id(), "contoso.onmicrosoft.com");
    }
}
