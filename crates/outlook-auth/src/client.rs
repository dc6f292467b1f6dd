//! `AzureAuthProvider` — confidential-client authorization-code and
//! refresh-token grants against Azure AD, grounded on
//! `lnxdrive-graph/src/auth.rs`'s `oauth2`-crate usage (`BasicClient`,
//! `exchange_code`/`exchange_refresh_token`, `TokenResponse`), adapted from
//! a native-app PKCE flow to a confidential client (client_id +
//! client_secret, no PKCE challenge) since this service runs server-side
//! and holds its own client secret (§4.2).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use outlook_core::domain::{AppConfig, Email, RefreshErrorKind, RefreshOutcome, TokenInfo};
use outlook_core::error::CoreError;
use outlook_core::ports::{AuthProvider, TokenStore};
use outlook_store::locks::EmailLockTable;

use crate::error::AuthError;

const DEFAULT_SCOPES: &[&str] = &["Mail.Read", "Mail.ReadWrite", "User.Read", "offline_access"];

/// Default buffer before expiry at which an access token is considered
/// due for refresh.
const EXPIRY_BUFFER_SECONDS: i64 = 120;

fn authorize_url(azure_base_url: &str, tenant_id: &str) -> String {
    format!("{azure_base_url}/{tenant_id}/oauth2/v2.0/authorize")
}

fn token_url(azure_base_url: &str, tenant_id: &str) -> String {
    format!("{azure_base_url}/{tenant_id}/oauth2/v2.0/token")
}

/// Matches the type-state the teacher's `PKCEFlow` client settles into after
/// `set_auth_uri`/`set_token_uri`/`set_redirect_uri`.
type ConfiguredClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Deserialize)]
struct GraphProfile {
    mail: Option<String>,
    #[serde(rename = "userPrincipalName")]
    user_principal_name: Option<String>,
}

/// Azure AD OAuth2 confidential-client provider.
pub struct AzureAuthProvider {
    config: AppConfig,
    http_client: reqwest::Client,
    token_store: Arc<dyn TokenStore>,
    refresh_locks: EmailLockTable,
    /// Overridable for tests; defaults to Graph's production host.
    graph_base_url: String,
    /// Overridable for tests; defaults to `login.microsoftonline.com`.
    azure_base_url: String,
}

impl AzureAuthProvider {
    pub fn new(config: AppConfig, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            token_store,
            refresh_locks: EmailLockTable::new(),
            graph_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            azure_base_url: "https://login.microsoftonline.com".to_string(),
        }
    }

    /// Overrides the Graph base URL, used by tests to point at a wiremock
    /// server instead of the production endpoint.
    pub fn with_graph_base_url(mut self, url: impl Into<String>) -> Self {
        self.graph_base_url = url.into();
        self
    }

    /// Overrides the Azure AD base URL, used by tests to point at a
    /// wiremock server instead of the production endpoint.
    pub fn with_azure_base_url(mut self, url: impl Into<String>) -> Self {
        self.azure_base_url = url.into();
        self
    }

    fn basic_client(&self) -> Result<ConfiguredClient, AuthError> {
        let auth_url = AuthUrl::new(authorize_url(&self.azure_base_url, self.config.tenant_id()))
            .map_err(|e| AuthError::InvalidEndpoint(e.to_string()))?;
        let token_url = TokenUrl::new(token_url(&self.azure_base_url, self.config.tenant_id()))
            .map_err(|e| AuthError::InvalidEndpoint(e.to_string()))?;
        let redirect_url = RedirectUrl::new(self.config.redirect_uri().to_string())
            .map_err(|e| AuthError::InvalidEndpoint(e.to_string()))?;

        Ok(BasicClient::new(ClientId::new(self.config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(self.config.client_secret().to_string()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url))
    }

    /// Fetches `mail`, falling back to `userPrincipalName`, per §4.2's
    /// `UserIdentificationError` handling — a work/school tenant account
    /// often has no `mail` claim populated.
    async fn resolve_user_email(&self, access_token: &str) -> Result<Email, AuthError> {
        let response = self
            .http_client
            .get(format!("{}/me", self.graph_base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::UserIdentificationFailed);
        }

        let profile: GraphProfile = response
            .json()
            .await
            .map_err(|e| AuthError::RequestFailed(e.to_string()))?;

        let raw = profile
            .mail
            .or(profile.user_principal_name)
            .ok_or(AuthError::UserIdentificationFailed)?;

        Email::new(raw).map_err(|_| AuthError::UserIdentificationFailed)
    }

    fn token_info_from_response(
        response: &oauth2::basic::BasicTokenResponse,
    ) -> TokenInfo {
        let expires_in = response
            .expires_in()
            .map(|d| Duration::seconds(d.as_secs() as i64))
            .unwrap_or_else(|| Duration::hours(1));

        TokenInfo {
            access_token: response.access_token().secret().to_string(),
            refresh_token: response.refresh_token().map(|t| t.secret().to_string()),
            scope: response
                .scopes()
                .map(|scopes| scopes.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" ")),
            access_token_expires_at: Utc::now() + expires_in,
            id_token: None,
        }
    }
}

#[async_trait]
impl AuthProvider for AzureAuthProvider {
    fn start_auth_flow(&self) -> Result<(String, String), CoreError> {
        let client = self.basic_client().map_err(CoreError::from)?;
        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in DEFAULT_SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (url, csrf) = request.url();
        debug!("generated authorization URL");
        Ok((url.to_string(), csrf.secret().to_string()))
    }

    async fn complete_auth_flow(
        &self,
        code: &str,
        _state: &str,
    ) -> Result<(Email, TokenInfo), CoreError> {
        let client = self.basic_client().map_err(CoreError::from)?;

        let response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthError::RequestFailed(e.to_string()))
            .map_err(CoreError::from)?;

        let token_info = Self::token_info_from_response(&response);
        let email = self
            .resolve_user_email(&token_info.access_token)
            .await
            .map_err(CoreError::from)?;

        info!(email = %email, "completed authorization-code exchange");
        Ok((email, token_info))
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenInfo, CoreError> {
        let client = self.basic_client().map_err(CoreError::from)?;

        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.contains("invalid_grant") {
                    AuthError::InvalidGrant
                } else {
                    AuthError::RequestFailed(message)
                }
            })
            .map_err(CoreError::from)?;

        Ok(Self::token_info_from_response(&response))
    }

    async fn check_and_refresh_if_needed(&self, email: &Email) -> Result<RefreshOutcome, CoreError> {
        // Serializes concurrent refresh attempts for the same user (Open
        // Question decision 5): two tool calls racing on an expired access
        // token should produce one refresh, not two.
        let lock = self.refresh_locks.lock_for(email);
        let _guard = lock.lock().await;

        let Some(record) = self.token_store.get_token(email).await? else {
            return Ok(RefreshOutcome::Error {
                kind: RefreshErrorKind::NoToken,
            });
        };

        if !record.is_access_token_expired(chrono::Duration::seconds(EXPIRY_BUFFER_SECONDS)) {
            return Ok(RefreshOutcome::Valid);
        }

        let Some(refresh_token) = record.refresh_token() else {
            return Ok(RefreshOutcome::Error {
                kind: RefreshErrorKind::NoRefreshToken,
            });
        };

        if record.is_refresh_token_expired() {
            return Ok(RefreshOutcome::Error {
                kind: RefreshErrorKind::RefreshExpired,
            });
        }

        let refresh_token = refresh_token.to_string();
        match self.refresh_tokens(&refresh_token).await {
            Ok(info) => {
                let mut updated = record;
                updated.apply_refresh(info);
                self.token_store.update_token(&updated).await?;
                Ok(RefreshOutcome::Refreshed)
            }
            Err(CoreError::TokenRefreshFailed { .. }) => {
                warn!(email = %email, "refresh token rejected by Azure AD");
                Ok(RefreshOutcome::Error {
                    kind: RefreshErrorKind::RefreshExpired,
                })
            }
            Err(_) => Ok(RefreshOutcome::Error {
                kind: RefreshErrorKind::RefreshFailed,
            }),
        }
    }
}
