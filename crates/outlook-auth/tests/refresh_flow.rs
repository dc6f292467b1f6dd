//! Integration tests for `AzureAuthProvider::check_and_refresh_if_needed`,
//! grounded on `lnxdrive-graph/tests/integration`'s wiremock-based mock
//! server pattern.

use std::sync::Arc;

use chrono::{Duration, Utc};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use outlook_auth::AzureAuthProvider;
use outlook_core::domain::{AppConfig, Email, RefreshErrorKind, RefreshOutcome, TokenInfo, TokenRecord};
use outlook_core::ports::{AuthProvider, TokenStore};
use outlook_store::{DatabasePool, SqliteTokenStore};

fn email() -> Email {
    Email::new("user@example.com").unwrap()
}

fn config(redirect: &str) -> AppConfig {
    AppConfig::new("client-id", "client-secret", redirect, "Outlook MCP Test")
        .with_tenant_id("common")
}

async fn provider_with_store(server: &MockServer) -> (AzureAuthProvider, Arc<dyn TokenStore>) {
    let db = DatabasePool::in_memory().await.unwrap();
    let store: Arc<dyn TokenStore> = Arc::new(SqliteTokenStore::new(db.pool().clone()));
    let provider = AzureAuthProvider::new(config("https://localhost/callback"), store.clone())
        .with_azure_base_url(server.uri());
    (provider, store)
}

#[tokio::test]
async fn check_and_refresh_reports_valid_for_unexpired_token() {
    let server = MockServer::start().await;
    let (provider, store) = provider_with_store(&server).await;

    let info = TokenInfo {
        access_token: "still-good".into(),
        refresh_token: Some("r1".into()),
        scope: None,
        access_token_expires_at: Utc::now() + Duration::hours(1),
        id_token: None,
    };
    store
        .save_token(&TokenRecord::from_token_info(email(), info))
        .await
        .unwrap();

    let outcome = provider.check_and_refresh_if_needed(&email()).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Valid);
}

#[tokio::test]
async fn check_and_refresh_exchanges_expired_token_and_persists_new_one() {
    let server = MockServer::start().await;
    let (provider, store) = provider_with_store(&server).await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "new-access-token",
            "refresh_token": "new-refresh-token",
            "expires_in": 3600,
            "scope": "Mail.Read"
        })))
        .mount(&server)
        .await;

    let info = TokenInfo {
        access_token: "expired".into(),
        refresh_token: Some("old-refresh".into()),
        scope: None,
        access_token_expires_at: Utc::now() - Duration::minutes(5),
        id_token: None,
    };
    store
        .save_token(&TokenRecord::from_token_info(email(), info))
        .await
        .unwrap();

    let outcome = provider.check_and_refresh_if_needed(&email()).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Refreshed);

    let updated = store.get_token(&email()).await.unwrap().unwrap();
    assert_eq!(updated.access_token(), "new-access-token");
    assert_eq!(updated.refresh_token(), Some("new-refresh-token"));
}

#[tokio::test]
async fn check_and_refresh_surfaces_invalid_grant_as_refresh_expired() {
    let server = MockServer::start().await;
    let (provider, store) = provider_with_store(&server).await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "AADSTS70008: refresh token has expired"
        })))
        .mount(&server)
        .await;

    let info = TokenInfo {
        access_token: "expired".into(),
        refresh_token: Some("dead-refresh".into()),
        scope: None,
        access_token_expires_at: Utc::now() - Duration::minutes(5),
        id_token: None,
    };
    store
        .save_token(&TokenRecord::from_token_info(email(), info))
        .await
        .unwrap();

    let outcome = provider.check_and_refresh_if_needed(&email()).await.unwrap();
    assert_eq!(
        outcome,
        RefreshOutcome::Error {
            kind: RefreshErrorKind::RefreshExpired
        }
    );
}

#[tokio::test]
async fn check_and_refresh_reports_no_token_for_unknown_user() {
    let server = MockServer::start().await;
    let (provider, _store) = provider_with_store(&server).await;

    let outcome = provider.check_and_refresh_if_needed(&email()).await.unwrap();
    assert_eq!(
        outcome,
        RefreshOutcome::Error {
            kind: RefreshErrorKind::NoToken
        }
    );
}
