//! Integration tests for `SessionManager`, using an in-process fake
//! `AuthProvider` and an in-memory `SqliteTokenStore`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use outlook_core::domain::{AppConfig, Email, RefreshOutcome, TokenInfo, TokenRecord};
use outlook_core::error::CoreError;
use outlook_core::ports::{AuthProvider, TokenStore};
use outlook_session::SessionManager;
use outlook_store::{DatabasePool, SqliteTokenStore};

struct FakeAuthProvider {
    token_store: Arc<dyn TokenStore>,
    outcome: std::sync::Mutex<RefreshOutcome>,
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    fn start_auth_flow(&self) -> Result<(String, String), CoreError> {
        unimplemented!("not exercised by these tests")
    }

    async fn complete_auth_flow(&self, _code: &str, _state: &str) -> Result<(Email, TokenInfo), CoreError> {
        unimplemented!("not exercised by these tests")
    }

    async fn refresh_tokens(&self, _refresh_token: &str) -> Result<TokenInfo, CoreError> {
        unimplemented!("not exercised by these tests")
    }

    async fn check_and_refresh_if_needed(&self, email: &Email) -> Result<RefreshOutcome, CoreError> {
        let outcome = self.outcome.lock().unwrap().clone();
        if outcome == RefreshOutcome::Refreshed {
            let mut record = self.token_store.get_token(email).await?.unwrap();
            record.apply_refresh(TokenInfo {
                access_token: "refreshed-token".into(),
                refresh_token: Some("r2".into()),
                scope: None,
                access_token_expires_at: Utc::now() + Duration::hours(1),
                id_token: None,
            });
            self.token_store.update_token(&record).await?;
        }
        Ok(outcome)
    }
}

async fn manager_with_outcome(outcome: RefreshOutcome) -> (Arc<SessionManager>, Email) {
    let db = DatabasePool::in_memory().await.unwrap();
    let store: Arc<dyn TokenStore> = Arc::new(SqliteTokenStore::new(db.pool().clone()));
    let email = Email::new("user@example.com").unwrap();

    let info = TokenInfo {
        access_token: "initial-token".into(),
        refresh_token: Some("r1".into()),
        scope: None,
        access_token_expires_at: Utc::now() + Duration::hours(1),
        id_token: None,
    };
    store.save_token(&TokenRecord::from_token_info(email.clone(), info)).await.unwrap();

    let auth: Arc<dyn AuthProvider> = Arc::new(FakeAuthProvider {
        token_store: store.clone(),
        outcome: std::sync::Mutex::new(outcome),
    });

    let _ = AppConfig::new("id", "secret", "https://localhost/cb", "Test");
    let manager = SessionManager::new(auth, store, "https://graph.microsoft.com/v1.0");
    (manager, email)
}

#[tokio::test]
async fn get_or_create_session_reuses_existing_session() {
    let (manager, email) = manager_with_outcome(RefreshOutcome::Valid).await;

    let first = manager.get_or_create_session(&email, "tok".into()).await;
    let second = manager.get_or_create_session(&email, "ignored".into()).await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.active_session_count(), 1);
}

#[tokio::test]
async fn ensure_fresh_mirrors_refreshed_token_into_session() {
    let (manager, email) = manager_with_outcome(RefreshOutcome::Refreshed).await;
    manager.get_or_create_session(&email, "stale-token".into()).await;

    let session = manager.ensure_fresh(&email).await.unwrap();
    let guard = session.lock().await;
    assert_eq!(guard.access_token(), "refreshed-token");
}

#[tokio::test]
async fn ensure_fresh_invalidates_session_on_refresh_error() {
    let (manager, email) = manager_with_outcome(RefreshOutcome::Error {
        kind: outlook_core::domain::RefreshErrorKind::RefreshExpired,
    })
    .await;
    manager.get_or_create_session(&email, "stale-token".into()).await;

    let result = manager.ensure_fresh(&email).await;
    assert!(result.is_err());
    assert!(manager.get_session(&email).is_none());
}

#[tokio::test]
async fn invalidate_session_removes_it() {
    let (manager, email) = manager_with_outcome(RefreshOutcome::Valid).await;
    manager.get_or_create_session(&email, "tok".into()).await;
    manager.invalidate_session(&email);
    assert!(manager.get_session(&email).is_none());
}
