//! `SessionManager` — owns the in-memory `Email -> Session` map and a
//! background idle-eviction task, grounded on the teacher's
//! `tokio::time::interval` + `tokio_util::sync::CancellationToken` pattern
//! (`lnxdrive-fuse/src/hydration.rs`'s cancellable background task shape,
//! `lnxdrive-sync/src/scheduler.rs`'s `tokio::select!` timer loop).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration as ChronoDuration;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use outlook_core::domain::{Email, RefreshErrorKind, RefreshOutcome, SessionSnapshot};
use outlook_core::error::CoreError;
use outlook_core::ports::{AuthProvider, TokenStore};

use crate::session::Session;

/// Default session idle timeout (§2.1 `SESSION_TTL_SECONDS`).
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 1800;
/// Default idle-sweep interval (§2.1 `SESSION_CLEANUP_INTERVAL_SECONDS`).
pub const DEFAULT_CLEANUP_INTERVAL_SECONDS: u64 = 300;

pub struct SessionManager {
    sessions: DashMap<Email, Arc<Mutex<Session>>>,
    auth: Arc<dyn AuthProvider>,
    token_store: Arc<dyn TokenStore>,
    graph_base_url: String,
    ttl: ChronoDuration,
    cleanup_interval: StdDuration,
    cleanup_token: CancellationToken,
    cleanup_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthProvider>, token_store: Arc<dyn TokenStore>, graph_base_url: impl Into<String>) -> Arc<Self> {
        Self::with_config(
            auth,
            token_store,
            graph_base_url,
            DEFAULT_SESSION_TTL_SECONDS,
            DEFAULT_CLEANUP_INTERVAL_SECONDS,
        )
    }

    pub fn with_config(
        auth: Arc<dyn AuthProvider>,
        token_store: Arc<dyn TokenStore>,
        graph_base_url: impl Into<String>,
        ttl_seconds: i64,
        cleanup_interval_seconds: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            auth,
            token_store,
            graph_base_url: graph_base_url.into(),
            ttl: ChronoDuration::seconds(ttl_seconds),
            cleanup_interval: StdDuration::from_secs(cleanup_interval_seconds),
            cleanup_token: CancellationToken::new(),
            cleanup_handle: Mutex::new(None),
        })
    }

    /// Returns a session for `email`, creating one from `access_token` if
    /// none exists yet.
    pub async fn get_or_create_session(self: &Arc<Self>, email: &Email, access_token: String) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.sessions.get(email) {
            return existing.value().clone();
        }
        let snapshot = SessionSnapshot::new(email.clone(), access_token);
        let session = Arc::new(Mutex::new(Session::new(snapshot, &self.graph_base_url)));
        self.sessions.insert(email.clone(), session.clone());
        info!(email = %email, "created session");
        session
    }

    pub fn get_session(&self, email: &Email) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(email).map(|s| s.value().clone())
    }

    pub fn invalidate_session(&self, email: &Email) {
        if self.sessions.remove(email).is_some() {
            info!(email = %email, "invalidated session");
        }
    }

    /// Ensures the caller's token is fresh, refreshing through the auth
    /// provider if needed and mirroring the new access token into the
    /// session and touching its `last_access` (§4.6: token errors
    /// discovered mid-call invalidate the session).
    pub async fn ensure_fresh(self: &Arc<Self>, email: &Email) -> Result<Arc<Mutex<Session>>, CoreError> {
        let outcome = self.auth.check_and_refresh_if_needed(email).await?;

        match outcome {
            RefreshOutcome::Valid => {}
            RefreshOutcome::Refreshed => {
                if let Some(record) = self.token_store.get_token(email).await? {
                    if let Some(session) = self.sessions.get(email) {
                        let mut session = session.lock().await;
                        session.snapshot_mut().replace_access_token(record.access_token().to_string());
                    }
                }
            }
            RefreshOutcome::Error { kind } => {
                self.invalidate_session(email);
                return Err(match kind {
                    RefreshErrorKind::NoToken | RefreshErrorKind::NoRefreshToken => CoreError::AuthenticationRequired {
                        email: email.to_string(),
                    },
                    RefreshErrorKind::RefreshExpired | RefreshErrorKind::RefreshFailed => CoreError::TokenRefreshFailed {
                        reason: format!("{kind:?}"),
                    },
                });
            }
        }

        match self.sessions.get(email) {
            Some(session) => {
                session.lock().await.snapshot_mut().touch();
                Ok(session.value().clone())
            }
            None => Err(CoreError::AuthenticationRequired {
                email: email.to_string(),
            }),
        }
    }

    /// Spawns the background idle-session sweep. Idempotent: a second call
    /// before `shutdown` is a no-op.
    pub fn spawn_cleanup_task(self: &Arc<Self>) {
        let manager = self.clone();
        let token = self.cleanup_token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.cleanup_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("session cleanup task cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        manager.sweep_idle_sessions();
                    }
                }
            }
        });

        if let Ok(mut guard) = self.cleanup_handle.try_lock() {
            *guard = Some(handle);
        }
    }

    fn sweep_idle_sessions(&self) {
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            // `try_lock` avoids blocking the sweep on an in-flight tool call;
            // a session mid-use is, by definition, not idle.
            if let Ok(session) = entry.value().try_lock() {
                if session.snapshot().is_idle_beyond(self.ttl) {
                    expired.push(entry.key().clone());
                }
            }
        }
        for email in expired {
            self.sessions.remove(&email);
            info!(email = %email, "evicted idle session");
        }
    }

    pub async fn shutdown(&self) {
        self.cleanup_token.cancel();
        if let Some(handle) = self.cleanup_handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }
}
