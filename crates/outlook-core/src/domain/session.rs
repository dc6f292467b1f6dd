//! In-memory session data (§3 `Session`).
//!
//! This module only carries the data-model attributes of a session; the
//! owned Graph client instances live alongside this snapshot in
//! `outlook-session::manager::Session`, which composes a `SessionSnapshot`
//! with live client handles. Keeping the plain-data half here lets
//! `outlook-dispatcher` and other non-session crates observe session state
//! without depending on the HTTP-client-carrying crate.

use chrono::{DateTime, Utc};

use super::newtypes::Email;

/// Plain-data view of a session: identity, timing, and the current access
/// token mirror. Does not own any I/O resources.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    user_email: Email,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
    access_token: String,
    initialized: bool,
    active: bool,
}

impl SessionSnapshot {
    pub fn new(user_email: Email, access_token: String) -> Self {
        let now = Utc::now();
        Self {
            user_email,
            created_at: now,
            last_access: now,
            access_token,
            initialized: true,
            active: true,
        }
    }

    pub fn user_email(&self) -> &Email {
        &self.user_email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_access(&self) -> DateTime<Utc> {
        self.last_access
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Bumps `last_access` to now. Called on every tool invocation dispatched
    /// through this session.
    pub fn touch(&mut self) {
        self.last_access = Utc::now();
    }

    /// Atomically replaces the access token, e.g. after a refresh. The token
    /// itself is treated as an immutable value per §9's "session-shared
    /// mutable access-token fields" design note — no component mutates the
    /// token string in place, only this whole-value swap.
    pub fn replace_access_token(&mut self, access_token: String) {
        self.access_token = access_token;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether the session has been idle longer than `ttl`.
    pub fn is_idle_beyond(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.last_access > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::new("user@example.com").unwrap()
    }

    #[test]
    fn new_session_is_initialized_and_active() {
        let snap = SessionSnapshot::new(email(), "tok".into());
        assert!(snap.is_initialized());
        assert!(snap.is_active());
    }

    #[test]
    fn touch_bumps_last_access() {
        let mut snap = SessionSnapshot::new(email(), "tok".into());
        let before = snap.last_access();
        std::thread::sleep(std::time::Duration::from_millis(2));
        snap.touch();
        assert!(snap.last_access() >= before);
    }

    #[test]
    fn is_idle_beyond_detects_ttl_breach() {
        let mut snap = SessionSnapshot::new(email(), "tok".into());
        snap.last_access = Utc::now() - chrono::Duration::minutes(31);
        assert!(snap.is_idle_beyond(chrono::Duration::minutes(30)));
    }

    #[test]
    fn deactivate_flips_active_flag() {
        let mut snap = SessionSnapshot::new(email(), "tok".into());
        snap.deactivate();
        assert!(!snap.is_active());
    }
}
