//! `TokenRecord` — one record per user, foreign-keyed to `UserRecord` by email.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::Email;

/// Default lifetime Azure AD grants a refresh token absent a sliding window.
pub const DEFAULT_REFRESH_TOKEN_LIFETIME_DAYS: i64 = 90;

/// Raw token material as returned by the Azure AD token endpoint, prior to
/// being persisted as a [`TokenRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub access_token_expires_at: DateTime<Utc>,
    pub id_token: Option<String>,
}

/// Persisted OAuth credential for a single user.
///
/// Invariants (see `spec.md` §3): access-token expiry is always present and
/// UTC; a record exists only while at least one token is present; cascade
/// deleted when the owning [`crate::domain::UserRecord`] is removed; expiry
/// timestamps are monotonic w.r.t. `updated_at` of the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    email: Email,
    access_token: String,
    refresh_token: Option<String>,
    scope: Option<String>,
    access_token_expires_at: DateTime<Utc>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    id_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Builds a new record from freshly exchanged token material.
    ///
    /// Refresh-token expiry is computed as `now_utc + 90 days` per Azure
    /// defaults when a refresh token is present; `None` otherwise.
    pub fn from_token_info(email: Email, info: TokenInfo) -> Self {
        let now = Utc::now();
        let refresh_token_expires_at = info
            .refresh_token
            .as_ref()
            .map(|_| now + Duration::days(DEFAULT_REFRESH_TOKEN_LIFETIME_DAYS));
        Self {
            email,
            access_token: info.access_token,
            refresh_token: info.refresh_token,
            scope: info.scope,
            access_token_expires_at: info.access_token_expires_at,
            refresh_token_expires_at,
            id_token: info.id_token,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a record from storage (row mapping). Does not recompute
    /// `refresh_token_expires_at`; the stored value is authoritative.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        email: Email,
        access_token: String,
        refresh_token: Option<String>,
        scope: Option<String>,
        access_token_expires_at: DateTime<Utc>,
        refresh_token_expires_at: Option<DateTime<Utc>>,
        id_token: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            email,
            access_token,
            refresh_token,
            scope,
            access_token_expires_at,
            refresh_token_expires_at,
            id_token,
            created_at,
            updated_at,
        }
    }

    /// Applies a refreshed token, preserving the existing refresh token if
    /// the refresh response did not include a new one (per §4.2).
    pub fn apply_refresh(&mut self, info: TokenInfo) {
        self.access_token = info.access_token;
        if let Some(new_refresh) = info.refresh_token {
            self.refresh_token = Some(new_refresh);
            self.refresh_token_expires_at =
                Some(Utc::now() + Duration::days(DEFAULT_REFRESH_TOKEN_LIFETIME_DAYS));
        }
        if let Some(scope) = info.scope {
            self.scope = Some(scope);
        }
        self.access_token_expires_at = info.access_token_expires_at;
        self.id_token = info.id_token.or_else(|| self.id_token.clone());
        self.updated_at = Utc::now();
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn access_token_expires_at(&self) -> DateTime<Utc> {
        self.access_token_expires_at
    }

    pub fn refresh_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.refresh_token_expires_at
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True iff the access token expires within `buffer` of now.
    pub fn is_access_token_expired(&self, buffer: Duration) -> bool {
        Utc::now() >= self.access_token_expires_at - buffer
    }

    /// True iff the refresh token (if any) is past its expiry.
    pub fn is_refresh_token_expired(&self) -> bool {
        match self.refresh_token_expires_at {
            Some(expiry) => Utc::now() >= expiry,
            None => true,
        }
    }
}

/// Outcome of [`check_and_refresh_if_needed`]-style operations (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Valid,
    Refreshed,
    Error { kind: RefreshErrorKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshErrorKind {
    NoToken,
    NoRefreshToken,
    RefreshExpired,
    RefreshFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_email() -> Email {
        Email::new("user@example.com").unwrap()
    }

    #[test]
    fn from_token_info_computes_90_day_refresh_expiry_when_present() {
        let info = TokenInfo {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            scope: Some("Mail.Read".into()),
            access_token_expires_at: Utc::now() + Duration::hours(1),
            id_token: None,
        };
        let record = TokenRecord::from_token_info(sample_email(), info);
        let expiry = record.refresh_token_expires_at().unwrap();
        let expected = Utc::now() + Duration::days(90);
        assert!((expiry - expected).num_seconds().abs() < 5);
    }

    #[test]
    fn from_token_info_has_no_refresh_expiry_without_refresh_token() {
        let info = TokenInfo {
            access_token: "a".into(),
            refresh_token: None,
            scope: None,
            access_token_expires_at: Utc::now() + Duration::hours(1),
            id_token: None,
        };
        let record = TokenRecord::from_token_info(sample_email(), info);
        assert!(record.refresh_token_expires_at().is_none());
    }

    #[test]
    fn apply_refresh_preserves_old_refresh_token_if_absent_in_response() {
        let mut record = TokenRecord::from_token_info(
            sample_email(),
            TokenInfo {
                access_token: "a1".into(),
                refresh_token: Some("r1".into()),
                scope: None,
                access_token_expires_at: Utc::now() + Duration::hours(1),
                id_token: None,
            },
        );
        record.apply_refresh(TokenInfo {
            access_token: "a2".into(),
            refresh_token: None,
            scope: None,
            access_token_expires_at: Utc::now() + Duration::hours(1),
            id_token: None,
        });
        assert_eq!(record.access_token(), "a2");
        assert_eq!(record.refresh_token(), Some("r1"));
    }

    #[test]
    fn is_access_token_expired_respects_buffer() {
        let record = TokenRecord::from_token_info(
            sample_email(),
            TokenInfo {
                access_token: "a".into(),
                refresh_token: None,
                scope: None,
                access_token_expires_at: Utc::now() + Duration::seconds(100),
                id_token: None,
            },
        );
        assert!(record.is_access_token_expired(Duration::seconds(300)));
        assert!(!record.is_access_token_expired(Duration::seconds(0)));
    }

    #[test]
    fn no_refresh_token_means_refresh_is_considered_expired() {
        let record = TokenRecord::from_token_info(
            sample_email(),
            TokenInfo {
                access_token: "a".into(),
                refresh_token: None,
                scope: None,
                access_token_expires_at: Utc::now() + Duration::hours(1),
                id_token: None,
            },
        );
        assert!(record.is_refresh_token_expired());
    }
}
