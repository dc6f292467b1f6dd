//! Auth Service port (component B), grounded on the teacher's
//! `ICloudProvider::{authenticate, refresh_tokens}` shape, adapted from a
//! native-app PKCE flow to a confidential-client authorization-code flow.

use async_trait::async_trait;

use crate::domain::{Email, RefreshOutcome, TokenInfo};
use crate::error::CoreError;

/// Drives the OAuth 2.0 authorization-code and refresh-token grants against
/// Azure AD on behalf of a single configured application registration.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Builds the `/authorize` URL the caller should redirect the user to,
    /// along with an opaque `state` value the caller must round-trip to
    /// [`AuthProvider::complete_auth_flow`].
    fn start_auth_flow(&self) -> Result<(String, String), CoreError>;

    /// Exchanges an authorization code for tokens and resolves the
    /// authenticated user's email (preferring `mail`, falling back to
    /// `userPrincipalName` per §4.2's `UserIdentificationError` handling).
    async fn complete_auth_flow(
        &self,
        code: &str,
        state: &str,
    ) -> Result<(Email, TokenInfo), CoreError>;

    /// Exchanges a refresh token for a new access token. An `invalid_grant`
    /// response from Azure AD is surfaced as
    /// [`crate::domain::RefreshErrorKind::RefreshExpired`], not a transport
    /// error.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenInfo, CoreError>;

    /// Evaluates an existing record and refreshes it if needed, returning
    /// the outcome without ever exposing a bare transport error.
    async fn check_and_refresh_if_needed(&self, email: &Email) -> Result<RefreshOutcome, CoreError>;
}
