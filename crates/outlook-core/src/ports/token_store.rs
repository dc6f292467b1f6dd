//! Token Store port (component A), grounded on the teacher's
//! `IStateRepository` CRUD shape.

use async_trait::async_trait;

use crate::domain::{Email, TokenRecord, UserRecord};
use crate::error::CoreError;

/// Persists `UserRecord`/`TokenRecord` pairs. Implementations must serialize
/// writes per email (§4.1's "no torn updates across concurrent refreshes")
/// but may allow concurrent reads and writes across distinct emails.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save_user(&self, user: &UserRecord) -> Result<(), CoreError>;

    async fn get_user(&self, email: &Email) -> Result<Option<UserRecord>, CoreError>;

    async fn save_token(&self, token: &TokenRecord) -> Result<(), CoreError>;

    async fn get_token(&self, email: &Email) -> Result<Option<TokenRecord>, CoreError>;

    async fn update_token(&self, token: &TokenRecord) -> Result<(), CoreError>;

    /// Cascade-deletes the user's token record (and, per §3's invariant, the
    /// user record itself if no other tokens reference it).
    async fn delete_token(&self, email: &Email) -> Result<(), CoreError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, CoreError>;

    /// Deletes every token record whose refresh token has expired and has
    /// no valid access token either. Returns the number of records removed.
    async fn cleanup_expired_tokens(&self) -> Result<u64, CoreError>;
}
