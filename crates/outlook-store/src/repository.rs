//! SQLite implementation of [`TokenStore`], grounded on
//! `lnxdrive-cache/src/repository.rs`'s row-mapping and tolerant timestamp
//! parsing pattern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use outlook_core::domain::{Email, TokenRecord, UserProfile, UserRecord};
use outlook_core::error::CoreError;
use outlook_core::ports::TokenStore;

use crate::error::StoreError;
use crate::locks::EmailLockTable;

pub struct SqliteTokenStore {
    pool: SqlitePool,
    locks: EmailLockTable,
}

impl SqliteTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: EmailLockTable::new(),
        }
    }
}

/// Parses an ISO-8601 timestamp, falling back to SQLite's bare
/// `%Y-%m-%d %H:%M:%S` format for rows written outside of chrono's
/// `to_rfc3339`.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| StoreError::SerializationError(format!("invalid timestamp '{s}': {e}")))
}

fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    match s {
        Some(ref v) if !v.is_empty() => parse_datetime(v).map(Some),
        _ => Ok(None),
    }
}

fn user_from_row(row: &SqliteRow) -> Result<UserRecord, StoreError> {
    let email: String = row.get("email");
    let azure_object_id: String = row.get("azure_object_id");
    let display_name: String = row.get("display_name");
    let profile_json: String = row.get("profile_json");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let email = Email::new(email).map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let profile: UserProfile = serde_json::from_str(&profile_json)
        .map_err(|e| StoreError::SerializationError(format!("invalid profile JSON: {e}")))?;

    Ok(UserRecord::from_parts(
        email,
        azure_object_id,
        display_name,
        profile,
        parse_datetime(&created_at)?,
        parse_datetime(&updated_at)?,
    ))
}

fn token_from_row(row: &SqliteRow) -> Result<TokenRecord, StoreError> {
    let email: String = row.get("email");
    let access_token: String = row.get("access_token");
    let refresh_token: Option<String> = row.get("refresh_token");
    let scope: Option<String> = row.get("scope");
    let access_token_expires_at: String = row.get("access_token_expires_at");
    let refresh_token_expires_at: Option<String> = row.get("refresh_token_expires_at");
    let id_token: Option<String> = row.get("id_token");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let email = Email::new(email).map_err(|e| StoreError::SerializationError(e.to_string()))?;

    Ok(TokenRecord::from_parts(
        email,
        access_token,
        refresh_token,
        scope,
        parse_datetime(&access_token_expires_at)?,
        parse_optional_datetime(refresh_token_expires_at)?,
        id_token,
        parse_datetime(&created_at)?,
        parse_datetime(&updated_at)?,
    ))
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn save_user(&self, user: &UserRecord) -> Result<(), CoreError> {
        let lock = self.locks.lock_for(user.email());
        let _guard = lock.lock().await;
        let profile_json = serde_json::to_string(user.profile())
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        sqlx::query(
            "INSERT INTO azure_user_info
                (email, azure_object_id, display_name, profile_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                azure_object_id = excluded.azure_object_id,
                display_name = excluded.display_name,
                profile_json = excluded.profile_json,
                updated_at = excluded.updated_at",
        )
        .bind(user.email().as_str())
        .bind(user.azure_object_id())
        .bind(user.display_name())
        .bind(&profile_json)
        .bind(user.created_at().to_rfc3339())
        .bind(user.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    async fn get_user(&self, email: &Email) -> Result<Option<UserRecord>, CoreError> {
        let row = sqlx::query("SELECT * FROM azure_user_info WHERE email = ?")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        row.map(|r| user_from_row(&r)).transpose().map_err(Into::into)
    }

    async fn save_token(&self, token: &TokenRecord) -> Result<(), CoreError> {
        let lock = self.locks.lock_for(token.email());
        let _guard = lock.lock().await;
        sqlx::query(
            "INSERT INTO azure_token_info
                (email, access_token, refresh_token, scope, access_token_expires_at,
                 refresh_token_expires_at, id_token, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                scope = excluded.scope,
                access_token_expires_at = excluded.access_token_expires_at,
                refresh_token_expires_at = excluded.refresh_token_expires_at,
                id_token = excluded.id_token,
                updated_at = excluded.updated_at",
        )
        .bind(token.email().as_str())
        .bind(token.access_token())
        .bind(token.refresh_token())
        .bind(token.scope())
        .bind(token.access_token_expires_at().to_rfc3339())
        .bind(token.refresh_token_expires_at().map(|d| d.to_rfc3339()))
        .bind(token.id_token())
        .bind(token.created_at().to_rfc3339())
        .bind(token.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    async fn get_token(&self, email: &Email) -> Result<Option<TokenRecord>, CoreError> {
        let row = sqlx::query("SELECT * FROM azure_token_info WHERE email = ?")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        row.map(|r| token_from_row(&r)).transpose().map_err(Into::into)
    }

    async fn update_token(&self, token: &TokenRecord) -> Result<(), CoreError> {
        self.save_token(token).await
    }

    async fn delete_token(&self, email: &Email) -> Result<(), CoreError> {
        let lock = self.locks.lock_for(email);
        let _guard = lock.lock().await;
        sqlx::query("DELETE FROM azure_token_info WHERE email = ?")
            .bind(email.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, CoreError> {
        let rows = sqlx::query("SELECT * FROM azure_user_info ORDER BY email")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        rows.iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn cleanup_expired_tokens(&self) -> Result<u64, CoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "DELETE FROM azure_token_info
             WHERE refresh_token_expires_at IS NOT NULL
               AND refresh_token_expires_at < ?
               AND access_token_expires_at < ?",
        )
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DatabasePool;
    use chrono::Duration;
    use outlook_core::domain::TokenInfo;

    async fn store() -> (SqliteTokenStore, DatabasePool) {
        let db = DatabasePool::in_memory().await.unwrap();
        let store = SqliteTokenStore::new(db.pool().clone());
        (store, db)
    }

    fn email() -> Email {
        Email::new("user@example.com").unwrap()
    }

    #[tokio::test]
    async fn save_and_get_user_round_trips() {
        let (store, _db) = store().await;
        let user = UserRecord::new(email(), "obj-1", "Ada", UserProfile::default());
        store.save_user(&user).await.unwrap();
        let fetched = store.get_user(&email()).await.unwrap().unwrap();
        assert_eq!(fetched.display_name(), "Ada");
    }

    #[tokio::test]
    async fn save_and_get_token_round_trips() {
        let (store, _db) = store().await;
        let info = TokenInfo {
            access_token: "a1".into(),
            refresh_token: Some("r1".into()),
            scope: Some("Mail.Read".into()),
            access_token_expires_at: Utc::now() + Duration::hours(1),
            id_token: None,
        };
        let token = TokenRecord::from_token_info(email(), info);
        store.save_token(&token).await.unwrap();
        let fetched = store.get_token(&email()).await.unwrap().unwrap();
        assert_eq!(fetched.access_token(), "a1");
        assert_eq!(fetched.refresh_token(), Some("r1"));
    }

    #[tokio::test]
    async fn delete_token_removes_row() {
        let (store, _db) = store().await;
        let info = TokenInfo {
            access_token: "a1".into(),
            refresh_token: None,
            scope: None,
            access_token_expires_at: Utc::now() + Duration::hours(1),
            id_token: None,
        };
        let token = TokenRecord::from_token_info(email(), info);
        store.save_token(&token).await.unwrap();
        store.delete_token(&email()).await.unwrap();
        assert!(store.get_token(&email()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_expired_tokens_removes_only_fully_expired_rows() {
        let (store, _db) = store().await;
        let expired_info = TokenInfo {
            access_token: "expired".into(),
            refresh_token: Some("r".into()),
            scope: None,
            access_token_expires_at: Utc::now() - Duration::days(1),
            id_token: None,
        };
        let mut expired = TokenRecord::from_token_info(email(), expired_info);
        // Force both expiries into the past; from_token_info computed a
        // 90-day-out refresh expiry, so rewrite via from_parts.
        expired = TokenRecord::from_parts(
            email(),
            expired.access_token().to_string(),
            expired.refresh_token().map(String::from),
            None,
            expired.access_token_expires_at(),
            Some(Utc::now() - Duration::days(1)),
            None,
            expired.created_at(),
            expired.updated_at(),
        );
        store.save_token(&expired).await.unwrap();

        let removed = store.cleanup_expired_tokens().await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_token(&email()).await.unwrap().is_none());
    }
}
