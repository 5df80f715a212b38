//! Session store: live token-ID to user-ID mappings.
//!
//! A signed token stays cryptographically valid until its natural expiry;
//! server-side revocation works by deleting the token's entry here. The
//! single-use refresh guarantee rests on `delete` being atomic and
//! reporting how many entries it removed.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;

/// Contract for the credential store backing `SessionManager`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a token-ID mapping that lapses at `expires_at`.
    async fn save(
        &self,
        token_id: Uuid,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Fetch the user for a live (non-expired) entry.
    async fn get(&self, token_id: Uuid) -> Result<Option<i64>, AuthError>;

    /// Remove an entry, returning the number of entries deleted.
    async fn delete(&self, token_id: Uuid) -> Result<u64, AuthError>;
}

/// PostgreSQL-backed session store over the `session_tokens` table.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete entries whose expiry has lapsed.
    ///
    /// Maintenance only; `get` already filters expired rows.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save(
        &self,
        token_id: Uuid,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query("INSERT INTO session_tokens (token_id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, token_id: Uuid) -> Result<Option<i64>, AuthError> {
        let row = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM session_tokens WHERE token_id = $1 AND expires_at > now()",
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, token_id: Uuid) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE token_id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// In-memory session store with the same expiry and delete-count semantics
/// as the PostgreSQL store. Used by tests.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<Uuid, (i64, DateTime<Utc>)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(
        &self,
        token_id: Uuid,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.entries
            .lock()
            .expect("session store lock poisoned")
            .insert(token_id, (user_id, expires_at));
        Ok(())
    }

    async fn get(&self, token_id: Uuid) -> Result<Option<i64>, AuthError> {
        let entries = self.entries.lock().expect("session store lock poisoned");
        Ok(entries
            .get(&token_id)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user_id, _)| *user_id))
    }

    async fn delete(&self, token_id: Uuid) -> Result<u64, AuthError> {
        let removed = self
            .entries
            .lock()
            .expect("session store lock poisoned")
            .remove(&token_id);
        Ok(if removed.is_some() { 1 } else { 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn save_get_delete() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();
        store.save(id, 7, Utc::now() + Duration::minutes(15)).await.unwrap();

        assert_eq!(store.get(id).await.unwrap(), Some(7));
        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.get(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_absent() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();
        store.save(id, 7, Utc::now() - Duration::seconds(1)).await.unwrap();

        assert_eq!(store.get(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_zero_for_missing_entries() {
        let store = MemorySessionStore::new();
        assert_eq!(store.delete(Uuid::new_v4()).await.unwrap(), 0);
    }
}
