//! Session manager: token pair issuance, verification and revocation.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::AuthError;
use super::store::SessionStore;
use super::tokens::{self, TokenConfig};
use crate::models::auth::{AccessRecord, Claims, TokenPair};

/// Issues, verifies and revokes token pairs backed by a session store.
///
/// Holds no mutable state of its own; every session lives in the store, so
/// clones share one view and requests need no in-process coordination.
#[derive(Clone)]
pub struct SessionManager {
    config: TokenConfig,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(config: TokenConfig, store: Arc<dyn SessionStore>) -> Self {
        Self { config, store }
    }

    /// Mint a fresh access/refresh pair for a user.
    ///
    /// Each token gets its own UUID and expiry; the access token always
    /// expires before the refresh token. Nothing is persisted until
    /// `save_auth`. Fails only if signing itself fails.
    pub fn issue_tokens(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_id = Uuid::new_v4();
        let refresh_id = Uuid::new_v4();
        let access_expires_at = now + self.config.access_ttl;
        let refresh_expires_at = now + self.config.refresh_ttl;

        let access_claims = Claims::new(user_id, access_id, now, access_expires_at);
        let refresh_claims = Claims::new(user_id, refresh_id, now, refresh_expires_at);

        Ok(TokenPair {
            access_token: tokens::sign(&access_claims, self.config.access_secret.as_bytes())?,
            refresh_token: tokens::sign(&refresh_claims, self.config.refresh_secret.as_bytes())?,
            access_id,
            refresh_id,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Cheap signature/expiry pre-check on an access token.
    pub fn token_valid(&self, token: &str) -> Result<(), AuthError> {
        tokens::verify(token, self.config.access_secret.as_bytes()).map(|_| ())
    }

    /// Verify an access token and pull out its store key and subject.
    pub fn extract_token_metadata(&self, token: &str) -> Result<AccessRecord, AuthError> {
        let claims = tokens::verify(token, self.config.access_secret.as_bytes())?;
        Ok(AccessRecord {
            access_id: claims.token_id()?,
            user_id: claims.user_id()?,
        })
    }

    /// Persist both pair entries, each with its own expiry.
    pub async fn save_auth(&self, user_id: i64, pair: &TokenPair) -> Result<(), AuthError> {
        self.store
            .save(pair.access_id, user_id, pair.access_expires_at)
            .await?;
        self.store
            .save(pair.refresh_id, user_id, pair.refresh_expires_at)
            .await
    }

    /// Look up the live session entry for an access token ID.
    ///
    /// Absence means revoked, expired or never issued; callers cannot and
    /// must not tell those apart.
    pub async fn get_auth(&self, access_id: Uuid) -> Result<i64, AuthError> {
        self.store
            .get(access_id)
            .await?
            .ok_or(AuthError::SessionNotFound)
    }

    /// Remove a session entry, returning the deleted-entry count.
    pub async fn delete_auth(&self, token_id: Uuid) -> Result<u64, AuthError> {
        self.store.delete(token_id).await
    }

    /// Retire a refresh token's store entry without issuing a replacement.
    ///
    /// Used by logout. Returns the deleted-entry count; an entry that is
    /// already gone is not an error.
    pub async fn revoke_refresh(&self, refresh_token: &str) -> Result<u64, AuthError> {
        let claims = tokens::verify(refresh_token, self.config.refresh_secret.as_bytes())?;
        self.store.delete(claims.token_id()?).await
    }

    /// Rotate a refresh token into a brand-new pair.
    ///
    /// The presented token's store entry is deleted before anything is
    /// issued. Zero deleted entries means the token was already rotated,
    /// revoked or never stored, and the call fails with `Unauthorized`;
    /// under concurrent use of one refresh token the store's atomic delete
    /// lets exactly one caller through.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = tokens::verify(refresh_token, self.config.refresh_secret.as_bytes())?;
        let refresh_id = claims.token_id()?;
        let user_id = claims.user_id()?;

        if self.store.delete(refresh_id).await? == 0 {
            return Err(AuthError::Unauthorized);
        }

        let pair = self.issue_tokens(user_id)?;
        self.save_auth(user_id, &pair).await?;
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemorySessionStore;

    const ACCESS_SECRET: &[u8] = b"access-secret-for-tests";
    const REFRESH_SECRET: &[u8] = b"refresh-secret-for-tests";

    fn manager() -> SessionManager {
        SessionManager::new(
            TokenConfig::new("access-secret-for-tests", "refresh-secret-for-tests"),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[test]
    fn issued_claims_decode_with_subject_and_expiry_ordering() {
        let pair = manager().issue_tokens(7).unwrap();

        let access = tokens::verify(&pair.access_token, ACCESS_SECRET).unwrap();
        let refresh = tokens::verify(&pair.refresh_token, REFRESH_SECRET).unwrap();

        assert_eq!(access.sub, "7");
        assert_eq!(refresh.sub, "7");
        assert_eq!(access.jti, pair.access_id.to_string());
        assert_eq!(refresh.jti, pair.refresh_id.to_string());
        assert!(access.exp > access.iat);
        assert!(access.exp < refresh.exp);
    }

    #[test]
    fn metadata_roundtrip_recovers_the_issuing_user() {
        let m = manager();
        let pair = m.issue_tokens(42).unwrap();

        let record = m.extract_token_metadata(&pair.access_token).unwrap();
        assert_eq!(record.user_id, 42);
        assert_eq!(record.access_id, pair.access_id);
    }

    #[test]
    fn tokens_from_another_manager_are_rejected() {
        let m = manager();
        let other = SessionManager::new(
            TokenConfig::new("different-access-secret", "different-refresh-secret"),
            Arc::new(MemorySessionStore::new()),
        );
        let pair = other.issue_tokens(7).unwrap();

        // Deterministic: the same rejection on every attempt.
        for _ in 0..2 {
            assert!(matches!(
                m.token_valid(&pair.access_token),
                Err(AuthError::InvalidToken)
            ));
        }
    }

    #[test]
    fn refresh_token_is_not_a_valid_access_token() {
        let m = manager();
        let pair = m.issue_tokens(7).unwrap();
        assert!(matches!(
            m.token_valid(&pair.refresh_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn save_then_get_then_delete() {
        let m = manager();
        let pair = m.issue_tokens(7).unwrap();
        m.save_auth(7, &pair).await.unwrap();

        assert_eq!(m.get_auth(pair.access_id).await.unwrap(), 7);
        assert_eq!(m.delete_auth(pair.access_id).await.unwrap(), 1);
        assert!(matches!(
            m.get_auth(pair.access_id).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn revocation_outlives_a_valid_signature() {
        let m = manager();
        let pair = m.issue_tokens(7).unwrap();
        m.save_auth(7, &pair).await.unwrap();
        m.delete_auth(pair.access_id).await.unwrap();

        // The signature still verifies; only the store knows it is gone.
        assert!(m.token_valid(&pair.access_token).is_ok());
        assert!(matches!(
            m.get_auth(pair.access_id).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_and_is_single_use() {
        let m = manager();
        let pair = m.issue_tokens(7).unwrap();
        m.save_auth(7, &pair).await.unwrap();

        let rotated = m.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.access_id, pair.access_id);
        assert_ne!(rotated.refresh_id, pair.refresh_id);
        assert_eq!(m.get_auth(rotated.access_id).await.unwrap(), 7);

        // Replaying the old refresh token fails; the new one still works.
        assert!(matches!(
            m.refresh(&pair.refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(m.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn revoked_refresh_token_cannot_rotate() {
        let m = manager();
        let pair = m.issue_tokens(7).unwrap();
        m.save_auth(7, &pair).await.unwrap();

        assert_eq!(m.revoke_refresh(&pair.refresh_token).await.unwrap(), 1);
        assert!(matches!(
            m.refresh(&pair.refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn refresh_of_a_never_saved_token_is_unauthorized() {
        let m = manager();
        let pair = m.issue_tokens(7).unwrap();
        assert!(matches!(
            m.refresh(&pair.refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_refresh_has_exactly_one_winner() {
        let m = manager();
        let pair = m.issue_tokens(7).unwrap();
        m.save_auth(7, &pair).await.unwrap();

        let (a, b) = {
            let m1 = m.clone();
            let m2 = m.clone();
            let t1 = pair.refresh_token.clone();
            let t2 = pair.refresh_token.clone();
            tokio::join!(
                tokio::spawn(async move { m1.refresh(&t1).await }),
                tokio::spawn(async move { m2.refresh(&t2).await }),
            )
        };
        let results = [a.unwrap(), b.unwrap()];

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AuthError::Unauthorized))));
    }
}
