//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types in `vendo_api` (which carry serde renames for the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthError;

/// Domain user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

/// Claims embedded in access and refresh tokens.
///
/// The field names (`sub`, `jti`, `iat`, `exp`) are part of the wire
/// contract shared with existing clients and must not be renamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID in decimal string form.
    pub sub: String,
    /// Token ID (UUID string), the key into the session store.
    pub jti: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Build the claim set for one token of a pair.
    pub fn new(
        user_id: i64,
        token_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            jti: token_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Subject parsed back to a user ID.
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    /// Token ID parsed back to a UUID.
    pub fn token_id(&self) -> Result<Uuid, AuthError> {
        self.jti.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Freshly issued access/refresh token pair.
///
/// The token IDs are the join keys into the session store. Nothing is
/// persisted until `SessionManager::save_auth`.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_id: Uuid,
    pub refresh_id: Uuid,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Verified access-token metadata: store key plus subject.
#[derive(Debug, Clone, Copy)]
pub struct AccessRecord {
    pub access_id: Uuid,
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_roundtrip_subject_and_token_id() {
        let token_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = Claims::new(42, token_id, now, now + chrono::Duration::minutes(15));

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.token_id().unwrap(), token_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn non_numeric_subject_is_invalid() {
        let claims = Claims {
            sub: "not-a-number".into(),
            jti: Uuid::new_v4().to_string(),
            iat: 0,
            exp: 1,
        };
        assert!(matches!(claims.user_id(), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn malformed_token_id_is_invalid() {
        let claims = Claims {
            sub: "1".into(),
            jti: "not-a-uuid".into(),
            iat: 0,
            exp: 1,
        };
        assert!(matches!(claims.token_id(), Err(AuthError::InvalidToken)));
    }
}
