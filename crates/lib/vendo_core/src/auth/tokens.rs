//! JWT signing and verification (HS256).

use std::path::PathBuf;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::Claims;

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signing configuration for token pairs.
///
/// An explicit value passed into `SessionManager::new`, never process-global
/// state, so tests can run with distinct secrets.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret for access tokens.
    pub access_secret: String,
    /// Secret for refresh tokens. Distinct from the access secret so one
    /// token kind can never stand in for the other.
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Config with the default 15 minute / 7 day lifetimes.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }
}

/// Sign a claim set with HS256.
pub fn sign(claims: &Claims, secret: &[u8]) -> Result<String, AuthError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Verify a token's signature and expiry against a secret, HS256 only.
///
/// Tokens carrying any other algorithm in their header are rejected, which
/// blocks signature-algorithm substitution. Every failure collapses into
/// `AuthError::InvalidToken` so callers cannot tell parse, signature and
/// expiry failures apart.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

/// Resolve a signing secret: env var, then persisted file, else generate
/// a fresh one and persist it.
pub fn resolve_secret(env_var: &str, file_name: &str) -> String {
    if let Ok(secret) = std::env::var(env_var)
        && !secret.is_empty()
    {
        return secret;
    }
    let path = secret_path(file_name);
    if let Ok(existing) = std::fs::read_to_string(&path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&path, &secret);
    info!(path = %path.display(), "generated new signing secret");
    secret
}

/// Path to a persisted secret file.
fn secret_path(file_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vendo")
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn claims(ttl_secs: i64) -> Claims {
        let now = Utc::now();
        Claims::new(7, Uuid::new_v4(), now, now + Duration::seconds(ttl_secs))
    }

    #[test]
    fn sign_verify_roundtrip() {
        let claims = claims(900);
        let token = sign(&claims, b"roundtrip-secret").unwrap();
        let decoded = verify(&token, b"roundtrip-secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn wrong_secret_is_rejected_deterministically() {
        let token = sign(&claims(900), b"the-right-secret").unwrap();
        for _ in 0..3 {
            assert!(matches!(
                verify(&token, b"the-wrong-secret"),
                Err(AuthError::InvalidToken)
            ));
        }
    }

    #[test]
    fn non_hs256_algorithm_is_rejected() {
        // Same secret, different MAC variant: the header check must fail.
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims(900),
            &EncodingKey::from_secret(b"shared-secret"),
        )
        .unwrap();
        assert!(matches!(
            verify(&token, b"shared-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Well past the default validation leeway.
        let token = sign(&claims(-3600), b"expiry-secret").unwrap();
        assert!(matches!(
            verify(&token, b"expiry-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            verify("not.a.token", b"any-secret"),
            Err(AuthError::InvalidToken)
        ));
    }
}
