//! API server configuration.

use vendo_core::auth::password::PasswordPolicy;
use vendo_core::auth::tokens::resolve_secret;

/// Configuration for the API server.
///
/// Always passed in explicitly, never read from process-global state, so
/// tests can run with distinct secrets and policies.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Access token signing secret.
    pub access_secret: String,
    /// Refresh token signing secret.
    pub refresh_secret: String,
    /// Password composition policy for registration.
    pub password_policy: PasswordPolicy,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                             |
    /// |------------------------|-------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:8080`                    |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/vendo`   |
    /// | `ACCESS_TOKEN_SECRET`  | generated and persisted to a file   |
    /// | `REFRESH_TOKEN_SECRET` | generated and persisted to a file   |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/vendo".into()),
            access_secret: resolve_secret("ACCESS_TOKEN_SECRET", "access-secret"),
            refresh_secret: resolve_secret("REFRESH_TOKEN_SECRET", "refresh-secret"),
            password_policy: PasswordPolicy::default(),
        }
    }
}
