//! User persistence: the account store behind registration and login.

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{User, UserWithPassword};

/// Default role for new accounts.
pub const ROLE_USER: &str = "user";

/// Administrative role.
pub const ROLE_ADMIN: &str = "admin";

/// Contract for account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with `EmailTaken` on a duplicate email.
    async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn count(&self) -> Result<i64, AuthError>;

    /// All accounts, oldest first.
    async fn list(&self) -> Result<Vec<User>, AuthError>;
}

/// PostgreSQL-backed user store over the `users` table.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AuthError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, name, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AuthError::EmailTaken;
                }
            }
            AuthError::DbError(e)
        })?;

        Ok(User {
            id,
            email: email.to_string(),
            name: name.map(str::to_string),
            role: role.to_string(),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        let row = sqlx::query_as::<_, (i64, String, Option<String>, String, String)>(
            "SELECT id, email, name, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, email, name, role, password_hash)| UserWithPassword {
            user: User {
                id,
                email,
                name,
                role,
            },
            password_hash,
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, (String, Option<String>, String)>(
            "SELECT email, name, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(email, name, role)| User {
            id,
            email,
            name,
            role,
        }))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn count(&self) -> Result<i64, AuthError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self) -> Result<Vec<User>, AuthError> {
        let rows = sqlx::query_as::<_, (i64, String, Option<String>, String)>(
            "SELECT id, email, name, role FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, email, name, role)| User {
                id,
                email,
                name,
                role,
            })
            .collect())
    }
}

/// In-memory user store for tests. IDs are assigned sequentially from 1.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<MemoryUsers>,
}

#[derive(Default)]
struct MemoryUsers {
    next_id: i64,
    rows: Vec<StoredUser>,
}

#[derive(Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AuthError> {
        let mut inner = self.inner.lock().expect("user store lock poisoned");
        if inner.rows.iter().any(|r| r.user.email == email) {
            return Err(AuthError::EmailTaken);
        }
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            email: email.to_string(),
            name: name.map(str::to_string),
            role: role.to_string(),
        };
        inner.rows.push(StoredUser {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner
            .rows
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| UserWithPassword {
                user: r.user.clone(),
                password_hash: r.password_hash.clone(),
            }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner
            .rows
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.user.clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner.rows.iter().any(|r| r.user.email == email))
    }

    async fn count(&self) -> Result<i64, AuthError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner.rows.len() as i64)
    }

    async fn list(&self) -> Result<Vec<User>, AuthError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner.rows.iter().map(|r| r.user.clone()).collect())
    }
}
