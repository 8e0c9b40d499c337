/// User database operations for the auth service
use crate::error::{AuthError, Result};
use crate::models::User;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Fields accepted when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// `None` for identities created through OAuth federation.
    pub password_hash: Option<String>,
}

/// Storage contract for identities.
///
/// The service does not own the identity lifecycle; every read and write
/// goes through this trait, so tests can substitute an in-memory store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn update(&self, user: &User) -> Result<User>;
    /// Remove the user and return the deleted row.
    async fn delete(&self, id: Uuid) -> Result<User>;
    async fn list_all(&self) -> Result<Vec<User>>;
}

/// Postgres-backed user store
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
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // The unique index on email backs the uniqueness contract even
            // under concurrent registration.
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailAlreadyExists,
            _ => AuthError::from(e),
        })?;

        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2,
                email = $3,
                password_hash = $4,
                role = $5,
                email_verified_at = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.email_verified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailInUse,
            _ => AuthError::from(e),
        })?;

        updated.ok_or(AuthError::UserNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<User> {
        let deleted = sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        deleted.ok_or(AuthError::UserNotFound)
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
