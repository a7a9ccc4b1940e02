// ============================================================================
// Tala Infrastructure - PostgreSQL User Repository
// File: crates/tala-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{PasswordResetToken, User};
use tala_core::error::DomainError;
use tala_core::repositories::UserRepository;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub language: String,
    pub timezone: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            language: row.language,
            timezone: row.timezone,
            is_active: row.is_active,
            email_verified: row.email_verified,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ResetTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ResetTokenRow> for PasswordResetToken {
    fn from(row: ResetTokenRow) -> Self {
        PasswordResetToken {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            expires_at: row.expires_at,
            used_at: row.used_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT
                id, email, password_hash, first_name, last_name,
                language, timezone, is_active, email_verified, last_login_at,
                created_at, modified_at, removed_at
            FROM users
            WHERE id = $1 AND removed_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding user by id: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT
                id, email, password_hash, first_name, last_name,
                language, timezone, is_active, email_verified, last_login_at,
                created_at, modified_at, removed_at
            FROM users
            WHERE LOWER(email) = LOWER($1) AND removed_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding user by email: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        info!("Creating user with email: {}", user.email);

        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name,
                language, timezone, is_active, email_verified, last_login_at,
                created_at, modified_at, removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, email, password_hash, first_name, last_name,
                language, timezone, is_active, email_verified, last_login_at,
                created_at, modified_at, removed_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.language)
        .bind(&user.timezone)
        .bind(user.is_active)
        .bind(user.email_verified)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.modified_at)
        .bind(user.removed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating user: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::EmailAlreadyExists(user.email.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        info!("User created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let row: UserRow = sqlx::query_as(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                first_name = $4,
                last_name = $5,
                language = $6,
                timezone = $7,
                is_active = $8,
                email_verified = $9,
                last_login_at = $10,
                modified_at = $11,
                removed_at = $12
            WHERE id = $1
            RETURNING
                id, email, password_hash, first_name, last_name,
                language, timezone, is_active, email_verified, last_login_at,
                created_at, modified_at, removed_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.language)
        .bind(&user.timezone)
        .bind(user.is_active)
        .bind(user.email_verified)
        .bind(user.last_login_at)
        .bind(user.modified_at)
        .bind(user.removed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating user: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::EmailAlreadyExists(user.email.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        Ok(row.into())
    }

    async fn create_reset_token(
        &self,
        token: &PasswordResetToken,
    ) -> Result<PasswordResetToken, DomainError> {
        let row: ResetTokenRow = sqlx::query_as(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token, expires_at, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, token, expires_at, used_at, created_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating reset token: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, DomainError> {
        let row: Option<ResetTokenRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, token, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding reset token: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn update_reset_token(
        &self,
        token: &PasswordResetToken,
    ) -> Result<PasswordResetToken, DomainError> {
        let row: ResetTokenRow = sqlx::query_as(
            r#"
            UPDATE password_reset_tokens SET
                expires_at = $2,
                used_at = $3
            WHERE id = $1
            RETURNING id, user_id, token, expires_at, used_at, created_at
            "#,
        )
        .bind(token.id)
        .bind(token.expires_at)
        .bind(token.used_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating reset token: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }
}
