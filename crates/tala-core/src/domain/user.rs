// ============================================================================
// Tala Core - User Entity
// File: crates/tala-core/src/domain/user.rs
// Description: Platform account with password reset support
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tala_shared::constants::RESET_TOKEN_EXPIRY_HOURS;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Uuid,

    #[validate(email)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    pub last_name: String,

    pub language: String,
    pub timezone: String,

    pub is_active: bool,
    pub email_verified: bool,

    pub last_login_at: Option<DateTime<Utc>>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) -> Result<Self, validator::ValidationErrors> {
        let user = Self {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            password_hash,
            first_name,
            last_name,
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            is_active: true,
            email_verified: false,
            last_login_at: None,
            created_at: Utc::now(),
            modified_at: None,
            removed_at: None,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    pub fn can_login(&self) -> bool {
        self.is_active && self.removed_at.is_none()
    }

    pub fn record_login(&mut self) {
        self.last_login_at = Some(Utc::now());
        self.modified_at = Some(Utc::now());
    }

    pub fn set_password(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.modified_at = Some(Utc::now());
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
        self.is_active = false;
    }

    pub fn is_deleted(&self) -> bool {
        self.removed_at.is_some()
    }
}

/// Single-use password reset token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn new(user_id: Uuid, token: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at: Utc::now() + Duration::hours(RESET_TOKEN_EXPIRY_HOURS),
            used_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn mark_as_used(&mut self) {
        self.used_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_normalizes_email() {
        let user = User::new(
            "Jo.Silva@Example.COM".into(),
            "hash".into(),
            "Jo".into(),
            "Silva".into(),
        )
        .unwrap();
        assert_eq!(user.email, "jo.silva@example.com");
        assert!(user.can_login());
        assert!(!user.email_verified);
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(User::new("not-an-email".into(), "h".into(), "A".into(), "B".into()).is_err());
    }

    #[test]
    fn test_soft_delete_blocks_login() {
        let mut user =
            User::new("a@example.com".into(), "h".into(), "A".into(), "B".into()).unwrap();
        user.soft_delete();
        assert!(!user.can_login());
        assert!(user.is_deleted());
    }

    #[test]
    fn test_reset_token_lifecycle() {
        let mut token = PasswordResetToken::new(Uuid::new_v4(), "tok".into());
        assert!(!token.is_expired());
        assert!(!token.is_used());
        token.mark_as_used();
        assert!(token.is_used());
    }
}
