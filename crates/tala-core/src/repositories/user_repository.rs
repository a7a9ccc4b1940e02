//! User repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{PasswordResetToken, User};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn create(&self, user: &User) -> Result<User, DomainError>;
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    // Password reset flow
    async fn create_reset_token(
        &self,
        token: &PasswordResetToken,
    ) -> Result<PasswordResetToken, DomainError>;
    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, DomainError>;
    async fn update_reset_token(
        &self,
        token: &PasswordResetToken,
    ) -> Result<PasswordResetToken, DomainError>;
}
