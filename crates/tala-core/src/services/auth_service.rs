// ============================================================================
// Tala Core - Authentication Service
// File: crates/tala-core/src/services/auth_service.rs
// ============================================================================
//! Registration, login, token refresh and password reset

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use tala_security::jwt::JwtService;
use tala_security::password::PasswordService;
use tala_security::token::generate_token;
use tala_shared::constants::{ACCESS_TOKEN_LENGTH, TOKEN_TYPE_REFRESH};

use crate::domain::{EmailKind, Language, PasswordResetToken, User};
use crate::error::DomainError;
use crate::repositories::{EmailRepository, UserRepository};
use crate::services::EmailService;

/// Authentication flows over the user repository.
pub struct AuthService<U: UserRepository, E: EmailRepository> {
    user_repo: Arc<U>,
    emails: Arc<EmailService<E>>,
    jwt: JwtService,
}

impl<U: UserRepository, E: EmailRepository> AuthService<U, E> {
    pub fn new(user_repo: Arc<U>, emails: Arc<EmailService<E>>, jwt: JwtService) -> Self {
        Self { user_repo, emails, jwt }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, DomainError> {
        info!("Registration attempt for email: {}", email);

        // 1. Reject duplicate email
        if self.user_repo.find_by_email(email).await?.is_some() {
            warn!("Registration failed: email already exists: {}", email);
            return Err(DomainError::EmailAlreadyExists(email.to_string()));
        }

        // 2. Enforce password policy
        PasswordService::validate_strength(password, &[email, first_name, last_name])
            .map_err(|e| DomainError::PasswordPolicyViolation(e.to_string()))?;

        // 3. Hash and create
        let password_hash = PasswordService::hash(password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        let user = User::new(
            email.to_string(),
            password_hash,
            first_name.to_string(),
            last_name.to_string(),
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let created = self.user_repo.create(&user).await?;

        // 4. Welcome email, best effort
        let context = json!({ "user": { "first_name": created.first_name, "full_name": created.full_name() } });
        if let Err(e) = self
            .emails
            .queue(EmailKind::Welcome, &created.email, context, None, Language::En)
            .await
        {
            warn!("Failed to queue welcome email: {}", e);
        }

        info!("Registration successful for: {}", email);
        Ok(created)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        info!("Login attempt for email: {}", email);

        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| {
                warn!("Login failed: email not found: {}", email);
                DomainError::InvalidCredentials
            })?;

        if !user.can_login() {
            warn!("Login failed: user cannot login: {}", email);
            return Err(DomainError::UserNotActive);
        }

        let password_valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|_e| DomainError::InvalidCredentials)?;
        if !password_valid {
            warn!("Login failed: invalid password for: {}", email);
            return Err(DomainError::InvalidCredentials);
        }

        let (access_token, refresh_token) = self.issue_tokens(&user.id)?;

        let mut updated = user.clone();
        updated.record_login();
        if let Err(e) = self.user_repo.update(&updated).await {
            error!("Failed to update last login: {}", e);
            // Don't fail login for this
        }

        info!("Login successful for: {}", email);
        Ok(LoginResult { user: updated, access_token, refresh_token })
    }

    /// Validates a refresh token and issues a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResult, DomainError> {
        let claims = self
            .jwt
            .validate_typed(refresh_token, TOKEN_TYPE_REFRESH)
            .map_err(|_e| DomainError::InvalidToken)?;
        let user_id = claims.user_id().map_err(|_e| DomainError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        if !user.can_login() {
            return Err(DomainError::UserNotActive);
        }

        let (access_token, refresh_token) = self.issue_tokens(&user.id)?;
        Ok(LoginResult { user, access_token, refresh_token })
    }

    pub async fn me(&self, user_id: &Uuid) -> Result<User, DomainError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound)
    }

    /// Issues a reset token and mails it. Unknown emails succeed silently.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = PasswordResetToken::new(user.id, generate_token(ACCESS_TOKEN_LENGTH));
        let token = self.user_repo.create_reset_token(&token).await?;

        let context = json!({
            "user": { "first_name": user.first_name, "full_name": user.full_name() },
            "reset_token": token.token,
        });
        if let Err(e) = self
            .emails
            .queue(EmailKind::PasswordReset, &user.email, context, None, Language::En)
            .await
        {
            warn!("Failed to queue password reset email: {}", e);
        }

        info!("Password reset token issued for: {}", email);
        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let reset = self
            .user_repo
            .find_reset_token(token)
            .await?
            .ok_or(DomainError::InvalidToken)?;
        if reset.is_used() || reset.is_expired() {
            return Err(DomainError::InvalidToken);
        }

        let mut user = self
            .user_repo
            .find_by_id(&reset.user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        PasswordService::validate_strength(new_password, &[&user.email])
            .map_err(|e| DomainError::PasswordPolicyViolation(e.to_string()))?;
        let password_hash = PasswordService::hash(new_password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        user.set_password(password_hash);
        self.user_repo.update(&user).await?;

        let mut used = reset;
        used.mark_as_used();
        self.user_repo.update_reset_token(&used).await?;

        info!("Password reset completed for user: {}", user.id);
        Ok(())
    }

    fn issue_tokens(&self, user_id: &Uuid) -> Result<(String, String), DomainError> {
        let access = self
            .jwt
            .generate_access_token(user_id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;
        let refresh = self
            .jwt
            .generate_refresh_token(user_id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;
        Ok((access, refresh))
    }
}

/// Result of a successful login or refresh.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::email_repository::MockEmailRepository;
    use crate::repositories::user_repository::MockUserRepository;

    fn jwt() -> JwtService {
        JwtService::new("test-secret-test-secret-test-secret".into(), 900, 604_800)
    }

    fn emails() -> Arc<EmailService<MockEmailRepository>> {
        let mut repo = MockEmailRepository::new();
        repo.expect_is_blacklisted().returning(|_| Ok(false));
        repo.expect_find_template().returning(|_, _, _| Ok(None));
        Arc::new(EmailService::new(
            Arc::new(repo),
            "noreply@tala.test".into(),
            "Tala".into(),
            "https://tala.test".into(),
        ))
    }

    fn user(password: &str) -> User {
        let hash = PasswordService::hash(password).unwrap();
        User::new("dana@acme.test".into(), hash, "Dana".into(), "Reeve".into()).unwrap()
    }

    #[tokio::test]
    async fn test_login_success_issues_pair() {
        let existing = user("correct horse battery staple");
        let mut repo = MockUserRepository::new();
        let found = existing.clone();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_update().returning(|u| Ok(u.clone()));

        let service = AuthService::new(Arc::new(repo), emails(), jwt());
        let result = service
            .login("dana@acme.test", "correct horse battery staple")
            .await
            .unwrap();
        assert!(!result.access_token.is_empty());
        assert!(!result.refresh_token.is_empty());
        assert!(result.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_unknown_email_and_bad_password_look_alike() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let service = AuthService::new(Arc::new(repo), emails(), jwt());
        let unknown = service.login("nobody@acme.test", "whatever").await.unwrap_err();

        let existing = user("correct horse battery staple");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        let service = AuthService::new(Arc::new(repo), emails(), jwt());
        let wrong = service.login("dana@acme.test", "wrong").await.unwrap_err();

        assert!(matches!(unknown, DomainError::InvalidCredentials));
        assert!(matches!(wrong, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let existing = user("correct horse battery staple");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        let service = AuthService::new(Arc::new(repo), emails(), jwt());

        let err = service
            .register("dana@acme.test", "another fine passphrase", "Dana", "Reeve")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let service = AuthService::new(Arc::new(repo), emails(), jwt());

        let err = service
            .register("dana@acme.test", "password", "Dana", "Reeve")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PasswordPolicyViolation(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let existing = user("correct horse battery staple");
        let jwt_service = jwt();
        let access = jwt_service.generate_access_token(&existing.id).unwrap();

        let repo = MockUserRepository::new();
        let service = AuthService::new(Arc::new(repo), emails(), jwt_service);
        let err = service.refresh(&access).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidToken));
    }

    #[tokio::test]
    async fn test_reset_password_round_trip() {
        let existing = user("correct horse battery staple");
        let user_id = existing.id;
        let reset = PasswordResetToken::new(user_id, generate_token(ACCESS_TOKEN_LENGTH));
        let token_str = reset.token.clone();

        let mut repo = MockUserRepository::new();
        let reset_clone = reset.clone();
        repo.expect_find_reset_token()
            .returning(move |_| Ok(Some(reset_clone.clone())));
        let found = existing.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_update().returning(|u| Ok(u.clone()));
        repo.expect_update_reset_token()
            .withf(|t| t.is_used())
            .returning(|t| Ok(t.clone()));

        let service = AuthService::new(Arc::new(repo), emails(), jwt());
        service
            .reset_password(&token_str, "fresh sturdy passphrase 9")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_used_reset_token_rejected() {
        let mut reset = PasswordResetToken::new(Uuid::new_v4(), "tok".into());
        reset.mark_as_used();
        let mut repo = MockUserRepository::new();
        repo.expect_find_reset_token()
            .returning(move |_| Ok(Some(reset.clone())));

        let service = AuthService::new(Arc::new(repo), emails(), jwt());
        let err = service.reset_password("tok", "whatever else 123").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidToken));
    }
}
