//! Password hashing with Argon2 and strength policy

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tala_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use thiserror::Error;
use zxcvbn::{zxcvbn, Score};

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
    #[error("Verification failed")]
    VerificationFailed,
    #[error("Password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters")]
    InvalidLength,
    #[error("Password is too weak")]
    TooWeak,
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Enforces the registration policy: length bounds and a zxcvbn score of
    /// at least three. `user_inputs` (email, names) lower the score when the
    /// password is derived from them.
    pub fn validate_strength(password: &str, user_inputs: &[&str]) -> Result<(), PasswordError> {
        let len = password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
            return Err(PasswordError::InvalidLength);
        }
        let entropy = zxcvbn(password, user_inputs);
        if entropy.score() < Score::Three {
            return Err(PasswordError::TooWeak);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = PasswordService::hash("correct horse battery staple").unwrap();
        assert!(PasswordService::verify("correct horse battery staple", &hash).unwrap());
        assert!(!PasswordService::verify("wrong", &hash).unwrap());
    }

    #[test]
    fn short_password_rejected() {
        assert!(matches!(
            PasswordService::validate_strength("ab1!", &[]),
            Err(PasswordError::InvalidLength)
        ));
    }

    #[test]
    fn weak_password_rejected() {
        assert!(matches!(
            PasswordService::validate_strength("password123", &[]),
            Err(PasswordError::TooWeak)
        ));
    }

    #[test]
    fn strong_password_accepted() {
        PasswordService::validate_strength("tr4verse-Quiet-Lantern", &[]).unwrap();
    }

    #[test]
    fn password_built_from_user_inputs_rejected() {
        let err = PasswordService::validate_strength(
            "mara.quintella1988",
            &["mara.quintella@example.com", "Mara", "Quintella"],
        );
        assert!(matches!(err, Err(PasswordError::TooWeak)));
    }
}
