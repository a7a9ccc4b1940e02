//! JWT token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tala_shared::constants::{TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    CreationError(String),
    #[error("Token validation failed: {0}")]
    ValidationError(String),
    #[error("Wrong token type, expected {0}")]
    WrongTokenType(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|e| JwtError::ValidationError(e.to_string()))
    }
}

#[derive(Clone)]
pub struct JwtService {
    secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl JwtService {
    pub fn new(secret: String, access_expiry: i64, refresh_expiry: i64) -> Self {
        Self {
            secret,
            access_token_expiry: access_expiry,
            refresh_token_expiry: refresh_expiry,
        }
    }

    pub fn generate_access_token(&self, user_id: &Uuid) -> Result<String, JwtError> {
        self.generate_token(user_id, TOKEN_TYPE_ACCESS, self.access_token_expiry)
    }

    pub fn generate_refresh_token(&self, user_id: &Uuid) -> Result<String, JwtError> {
        self.generate_token(user_id, TOKEN_TYPE_REFRESH, self.refresh_token_expiry)
    }

    fn generate_token(&self, user_id: &Uuid, token_type: &str, expiry: i64) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
            token_type: token_type.to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| JwtError::CreationError(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| JwtError::ValidationError(e.to_string()))
    }

    /// Validates the token and rejects it when the `token_type` claim does
    /// not match. Refresh tokens must never pass as access tokens.
    pub fn validate_typed(&self, token: &str, expected: &'static str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(JwtError::WrongTokenType(expected));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret".into(), 900, 604_800)
    }

    #[test]
    fn access_token_round_trips() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let token = svc.generate_access_token(&user_id).unwrap();
        let claims = svc.validate_typed(&token, TOKEN_TYPE_ACCESS).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let svc = service();
        let token = svc.generate_refresh_token(&Uuid::new_v4()).unwrap();
        let err = svc.validate_typed(&token, TOKEN_TYPE_ACCESS).unwrap_err();
        assert!(matches!(err, JwtError::WrongTokenType(_)));
    }

    #[test]
    fn tampered_token_fails_validation() {
        let svc = service();
        let mut token = svc.generate_access_token(&Uuid::new_v4()).unwrap();
        token.push('x');
        assert!(svc.validate_token(&token).is_err());
    }
}
