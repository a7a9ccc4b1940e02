// ============================================================================
// Tala API - Authentication Middleware
// File: crates/tala-api/src/middleware/auth.rs
// ============================================================================
//! Validates the bearer access token and attaches the current user

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use tala_core::error::DomainError;
use tala_shared::constants::TOKEN_TYPE_ACCESS;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(ApiError::MissingToken)?;
    let claims = state.jwt.validate_typed(token, TOKEN_TYPE_ACCESS)?;
    let user_id = claims.user_id()?;

    let user = state.auth.me(&user_id).await?;
    if !user.is_active {
        return Err(DomainError::UserNotActive.into());
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
