// ============================================================================
// Tala API - Auth Handlers
// File: crates/tala-api/src/handlers/auth.rs
// ============================================================================
//! Registration, login, token refresh and password reset

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use tala_core::domain::{Membership, User};
use tala_core::services::LoginResult;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Tokens plus the user they belong to.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

impl From<LoginResult> for AuthResponse {
    fn from(result: LoginResult) -> Self {
        Self {
            user: result.user,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
        }
    }
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    payload.validate()?;
    let user = state
        .auth
        .register(
            &payload.email,
            &payload.password,
            &payload.first_name,
            &payload.last_name,
        )
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    payload.validate()?;
    let result = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let result = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

/// Current user plus every organization they belong to.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub memberships: Vec<Membership>,
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let memberships = state
        .organizations
        .list_memberships_for_user(&user.id)
        .await?;
    Ok(Json(ApiResponse::success(MeResponse { user, memberships })))
}

/// POST /api/v1/auth/forgot-password. Always answers the same way so the
/// endpoint does not leak which addresses exist.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    payload.validate()?;
    state.auth.request_password_reset(&payload.email).await?;
    Ok(Json(ApiResponse::success(json!({
        "message": "If the address exists, a reset link has been sent"
    }))))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    payload.validate()?;
    state
        .auth
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(Json(ApiResponse::success(json!({
        "message": "Password updated"
    }))))
}
