// ============================================================================
// Tala API - Email Template Handlers
// File: crates/tala-api/src/handlers/emails.rs
// ============================================================================
//! Organization email template management. Outbound delivery itself is
//! the worker's job.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{EmailKind, EmailTemplate, Language};

use crate::error::ApiError;
use crate::extract::{require_role, CurrentUser, Tenant};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: EmailKind,
    pub language: Option<Language>,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub html_content: String,
    pub text_content: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub subject: Option<String>,
    #[validate(length(min = 1))]
    pub html_content: Option<String>,
    pub text_content: Option<String>,
    #[validate(email)]
    pub from_email: Option<String>,
    pub from_name: Option<String>,
    #[validate(email)]
    pub reply_to: Option<String>,
    pub is_active: Option<bool>,
}

/// GET /api/v1/emails/templates
pub async fn list_templates(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<EmailTemplate>>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let templates = state.emails.templates(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(templates)))
}

/// GET /api/v1/emails/templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EmailTemplate>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let template = state.emails.get_template(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(template)))
}

/// POST /api/v1/emails/templates
pub async fn create_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<Json<ApiResponse<EmailTemplate>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    payload.validate()?;
    let template = state
        .emails
        .create_template(
            &ctx.organization_id,
            payload.name,
            payload.kind,
            payload.language.unwrap_or_default(),
            payload.subject,
            payload.html_content,
            payload.text_content.unwrap_or_default(),
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(template)))
}

/// PUT /api/v1/emails/templates/{id}
pub async fn update_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> Result<Json<ApiResponse<EmailTemplate>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    payload.validate()?;

    let mut template = state.emails.get_template(&ctx.organization_id, &id).await?;
    if let Some(name) = payload.name {
        template.name = name;
    }
    if let Some(subject) = payload.subject {
        template.subject = subject;
    }
    if let Some(html_content) = payload.html_content {
        template.html_content = html_content;
    }
    if let Some(text_content) = payload.text_content {
        template.text_content = text_content;
    }
    if let Some(from_email) = payload.from_email {
        template.from_email = Some(from_email);
    }
    if let Some(from_name) = payload.from_name {
        template.from_name = from_name;
    }
    if let Some(reply_to) = payload.reply_to {
        template.reply_to = reply_to;
    }
    if let Some(is_active) = payload.is_active {
        template.is_active = is_active;
    }

    let template = state
        .emails
        .update_template(&ctx.organization_id, &template)
        .await?;
    Ok(Json(ApiResponse::success(template)))
}
