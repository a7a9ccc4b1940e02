// ============================================================================
// Tala API - Assessment Handlers
// File: crates/tala-api/src/handlers/assessments.rs
// ============================================================================
//! Assessment definitions, question banks, invitations and the public
//! token-addressed taking flow

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{
    AssessmentDefinition, AssessmentInstance, Framework, MemberRole, Question, QuestionKind,
    QuestionOption,
};
use tala_core::error::DomainError;
use tala_core::services::{
    AnswerInput, AssessmentResults, InviteOutcome, QuestionBlock, SubmissionOutcome, TokenAccess,
};
use tala_shared::constants::INVITE_EXPIRY_DAYS;

use crate::error::ApiError;
use crate::extract::{require_role, CurrentUser, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub framework: Framework,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub estimated_duration: Option<i32>,
    pub randomize_questions: Option<bool>,
    pub allow_skip: Option<bool>,
    pub show_progress: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddQuestionRequest {
    #[validate(length(min = 1))]
    pub text: String,
    pub kind: QuestionKind,
    pub order: i32,
    pub dimension: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1))]
    pub text: Option<String>,
    pub order: Option<i32>,
    pub dimension: Option<String>,
    pub reverse_scored: Option<bool>,
    pub weight: Option<f64>,
    pub required: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddOptionRequest {
    #[validate(length(min = 1))]
    pub text: String,
    pub value: i32,
    pub order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(length(min = 1))]
    pub user_ids: Vec<Uuid>,
    #[validate(range(min = 1, max = 90))]
    pub expires_in_days: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstanceFilter {
    pub assessment_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponsesRequest {
    pub answers: Vec<AnswerInput>,
}

// ---------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------

/// POST /api/v1/assessments
pub async fn create_assessment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<Json<ApiResponse<AssessmentDefinition>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let definition = state
        .assessments
        .create_definition(
            &ctx.organization_id,
            &payload.name,
            payload.framework,
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(definition)))
}

/// GET /api/v1/assessments
pub async fn list_assessments(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<AssessmentDefinition>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let definitions = state
        .assessments
        .list_definitions(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(definitions)))
}

/// GET /api/v1/assessments/{id}
pub async fn get_assessment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssessmentDefinition>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let definition = state
        .assessments
        .get_definition(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(definition)))
}

/// PUT /api/v1/assessments/{id}
pub async fn update_assessment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssessmentRequest>,
) -> Result<Json<ApiResponse<AssessmentDefinition>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;

    let mut definition = state
        .assessments
        .get_definition(&ctx.organization_id, &id)
        .await?;
    if let Some(name) = payload.name {
        definition.name = name;
    }
    if let Some(description) = payload.description {
        definition.description = description;
    }
    if let Some(instructions) = payload.instructions {
        definition.instructions = instructions;
    }
    if let Some(duration) = payload.estimated_duration {
        definition.estimated_duration = duration;
    }
    if let Some(randomize) = payload.randomize_questions {
        definition.randomize_questions = randomize;
    }
    if let Some(allow_skip) = payload.allow_skip {
        definition.allow_skip = allow_skip;
    }
    if let Some(show_progress) = payload.show_progress {
        definition.show_progress = show_progress;
    }

    let definition = state
        .assessments
        .update_definition(&ctx.organization_id, &definition)
        .await?;
    Ok(Json(ApiResponse::success(definition)))
}

/// POST /api/v1/assessments/{id}/activate
pub async fn activate_assessment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssessmentDefinition>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let definition = state
        .assessments
        .activate_definition(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(definition)))
}

/// POST /api/v1/assessments/{id}/archive
pub async fn archive_assessment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssessmentDefinition>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let definition = state
        .assessments
        .archive_definition(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(definition)))
}

/// DELETE /api/v1/assessments/{id}
pub async fn delete_assessment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    state
        .assessments
        .delete_definition(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
    )))
}

// ---------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------

/// GET /api/v1/assessments/{id}/questions
pub async fn list_questions(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<QuestionBlock>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let questions = state.assessments.questions(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(questions)))
}

/// POST /api/v1/assessments/{id}/questions
pub async fn add_question(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddQuestionRequest>,
) -> Result<Json<ApiResponse<Question>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let question = state
        .assessments
        .add_question(
            &ctx.organization_id,
            &id,
            &payload.text,
            payload.kind,
            payload.order,
            payload.dimension.unwrap_or_default(),
        )
        .await?;
    Ok(Json(ApiResponse::success(question)))
}

/// PUT /api/v1/assessments/{id}/questions/{question_id}
pub async fn update_question(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<Json<ApiResponse<Question>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;

    let blocks = state.assessments.questions(&ctx.organization_id, &id).await?;
    let mut question = blocks
        .into_iter()
        .map(|b| b.question)
        .find(|q| q.id == question_id)
        .ok_or(DomainError::QuestionNotFound)?;
    if let Some(text) = payload.text {
        question.text = text;
    }
    if let Some(order) = payload.order {
        question.order = order;
    }
    if let Some(dimension) = payload.dimension {
        question.dimension = dimension;
    }
    if let Some(reverse_scored) = payload.reverse_scored {
        question.reverse_scored = reverse_scored;
    }
    if let Some(weight) = payload.weight {
        question.weight = weight;
    }
    if let Some(required) = payload.required {
        question.required = required;
    }
    if let Some(is_active) = payload.is_active {
        question.is_active = is_active;
    }

    let question = state
        .assessments
        .update_question(&ctx.organization_id, &question)
        .await?;
    Ok(Json(ApiResponse::success(question)))
}

/// POST /api/v1/assessments/{id}/questions/{question_id}/options
pub async fn add_option(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddOptionRequest>,
) -> Result<Json<ApiResponse<QuestionOption>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let option = state
        .assessments
        .add_option(
            &ctx.organization_id,
            &id,
            &question_id,
            &payload.text,
            payload.value,
            payload.order,
        )
        .await?;
    Ok(Json(ApiResponse::success(option)))
}

// ---------------------------------------------------------------------
// Invitations and instances
// ---------------------------------------------------------------------

/// POST /api/v1/assessments/{id}/invite
pub async fn invite(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InviteRequest>,
) -> Result<Json<ApiResponse<InviteOutcome>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let outcome = state
        .assessments
        .invite(
            &ctx.organization_id,
            &id,
            &payload.user_ids,
            payload.expires_in_days.unwrap_or(INVITE_EXPIRY_DAYS),
            &user,
            payload.message.unwrap_or_default(),
        )
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// GET /api/v1/assessments/instances
pub async fn list_instances(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<InstanceFilter>,
) -> Result<Json<ApiResponse<Vec<AssessmentInstance>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    // Members only see their own instances; reporting roles may filter
    // by any user.
    let user_id = if ctx.require_role(|r| r.can_view_reports()) {
        filter.user_id
    } else {
        Some(user.id)
    };
    let pagination = PageQuery {
        page: filter.page,
        per_page: filter.per_page,
    }
    .pagination();
    let instances = state
        .assessments
        .list_instances(&ctx.organization_id, filter.assessment_id, user_id, pagination)
        .await?;
    Ok(Json(ApiResponse::success(instances)))
}

/// GET /api/v1/assessments/instances/{id}
pub async fn get_instance(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssessmentInstance>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let instance = state
        .assessments
        .get_instance(&ctx.organization_id, &id)
        .await?;
    if instance.user_id != user.id && !ctx.require_role(|r| r.can_view_reports()) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(ApiResponse::success(instance)))
}

/// POST /api/v1/assessments/instances/{id}/cancel
pub async fn cancel_instance(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssessmentInstance>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let instance = state
        .assessments
        .cancel_instance(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(instance)))
}

/// GET /api/v1/assessments/instances/{id}/results
pub async fn instance_results(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssessmentResults>>, ApiError> {
    let results = state
        .assessments
        .results(&ctx.organization_id, &id)
        .await?;
    if results.instance.user_id != user.id && !ctx.require_role(|r| r.can_view_reports()) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(ApiResponse::success(results)))
}

// ---------------------------------------------------------------------
// Public taking flow
// ---------------------------------------------------------------------

/// GET /api/v1/assessments/take/{token}
///
/// Token-addressed, so it lives outside the authenticated router. The
/// first open moves the instance from INVITED to STARTED; reopening a
/// completed link returns the results instead of the form.
pub async fn take(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<TokenAccess>>, ApiError> {
    let access = state.assessments.get_by_token(&token).await?;
    Ok(Json(ApiResponse::success(access)))
}

/// POST /api/v1/assessments/take/{token}/responses
pub async fn submit_responses(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<SubmitResponsesRequest>,
) -> Result<Json<ApiResponse<SubmissionOutcome>>, ApiError> {
    if payload.answers.is_empty() {
        return Err(ApiError::BadRequest("answers must not be empty".to_string()));
    }
    let outcome = state
        .assessments
        .submit_responses(&token, &payload.answers)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
