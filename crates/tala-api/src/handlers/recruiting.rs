// ============================================================================
// Tala API - Recruiting Handlers
// File: crates/tala-api/src/handlers/recruiting.rs
// ============================================================================
//! Clients, jobs, candidates, the application pipeline, interviews and
//! placements

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{
    ApplicationStatus, Candidate, Client, Interview, InterviewKind, Job, JobApplication,
    MemberRole, Placement,
};

use crate::error::ApiError;
use crate::extract::{require_role, CurrentUser, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub primary_contact_name: String,
    #[validate(email)]
    pub primary_contact_email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub industry: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub primary_contact_name: Option<String>,
    #[validate(email)]
    pub primary_contact_email: Option<String>,
    pub primary_contact_phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub commission_rate: Option<Decimal>,
    pub payment_terms: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub remote_allowed: Option<bool>,
    pub min_experience_years: Option<i32>,
    pub max_experience_years: Option<i32>,
    pub required_skills: Option<Vec<String>>,
    pub preferred_skills: Option<Vec<String>>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub currency: Option<String>,
    #[validate(range(min = 1))]
    pub positions_available: Option<i32>,
    pub application_deadline: Option<NaiveDate>,
    pub requires_assessment: Option<bool>,
    pub assessment_definition_id: Option<Uuid>,
    pub assigned_recruiter: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCandidateRequest {
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCandidateRequest {
    #[validate(length(min = 1, max = 150))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    #[validate(range(min = 0))]
    pub experience_years: Option<i32>,
    pub location: Option<String>,
    pub willing_to_relocate: Option<bool>,
    pub skills: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub salary_expectation_min: Option<Decimal>,
    pub salary_expectation_max: Option<Decimal>,
    pub currency: Option<String>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub assigned_recruiter: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub recruiter_id: Option<Uuid>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub struct LinkAssessmentRequest {
    pub instance_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub kind: InterviewKind,
    pub scheduled_at: DateTime<Utc>,
    pub interviewer_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteInterviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub overall_rating: Option<i32>,
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HireRequest {
    pub start_date: NaiveDate,
    pub salary: Decimal,
}

#[derive(Debug, Serialize)]
pub struct FitScore {
    pub fit_score: Option<f64>,
}

// ---------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------

/// POST /api/v1/recruiting/clients
pub async fn create_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateClientRequest>,
) -> Result<Json<ApiResponse<Client>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    payload.validate()?;
    let client = state
        .recruiting
        .create_client(
            &ctx.organization_id,
            &payload.name,
            payload.primary_contact_name,
            payload.primary_contact_email,
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

/// GET /api/v1/recruiting/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Client>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let clients = state
        .recruiting
        .list_clients(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(clients)))
}

/// GET /api/v1/recruiting/clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Client>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let client = state.recruiting.get_client(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(client)))
}

/// PUT /api/v1/recruiting/clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<Json<ApiResponse<Client>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    payload.validate()?;

    let mut client = state.recruiting.get_client(&ctx.organization_id, &id).await?;
    if let Some(name) = payload.name {
        client.name = name;
    }
    if let Some(industry) = payload.industry {
        client.industry = industry;
    }
    if let Some(contact_name) = payload.primary_contact_name {
        client.primary_contact_name = contact_name;
    }
    if let Some(contact_email) = payload.primary_contact_email {
        client.primary_contact_email = contact_email;
    }
    if let Some(contact_phone) = payload.primary_contact_phone {
        client.primary_contact_phone = contact_phone;
    }
    if let Some(website) = payload.website {
        client.website = website;
    }
    if let Some(description) = payload.description {
        client.description = description;
    }
    if let Some(start) = payload.contract_start_date {
        client.contract_start_date = Some(start);
    }
    if let Some(end) = payload.contract_end_date {
        client.contract_end_date = Some(end);
    }
    if let Some(rate) = payload.commission_rate {
        client.commission_rate = rate;
    }
    if let Some(terms) = payload.payment_terms {
        client.payment_terms = terms;
    }
    if let Some(is_active) = payload.is_active {
        client.is_active = is_active;
    }

    let client = state
        .recruiting
        .update_client(&ctx.organization_id, &client)
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

/// DELETE /api/v1/recruiting/clients/{id}
pub async fn delete_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    state
        .recruiting
        .delete_client(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
    )))
}

// ---------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------

/// POST /api/v1/recruiting/jobs
pub async fn create_job(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateJobRequest>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    payload.validate()?;
    let job = state
        .recruiting
        .create_job(
            &ctx.organization_id,
            &payload.client_id,
            &payload.title,
            payload.description.unwrap_or_default(),
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(job)))
}

/// GET /api/v1/recruiting/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Job>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let jobs = state
        .recruiting
        .list_jobs(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(jobs)))
}

/// GET /api/v1/recruiting/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let job = state.recruiting.get_job(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(job)))
}

/// PUT /api/v1/recruiting/jobs/{id}
pub async fn update_job(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    payload.validate()?;

    let mut job = state.recruiting.get_job(&ctx.organization_id, &id).await?;
    if let Some(title) = payload.title {
        job.title = title;
    }
    if let Some(description) = payload.description {
        job.description = description;
    }
    if let Some(requirements) = payload.requirements {
        job.requirements = requirements;
    }
    if let Some(location) = payload.location {
        job.location = location;
    }
    if let Some(remote_allowed) = payload.remote_allowed {
        job.remote_allowed = remote_allowed;
    }
    if let Some(min_years) = payload.min_experience_years {
        job.min_experience_years = min_years;
    }
    if let Some(max_years) = payload.max_experience_years {
        job.max_experience_years = Some(max_years);
    }
    if let Some(required_skills) = payload.required_skills {
        job.required_skills = required_skills;
    }
    if let Some(preferred_skills) = payload.preferred_skills {
        job.preferred_skills = preferred_skills;
    }
    if let Some(salary_min) = payload.salary_min {
        job.salary_min = Some(salary_min);
    }
    if let Some(salary_max) = payload.salary_max {
        job.salary_max = Some(salary_max);
    }
    if let Some(currency) = payload.currency {
        job.currency = currency;
    }
    if let Some(positions) = payload.positions_available {
        job.positions_available = positions;
    }
    if let Some(deadline) = payload.application_deadline {
        job.application_deadline = Some(deadline);
    }
    if let Some(requires_assessment) = payload.requires_assessment {
        job.requires_assessment = requires_assessment;
    }
    if let Some(definition_id) = payload.assessment_definition_id {
        job.assessment_definition_id = Some(definition_id);
    }
    if let Some(recruiter) = payload.assigned_recruiter {
        job.assigned_recruiter = Some(recruiter);
    }

    let job = state
        .recruiting
        .update_job(&ctx.organization_id, &job)
        .await?;
    Ok(Json(ApiResponse::success(job)))
}

/// POST /api/v1/recruiting/jobs/{id}/open
pub async fn open_job(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let job = state.recruiting.open_job(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(job)))
}

// ---------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------

/// POST /api/v1/recruiting/candidates
pub async fn create_candidate(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateCandidateRequest>,
) -> Result<Json<ApiResponse<Candidate>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    payload.validate()?;
    let candidate = state
        .recruiting
        .create_candidate(
            &ctx.organization_id,
            payload.first_name,
            payload.last_name,
            &payload.email,
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(candidate)))
}

/// GET /api/v1/recruiting/candidates
pub async fn list_candidates(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Candidate>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let candidates = state
        .recruiting
        .list_candidates(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(candidates)))
}

/// GET /api/v1/recruiting/candidates/{id}
pub async fn get_candidate(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Candidate>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let candidate = state
        .recruiting
        .get_candidate(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(candidate)))
}

/// PUT /api/v1/recruiting/candidates/{id}
pub async fn update_candidate(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidateRequest>,
) -> Result<Json<ApiResponse<Candidate>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    payload.validate()?;

    let mut candidate = state
        .recruiting
        .get_candidate(&ctx.organization_id, &id)
        .await?;
    if let Some(first_name) = payload.first_name {
        candidate.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        candidate.last_name = last_name;
    }
    if let Some(phone) = payload.phone {
        candidate.phone = phone;
    }
    if let Some(current_title) = payload.current_title {
        candidate.current_title = current_title;
    }
    if let Some(current_company) = payload.current_company {
        candidate.current_company = current_company;
    }
    if let Some(years) = payload.experience_years {
        candidate.experience_years = years;
    }
    if let Some(location) = payload.location {
        candidate.location = location;
    }
    if let Some(relocate) = payload.willing_to_relocate {
        candidate.willing_to_relocate = relocate;
    }
    if let Some(skills) = payload.skills {
        candidate.skills = skills;
    }
    if let Some(languages) = payload.languages {
        candidate.languages = languages;
    }
    if let Some(min) = payload.salary_expectation_min {
        candidate.salary_expectation_min = Some(min);
    }
    if let Some(max) = payload.salary_expectation_max {
        candidate.salary_expectation_max = Some(max);
    }
    if let Some(currency) = payload.currency {
        candidate.currency = currency;
    }
    if let Some(linkedin_url) = payload.linkedin_url {
        candidate.linkedin_url = linkedin_url;
    }
    if let Some(notes) = payload.notes {
        candidate.notes = notes;
    }
    if let Some(source) = payload.source {
        candidate.source = source;
    }
    if let Some(recruiter) = payload.assigned_recruiter {
        candidate.assigned_recruiter = Some(recruiter);
    }

    let candidate = state
        .recruiting
        .update_candidate(&ctx.organization_id, &candidate)
        .await?;
    Ok(Json(ApiResponse::success(candidate)))
}

/// DELETE /api/v1/recruiting/candidates/{id}
pub async fn delete_candidate(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    state
        .recruiting
        .delete_candidate(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
    )))
}

// ---------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------

/// POST /api/v1/recruiting/applications
pub async fn apply(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<ApplyRequest>,
) -> Result<Json<ApiResponse<JobApplication>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let application = state
        .recruiting
        .apply(
            &ctx.organization_id,
            &payload.candidate_id,
            &payload.job_id,
            payload.recruiter_id,
            payload.cover_letter.unwrap_or_default(),
        )
        .await?;
    Ok(Json(ApiResponse::success(application)))
}

/// GET /api/v1/recruiting/jobs/{id}/applications
pub async fn list_applications(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<JobApplication>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let applications = state
        .recruiting
        .list_applications(&ctx.organization_id, &id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(applications)))
}

/// GET /api/v1/recruiting/applications/{id}
pub async fn get_application(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobApplication>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let application = state
        .recruiting
        .get_application(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(application)))
}

/// PUT /api/v1/recruiting/applications/{id}/status
pub async fn change_application_status(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<JobApplication>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let application = state
        .recruiting
        .change_application_status(&ctx.organization_id, &id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(application)))
}

/// POST /api/v1/recruiting/applications/{id}/assessment
pub async fn link_assessment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkAssessmentRequest>,
) -> Result<Json<ApiResponse<JobApplication>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let application = state
        .recruiting
        .link_assessment(&ctx.organization_id, &id, &payload.instance_id)
        .await?;
    Ok(Json(ApiResponse::success(application)))
}

/// POST /api/v1/recruiting/applications/{id}/fit-score
pub async fn refresh_fit_score(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FitScore>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let fit_score = state
        .recruiting
        .refresh_fit_score(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(FitScore { fit_score })))
}

// ---------------------------------------------------------------------
// Interviews
// ---------------------------------------------------------------------

/// POST /api/v1/recruiting/applications/{id}/interviews
pub async fn schedule_interview(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleInterviewRequest>,
) -> Result<Json<ApiResponse<Interview>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let interview = state
        .recruiting
        .schedule_interview(
            &ctx.organization_id,
            &id,
            payload.kind,
            payload.scheduled_at,
            &payload.interviewer_id,
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(interview)))
}

/// GET /api/v1/recruiting/applications/{id}/interviews
pub async fn list_interviews(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Interview>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let interviews = state
        .recruiting
        .list_interviews(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(interviews)))
}

/// POST /api/v1/recruiting/interviews/{id}/complete
pub async fn complete_interview(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteInterviewRequest>,
) -> Result<Json<ApiResponse<Interview>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    payload.validate()?;
    let interview = state
        .recruiting
        .complete_interview(
            &ctx.organization_id,
            &id,
            payload.overall_rating,
            payload.feedback.unwrap_or_default(),
        )
        .await?;
    Ok(Json(ApiResponse::success(interview)))
}

// ---------------------------------------------------------------------
// Placements
// ---------------------------------------------------------------------

/// POST /api/v1/recruiting/applications/{id}/hire
pub async fn hire(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<HireRequest>,
) -> Result<Json<ApiResponse<Placement>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let placement = state
        .recruiting
        .hire(&ctx.organization_id, &id, payload.start_date, payload.salary)
        .await?;
    Ok(Json(ApiResponse::success(placement)))
}

/// GET /api/v1/recruiting/placements
pub async fn list_placements(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Placement>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Recruiter))?;
    let placements = state
        .recruiting
        .list_placements(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(placements)))
}
