// ============================================================================
// Tala API - PDI Handlers
// File: crates/tala-api/src/handlers/pdi.rs
// ============================================================================
//! Development plans, tasks, progress tracking and plan templates

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{
    Framework, PdiPlan, PdiProgressUpdate, PdiTask, PdiTemplate, PlanPriority, TaskCategory,
    TenantContext, User,
};
use tala_core::error::DomainError;

use crate::error::ApiError;
use crate::extract::{require_role, CurrentUser, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Members without reporting access only reach plans attached to their
/// own employee record.
async fn ensure_plan_access(
    state: &AppState,
    ctx: &TenantContext,
    user: &User,
    plan: &PdiPlan,
) -> Result<(), ApiError> {
    if ctx.require_role(|r| r.can_view_reports()) {
        return Ok(());
    }
    let employee = state
        .workforce
        .get_employee(&ctx.organization_id, &plan.employee_id)
        .await?;
    if employee.user_id != user.id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    pub employee_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub target_completion_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<PlanPriority>,
    pub manager_id: Option<Uuid>,
    pub hr_contact_id: Option<Uuid>,
    pub target_completion_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovePlanRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlanFilter {
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub deadline: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<TaskCategory>,
    pub competency_area: Option<String>,
    pub specific_objective: Option<String>,
    pub measurable_criteria: Option<String>,
    pub achievable_steps: Option<String>,
    pub relevant_justification: Option<String>,
    pub time_bound_deadline: Option<NaiveDate>,
    #[validate(range(min = 0.0))]
    pub weight: Option<f64>,
    pub required_resources: Option<String>,
    pub assigned_mentor: Option<Uuid>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProgressUpdateRequest {
    #[validate(range(min = 0.0, max = 100.0))]
    pub percentage: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub framework: Framework,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub auto_generate: Option<bool>,
    pub requires_approval: Option<bool>,
    #[validate(range(min = 1))]
    pub default_duration_days: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    pub template_id: Uuid,
    pub instance_id: Uuid,
}

// ---------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------

/// POST /api/v1/pdi/plans
pub async fn create_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    payload.validate()?;
    let plan = state
        .pdi
        .create_plan(
            &ctx.organization_id,
            &payload.employee_id,
            &payload.title,
            payload.description.unwrap_or_default(),
            payload.start_date,
            payload.target_completion_date,
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(plan)))
}

/// GET /api/v1/pdi/plans — members only see plans on their own record.
pub async fn list_plans(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<PlanFilter>,
) -> Result<Json<ApiResponse<Vec<PdiPlan>>>, ApiError> {
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
    let plans = state
        .pdi
        .list_plans(&ctx.organization_id, user_id, pagination)
        .await?;
    Ok(Json(ApiResponse::success(plans)))
}

/// GET /api/v1/pdi/plans/{id}
pub async fn get_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    let plan = state.pdi.get_plan(&ctx.organization_id, &id).await?;
    ensure_plan_access(&state, &ctx, &user, &plan).await?;
    Ok(Json(ApiResponse::success(plan)))
}

/// PUT /api/v1/pdi/plans/{id}
pub async fn update_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    payload.validate()?;

    let mut plan = state.pdi.get_plan(&ctx.organization_id, &id).await?;
    if let Some(title) = payload.title {
        plan.title = title;
    }
    if let Some(description) = payload.description {
        plan.description = description;
    }
    if let Some(priority) = payload.priority {
        plan.priority = priority;
    }
    if let Some(manager_id) = payload.manager_id {
        plan.manager_id = Some(manager_id);
    }
    if let Some(hr_contact_id) = payload.hr_contact_id {
        plan.hr_contact_id = Some(hr_contact_id);
    }
    if let Some(target) = payload.target_completion_date {
        plan.target_completion_date = target;
    }
    if let Some(next_review) = payload.next_review_date {
        plan.next_review_date = Some(next_review);
    }

    let plan = state.pdi.update_plan(&plan).await?;
    Ok(Json(ApiResponse::success(plan)))
}

/// POST /api/v1/pdi/plans/{id}/submit
pub async fn submit_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let plan = state
        .pdi
        .submit_for_approval(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(plan)))
}

/// POST /api/v1/pdi/plans/{id}/approve
pub async fn approve_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApprovePlanRequest>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let plan = state
        .pdi
        .approve_plan(
            &ctx.organization_id,
            &id,
            &user.id,
            payload.notes.unwrap_or_default(),
        )
        .await?;
    Ok(Json(ApiResponse::success(plan)))
}

/// POST /api/v1/pdi/plans/{id}/complete
pub async fn complete_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let plan = state.pdi.complete_plan(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(plan)))
}

/// POST /api/v1/pdi/plans/{id}/cancel
pub async fn cancel_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let plan = state.pdi.cancel_plan(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(plan)))
}

// ---------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------

/// POST /api/v1/pdi/plans/{id}/tasks
pub async fn add_task(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddTaskRequest>,
) -> Result<Json<ApiResponse<PdiTask>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    payload.validate()?;
    let task = state
        .pdi
        .add_task(
            &ctx.organization_id,
            &id,
            &payload.title,
            payload.description.unwrap_or_default(),
            payload.category,
            payload.deadline,
        )
        .await?;
    Ok(Json(ApiResponse::success(task)))
}

/// GET /api/v1/pdi/plans/{id}/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PdiTask>>>, ApiError> {
    let plan = state.pdi.get_plan(&ctx.organization_id, &id).await?;
    ensure_plan_access(&state, &ctx, &user, &plan).await?;
    let tasks = state.pdi.list_tasks(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(tasks)))
}

/// PUT /api/v1/pdi/plans/{id}/tasks/{task_id}
pub async fn update_task(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<ApiResponse<PdiTask>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    payload.validate()?;

    let tasks = state.pdi.list_tasks(&ctx.organization_id, &id).await?;
    let mut task = tasks
        .into_iter()
        .find(|t| t.id == task_id)
        .ok_or(DomainError::PdiTaskNotFound)?;
    if let Some(title) = payload.title {
        task.title = title;
    }
    if let Some(description) = payload.description {
        task.description = description;
    }
    if let Some(category) = payload.category {
        task.category = category;
    }
    if let Some(competency_area) = payload.competency_area {
        task.competency_area = competency_area;
    }
    if let Some(objective) = payload.specific_objective {
        task.specific_objective = objective;
    }
    if let Some(criteria) = payload.measurable_criteria {
        task.measurable_criteria = criteria;
    }
    if let Some(steps) = payload.achievable_steps {
        task.achievable_steps = steps;
    }
    if let Some(justification) = payload.relevant_justification {
        task.relevant_justification = justification;
    }
    if let Some(deadline) = payload.time_bound_deadline {
        task.time_bound_deadline = deadline;
    }
    if let Some(weight) = payload.weight {
        task.weight = weight;
    }
    if let Some(resources) = payload.required_resources {
        task.required_resources = resources;
    }
    if let Some(mentor) = payload.assigned_mentor {
        task.assigned_mentor = Some(mentor);
    }
    if let Some(estimated) = payload.estimated_hours {
        task.estimated_hours = estimated;
    }
    if let Some(actual) = payload.actual_hours {
        task.actual_hours = actual;
    }

    let task = state.pdi.update_task(&task).await?;
    Ok(Json(ApiResponse::success(task)))
}

/// POST /api/v1/pdi/plans/{id}/tasks/{task_id}/progress
pub async fn update_task_progress(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ProgressUpdateRequest>,
) -> Result<Json<ApiResponse<TaskProgress>>, ApiError> {
    payload.validate()?;
    let plan = state.pdi.get_plan(&ctx.organization_id, &id).await?;
    ensure_plan_access(&state, &ctx, &user, &plan).await?;
    let (task, plan) = state
        .pdi
        .update_task_progress(
            &ctx.organization_id,
            &id,
            &task_id,
            payload.percentage,
            payload.notes.unwrap_or_default(),
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(TaskProgress { task, plan })))
}

/// Task after a progress update, with the rolled-up plan beside it.
#[derive(Debug, serde::Serialize)]
pub struct TaskProgress {
    pub task: PdiTask,
    pub plan: PdiPlan,
}

/// GET /api/v1/pdi/plans/{id}/tasks/{task_id}/history
pub async fn task_history(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Vec<PdiProgressUpdate>>>, ApiError> {
    let plan = state.pdi.get_plan(&ctx.organization_id, &id).await?;
    ensure_plan_access(&state, &ctx, &user, &plan).await?;
    let history = state
        .pdi
        .task_history(&ctx.organization_id, &id, &task_id)
        .await?;
    Ok(Json(ApiResponse::success(history)))
}

// ---------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------

/// POST /api/v1/pdi/templates
pub async fn create_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<Json<ApiResponse<PdiTemplate>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let template = state
        .pdi
        .create_template(
            &ctx.organization_id,
            &payload.name,
            payload.framework,
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(template)))
}

/// GET /api/v1/pdi/templates
pub async fn list_templates(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<PdiTemplate>>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let templates = state.pdi.list_templates(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(templates)))
}

/// GET /api/v1/pdi/templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PdiTemplate>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let template = state.pdi.get_template(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(template)))
}

/// PUT /api/v1/pdi/templates/{id}
pub async fn update_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> Result<Json<ApiResponse<PdiTemplate>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;

    let mut template = state.pdi.get_template(&ctx.organization_id, &id).await?;
    if let Some(name) = payload.name {
        template.name = name;
    }
    if let Some(description) = payload.description {
        template.description = description;
    }
    if let Some(auto_generate) = payload.auto_generate {
        template.auto_generate = auto_generate;
    }
    if let Some(requires_approval) = payload.requires_approval {
        template.requires_approval = requires_approval;
    }
    if let Some(days) = payload.default_duration_days {
        template.default_duration_days = days;
    }
    if let Some(is_active) = payload.is_active {
        template.is_active = is_active;
    }

    let template = state.pdi.update_template(&template).await?;
    Ok(Json(ApiResponse::success(template)))
}

// ---------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------

/// POST /api/v1/pdi/generate
///
/// Builds a plan from a template and a completed assessment instance.
/// Instances without a stored score profile predate scoring and cannot
/// seed a plan.
pub async fn generate_plan(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<GeneratePlanRequest>,
) -> Result<Json<ApiResponse<PdiPlan>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;

    let results = state
        .assessments
        .results(&ctx.organization_id, &payload.instance_id)
        .await?;
    let profile = results
        .profile
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("instance has no score profile".to_string()))?;
    let organization = state.organizations.get(&ctx.organization_id).await?;

    let plan = state
        .pdi
        .generate_from_assessment(
            &payload.template_id,
            &results.instance,
            &results.definition.name,
            results.definition.framework,
            profile,
            Some(&organization),
        )
        .await?;
    Ok(Json(ApiResponse::success(plan)))
}
