// ============================================================================
// Tala API - Workforce Handlers
// File: crates/tala-api/src/handlers/workforce.rs
// ============================================================================
//! Departments, positions and employee records

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{Department, Employee, EmploymentType, MemberRole, Position};

use crate::error::ApiError;
use crate::extract::{require_role, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignManagerRequest {
    pub manager_user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePositionRequest {
    pub department_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub level: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePositionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub level: Option<i32>,
    pub reports_to: Option<Uuid>,
    pub required_skills: Option<Vec<String>>,
    pub preferred_skills: Option<Vec<String>>,
    pub min_experience_years: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub position_id: Uuid,
    pub hire_date: NaiveDate,
    pub employment_type: EmploymentType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRequest {
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub employment_type: Option<EmploymentType>,
    pub salary: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TerminateEmployeeRequest {
    pub termination_date: NaiveDate,
}

// ---------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------

/// POST /api/v1/workforce/departments
pub async fn create_department(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<Json<ApiResponse<Department>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let department = state
        .workforce
        .create_department(
            &ctx.organization_id,
            &payload.name,
            payload.description.unwrap_or_default(),
            payload.parent_id,
        )
        .await?;
    Ok(Json(ApiResponse::success(department)))
}

/// GET /api/v1/workforce/departments
pub async fn list_departments(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<Department>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let departments = state.workforce.list_departments(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(departments)))
}

/// GET /api/v1/workforce/departments/{id}
pub async fn get_department(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Department>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let department = state
        .workforce
        .get_department(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(department)))
}

/// PUT /api/v1/workforce/departments/{id}
pub async fn update_department(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDepartmentRequest>,
) -> Result<Json<ApiResponse<Department>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;

    let mut department = state
        .workforce
        .get_department(&ctx.organization_id, &id)
        .await?;
    if let Some(name) = payload.name {
        department.name = name;
    }
    if let Some(description) = payload.description {
        department.description = description;
    }
    if let Some(parent_id) = payload.parent_id {
        department.parent_id = Some(parent_id);
    }
    if let Some(is_active) = payload.is_active {
        department.is_active = is_active;
    }

    let department = state.workforce.update_department(&department).await?;
    Ok(Json(ApiResponse::success(department)))
}

/// PUT /api/v1/workforce/departments/{id}/manager
pub async fn assign_department_manager(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignManagerRequest>,
) -> Result<Json<ApiResponse<Department>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let department = state
        .workforce
        .assign_department_manager(&ctx.organization_id, &id, &payload.manager_user_id)
        .await?;
    Ok(Json(ApiResponse::success(department)))
}

// ---------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------

/// POST /api/v1/workforce/positions
pub async fn create_position(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<CreatePositionRequest>,
) -> Result<Json<ApiResponse<Position>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let position = state
        .workforce
        .create_position(
            &ctx.organization_id,
            &payload.department_id,
            &payload.title,
            payload.description.unwrap_or_default(),
            payload.level,
        )
        .await?;
    Ok(Json(ApiResponse::success(position)))
}

/// GET /api/v1/workforce/positions
pub async fn list_positions(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<Position>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let positions = state.workforce.list_positions(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(positions)))
}

/// GET /api/v1/workforce/positions/{id}
pub async fn get_position(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Position>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let position = state
        .workforce
        .get_position(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(position)))
}

/// PUT /api/v1/workforce/positions/{id}
pub async fn update_position(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePositionRequest>,
) -> Result<Json<ApiResponse<Position>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;

    let mut position = state
        .workforce
        .get_position(&ctx.organization_id, &id)
        .await?;
    if let Some(title) = payload.title {
        position.title = title;
    }
    if let Some(description) = payload.description {
        position.description = description;
    }
    if let Some(level) = payload.level {
        position.level = level;
    }
    if let Some(reports_to) = payload.reports_to {
        position.reports_to = Some(reports_to);
    }
    if let Some(required_skills) = payload.required_skills {
        position.required_skills = required_skills;
    }
    if let Some(preferred_skills) = payload.preferred_skills {
        position.preferred_skills = preferred_skills;
    }
    if let Some(years) = payload.min_experience_years {
        position.min_experience_years = years;
    }
    if let Some(is_active) = payload.is_active {
        position.is_active = is_active;
    }

    let position = state.workforce.update_position(&position).await?;
    Ok(Json(ApiResponse::success(position)))
}

// ---------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------

/// POST /api/v1/workforce/employees
pub async fn create_employee(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<CreateEmployeeRequest>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let employee = state
        .workforce
        .create_employee(
            &ctx.organization_id,
            &payload.user_id,
            &payload.department_id,
            &payload.position_id,
            payload.hire_date,
            payload.employment_type,
        )
        .await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// GET /api/v1/workforce/employees — salary data, so HR-gated.
pub async fn list_employees(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Employee>>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let employees = state
        .workforce
        .list_employees(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(employees)))
}

/// GET /api/v1/workforce/employees/{id}
pub async fn get_employee(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let employee = state
        .workforce
        .get_employee(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// PUT /api/v1/workforce/employees/{id}
pub async fn update_employee(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;

    let mut employee = state
        .workforce
        .get_employee(&ctx.organization_id, &id)
        .await?;
    if let Some(department_id) = payload.department_id {
        state
            .workforce
            .get_department(&ctx.organization_id, &department_id)
            .await?;
        employee.department_id = department_id;
    }
    if let Some(position_id) = payload.position_id {
        state
            .workforce
            .get_position(&ctx.organization_id, &position_id)
            .await?;
        employee.position_id = position_id;
    }
    if let Some(manager_id) = payload.manager_id {
        employee.manager_id = Some(manager_id);
    }
    if let Some(employment_type) = payload.employment_type {
        employee.employment_type = employment_type;
    }
    if let Some(salary) = payload.salary {
        employee.salary = salary;
    }
    if let Some(currency) = payload.currency {
        employee.currency = currency;
    }

    let employee = state.workforce.update_employee(&employee).await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// POST /api/v1/workforce/employees/{id}/terminate
pub async fn terminate_employee(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<TerminateEmployeeRequest>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let employee = state
        .workforce
        .terminate_employee(&ctx.organization_id, &id, payload.termination_date)
        .await?;
    Ok(Json(ApiResponse::success(employee)))
}
