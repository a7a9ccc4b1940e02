// ============================================================================
// Tala API - Report Handlers
// File: crates/tala-api/src/handlers/reports.rs
// ============================================================================
//! Dashboard aggregates and generated report records

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{
    CompletionFunnelRow, DashboardSummary, Report, ReportFormat, ReportType,
};

use crate::error::ApiError;
use crate::extract::{require_role, CurrentUser, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateReportRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub report_type: ReportType,
    pub format: ReportFormat,
}

/// GET /api/v1/reports/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let summary = state.reports.dashboard(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// GET /api/v1/reports/completion-funnel
pub async fn completion_funnel(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<CompletionFunnelRow>>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let rows = state.reports.completion_funnel(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /api/v1/reports
pub async fn list_reports(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Report>>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let reports = state
        .reports
        .list_reports(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(reports)))
}

/// GET /api/v1/reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Report>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    let report = state.reports.get_report(&ctx.organization_id, &id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// POST /api/v1/reports/generate
pub async fn generate_report(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<GenerateReportRequest>,
) -> Result<Json<ApiResponse<Report>>, ApiError> {
    require_role(&ctx, |r| r.can_view_reports())?;
    payload.validate()?;
    let report = state
        .reports
        .generate(
            &ctx.organization_id,
            &payload.title,
            payload.report_type,
            payload.format,
            Some(user.id),
        )
        .await?;
    Ok(Json(ApiResponse::success(report)))
}
