// ============================================================================
// Tala API - Audit Handlers
// File: crates/tala-api/src/handlers/audit.rs
// ============================================================================

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use tala_core::domain::AuditLog;

use crate::error::ApiError;
use crate::extract::{require_role, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/audit
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<AuditLog>>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let logs = state
        .audit
        .list(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(logs)))
}

/// GET /api/v1/audit/recent
pub async fn recent_audit_logs(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ApiResponse<Vec<AuditLog>>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let logs = state.audit.recent(&ctx.organization_id, limit).await?;
    Ok(Json(ApiResponse::success(logs)))
}
