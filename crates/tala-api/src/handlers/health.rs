// ============================================================================
// Tala API - Health Handlers
// File: crates/tala-api/src/handlers/health.rs
// ============================================================================
//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness - GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness - GET /health/ready. Ready only when the database answers.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            error!("Readiness probe failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
