// ============================================================================
// Tala API - Audit Middleware
// File: crates/tala-api/src/middleware/audit.rs
// ============================================================================
//! Records one audit row per authenticated mutating request. Failures to
//! record never fail the request itself.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use tala_core::domain::{AuditLog, TenantContext};

use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn record_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let should_audit = matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
        && !path.starts_with("/health");

    let user_id = request
        .extensions()
        .get::<CurrentUser>()
        .map(|current| current.0.id);
    let organization_id = request
        .extensions()
        .get::<TenantContext>()
        .map(|t| t.organization_id);
    let ip_address = client_ip(request.headers());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;

    if should_audit {
        if let Some(user_id) = user_id {
            let entry = AuditLog::record(
                organization_id,
                user_id,
                method.as_str(),
                &path,
                ip_address,
                user_agent,
                response.status().as_u16(),
            );
            state.audit.record(entry).await;
        }
    }

    response
}

/// First entry of `X-Forwarded-For`; empty when the header is absent.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.2, 10.0.0.3"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_defaults_to_empty() {
        assert_eq!(client_ip(&HeaderMap::new()), "");
    }
}
