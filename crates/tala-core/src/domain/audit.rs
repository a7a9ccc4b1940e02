// ============================================================================
// Tala Core - Audit Entities
// File: crates/tala-core/src/domain/audit.rs
// Description: Append-only audit trail of authenticated mutating requests
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One audited request. `action` is `"METHOD /path"`; metadata carries the
/// response status. Organization is absent for pre-tenant routes such as
/// signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub user_id: Uuid,
    pub action: String,
    pub ip_address: String,
    pub user_agent: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn record(
        organization_id: Option<Uuid>,
        user_id: Uuid,
        method: &str,
        path: &str,
        ip_address: String,
        user_agent: String,
        status_code: u16,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            action: format!("{method} {path}"),
            ip_address,
            user_agent,
            metadata: serde_json::json!({ "status_code": status_code }),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_formats_action() {
        let entry = AuditLog::record(
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            "POST",
            "/api/v1/assessments",
            "10.0.0.9".into(),
            "curl/8.0".into(),
            201,
        );
        assert_eq!(entry.action, "POST /api/v1/assessments");
        assert_eq!(entry.metadata["status_code"], 201);
    }
}
