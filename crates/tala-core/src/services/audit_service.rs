// ============================================================================
// Tala Core - Audit Service
// File: crates/tala-core/src/services/audit_service.rs
// ============================================================================
//! Append-only audit recording; failures never propagate

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::domain::AuditLog;
use crate::error::DomainError;
use crate::repositories::AuditRepository;
use tala_shared::types::Pagination;

pub struct AuditService<A: AuditRepository> {
    audit_repo: Arc<A>,
}

impl<A: AuditRepository> AuditService<A> {
    pub fn new(audit_repo: Arc<A>) -> Self {
        Self { audit_repo }
    }

    /// Records the entry; a failed insert is logged and swallowed so the
    /// request that triggered it still succeeds.
    pub async fn record(&self, entry: AuditLog) {
        if let Err(e) = self.audit_repo.insert(&entry).await {
            warn!("Audit insert failed for {}: {}", entry.action, e);
        }
    }

    pub async fn list(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<AuditLog>, DomainError> {
        self.audit_repo.list(organization_id, pagination.clamped()).await
    }

    pub async fn recent(
        &self,
        organization_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<AuditLog>, DomainError> {
        self.audit_repo.list_recent(organization_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::audit_repository::MockAuditRepository;

    #[tokio::test]
    async fn test_record_swallows_insert_failure() {
        let mut repo = MockAuditRepository::new();
        repo.expect_insert()
            .returning(|_| Err(DomainError::DatabaseError("down".into())));
        let service = AuditService::new(Arc::new(repo));

        let entry = AuditLog::record(
            None,
            Uuid::new_v4(),
            "DELETE",
            "/api/v1/jobs/1",
            "10.0.0.1".into(),
            String::new(),
            204,
        );
        // Must not panic or surface the error.
        service.record(entry).await;
    }
}
