//! Audit repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::AuditLog;
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, entry: &AuditLog) -> Result<(), DomainError>;
    async fn list(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<AuditLog>, DomainError>;
    async fn list_recent(
        &self,
        organization_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<AuditLog>, DomainError>;
}
