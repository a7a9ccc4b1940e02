//! Report repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{CompletionFunnelRow, DashboardSummary, Report};
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn find_report(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Report>, DomainError>;
    async fn list_reports(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Report>, DomainError>;
    async fn create_report(&self, report: &Report) -> Result<Report, DomainError>;
    async fn update_report(&self, report: &Report) -> Result<Report, DomainError>;

    // Aggregates
    async fn dashboard_summary(
        &self,
        organization_id: &Uuid,
    ) -> Result<DashboardSummary, DomainError>;
    async fn completion_funnel(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<CompletionFunnelRow>, DomainError>;
}
