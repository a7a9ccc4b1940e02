// ============================================================================
// Tala Infrastructure - PostgreSQL Report Repository
// File: crates/tala-infrastructure/src/database/postgres/report_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{
    CompletionFunnelRow, DashboardSummary, Report, ReportFormat, ReportStatus, ReportType,
};
use tala_core::error::DomainError;
use tala_core::repositories::ReportRepository;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct ReportRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: String,
    pub report_type: String,
    pub format: String,
    pub status: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub filters: Value,
    pub content: String,
    pub data: Value,
    pub expires_at: Option<DateTime<Utc>>,
    pub generated_by: Option<Uuid>,
    pub generation_started_at: DateTime<Utc>,
    pub generation_completed_at: Option<DateTime<Utc>>,
    pub generation_error: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            id: row.id,
            organization_id: row.organization_id,
            title: row.title,
            description: row.description,
            report_type: ReportType::from_str(&row.report_type).unwrap_or(ReportType::Custom),
            format: ReportFormat::from_str(&row.format).unwrap_or(ReportFormat::Json),
            status: ReportStatus::from_str(&row.status).unwrap_or(ReportStatus::Generating),
            date_from: row.date_from,
            date_to: row.date_to,
            filters: row.filters,
            content: row.content,
            data: row.data,
            expires_at: row.expires_at,
            generated_by: row.generated_by,
            generation_started_at: row.generation_started_at,
            generation_completed_at: row.generation_completed_at,
            generation_error: row.generation_error,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    pub total_members: i64,
    pub total_assessments: i64,
    pub completed_assessments: i64,
    pub total_pdi_plans: i64,
    pub active_pdi_plans: i64,
    pub open_jobs: i64,
}

#[derive(Debug, FromRow)]
struct FunnelRow {
    pub assessment_id: Uuid,
    pub assessment_name: String,
    pub invited: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub expired: i64,
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn find_report(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Report>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<ReportRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, title, description, report_type, format,
                status, date_from, date_to, filters, content, data, expires_at,
                generated_by, generation_started_at, generation_completed_at,
                generation_error, created_at, modified_at
            FROM reports
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding report: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_reports(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Report>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<ReportRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, title, description, report_type, format,
                status, date_from, date_to, filters, content, data, expires_at,
                generated_by, generation_started_at, generation_completed_at,
                generation_error, created_at, modified_at
            FROM reports
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing reports: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_report(&self, report: &Report) -> Result<Report, DomainError> {
        info!(
            "Creating {} report for organization {}",
            report.report_type.as_str(),
            report.organization_id
        );

        let mut tx = tenant_tx(&self.pool, &report.organization_id).await?;
        let row: ReportRow = sqlx::query_as(
            r#"
            INSERT INTO reports (
                id, organization_id, title, description, report_type, format,
                status, date_from, date_to, filters, content, data, expires_at,
                generated_by, generation_started_at, generation_completed_at,
                generation_error, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19)
            RETURNING
                id, organization_id, title, description, report_type, format,
                status, date_from, date_to, filters, content, data, expires_at,
                generated_by, generation_started_at, generation_completed_at,
                generation_error, created_at, modified_at
            "#,
        )
        .bind(report.id)
        .bind(report.organization_id)
        .bind(&report.title)
        .bind(&report.description)
        .bind(report.report_type.as_str())
        .bind(report.format.as_str())
        .bind(report.status.as_str())
        .bind(report.date_from)
        .bind(report.date_to)
        .bind(&report.filters)
        .bind(&report.content)
        .bind(&report.data)
        .bind(report.expires_at)
        .bind(report.generated_by)
        .bind(report.generation_started_at)
        .bind(report.generation_completed_at)
        .bind(&report.generation_error)
        .bind(report.created_at)
        .bind(report.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating report: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn update_report(&self, report: &Report) -> Result<Report, DomainError> {
        let mut tx = tenant_tx(&self.pool, &report.organization_id).await?;
        let row: ReportRow = sqlx::query_as(
            r#"
            UPDATE reports SET
                status = $2,
                content = $3,
                data = $4,
                expires_at = $5,
                generation_completed_at = $6,
                generation_error = $7,
                modified_at = $8
            WHERE id = $1
            RETURNING
                id, organization_id, title, description, report_type, format,
                status, date_from, date_to, filters, content, data, expires_at,
                generated_by, generation_started_at, generation_completed_at,
                generation_error, created_at, modified_at
            "#,
        )
        .bind(report.id)
        .bind(report.status.as_str())
        .bind(&report.content)
        .bind(&report.data)
        .bind(report.expires_at)
        .bind(report.generation_completed_at)
        .bind(&report.generation_error)
        .bind(report.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating report: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn dashboard_summary(
        &self,
        organization_id: &Uuid,
    ) -> Result<DashboardSummary, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: SummaryRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM memberships
                 WHERE organization_id = $1 AND is_active) AS total_members,
                (SELECT COUNT(*) FROM assessment_instances
                 WHERE organization_id = $1) AS total_assessments,
                (SELECT COUNT(*) FROM assessment_instances
                 WHERE organization_id = $1 AND status = 'COMPLETED') AS completed_assessments,
                (SELECT COUNT(*) FROM pdi_plans
                 WHERE organization_id = $1 AND removed_at IS NULL) AS total_pdi_plans,
                (SELECT COUNT(*) FROM pdi_plans
                 WHERE organization_id = $1 AND removed_at IS NULL
                   AND status IN ('APPROVED', 'IN_PROGRESS')) AS active_pdi_plans,
                (SELECT COUNT(*) FROM jobs
                 WHERE organization_id = $1 AND removed_at IS NULL
                   AND status = 'OPEN') AS open_jobs
            "#,
        )
        .bind(organization_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error computing dashboard summary: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(DashboardSummary {
            total_members: row.total_members,
            total_assessments: row.total_assessments,
            completed_assessments: row.completed_assessments,
            assessment_completion_rate: DashboardSummary::completion_rate(
                row.completed_assessments,
                row.total_assessments,
            ),
            total_pdi_plans: row.total_pdi_plans,
            active_pdi_plans: row.active_pdi_plans,
            open_jobs: row.open_jobs,
        })
    }

    async fn completion_funnel(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<CompletionFunnelRow>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        // COUNT(i.id) so definitions without instances report zero.
        let rows: Vec<FunnelRow> = sqlx::query_as(
            r#"
            SELECT
                d.id AS assessment_id,
                d.name AS assessment_name,
                COUNT(i.id) AS invited,
                COUNT(i.id) FILTER (WHERE i.status IN ('STARTED', 'IN_PROGRESS')) AS in_progress,
                COUNT(i.id) FILTER (WHERE i.status = 'COMPLETED') AS completed,
                COUNT(i.id) FILTER (WHERE i.status = 'EXPIRED') AS expired
            FROM assessment_definitions d
            LEFT JOIN assessment_instances i ON i.assessment_id = d.id
            WHERE d.organization_id = $1 AND d.removed_at IS NULL
            GROUP BY d.id, d.name
            ORDER BY d.name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error computing completion funnel: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows
            .into_iter()
            .map(|r| CompletionFunnelRow {
                assessment_id: r.assessment_id,
                assessment_name: r.assessment_name,
                invited: r.invited,
                in_progress: r.in_progress,
                completed: r.completed,
                expired: r.expired,
                completion_rate: DashboardSummary::completion_rate(r.completed, r.invited),
            })
            .collect())
    }
}
