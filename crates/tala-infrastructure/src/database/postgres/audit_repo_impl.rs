// ============================================================================
// Tala Infrastructure - PostgreSQL Audit Repository
// File: crates/tala-infrastructure/src/database/postgres/audit_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

use tala_core::domain::AuditLog;
use tala_core::error::DomainError;
use tala_core::repositories::AuditRepository;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct AuditRow {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub user_id: Uuid,
    pub action: String,
    pub ip_address: String,
    pub user_agent: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditLog {
    fn from(row: AuditRow) -> Self {
        AuditLog {
            id: row.id,
            organization_id: row.organization_id,
            user_id: row.user_id,
            action: row.action,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn insert(&self, entry: &AuditLog) -> Result<(), DomainError> {
        // The column is INET; an unparseable address is stored as NULL
        // rather than failing the request that is being audited.
        let ip: Option<String> = entry
            .ip_address
            .parse::<std::net::IpAddr>()
            .ok()
            .map(|addr| addr.to_string());

        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, organization_id, user_id, action, ip_address, user_agent,
                metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5::inet, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.organization_id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(ip)
        .bind(&entry.user_agent)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error inserting audit log: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    async fn list(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<AuditLog>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, user_id, action,
                COALESCE(host(ip_address), '') AS ip_address, user_agent,
                metadata, created_at
            FROM audit_logs
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
            error!("Database error listing audit logs: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_recent(
        &self,
        organization_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<AuditLog>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, user_id, action,
                COALESCE(host(ip_address), '') AS ip_address, user_agent,
                metadata, created_at
            FROM audit_logs
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing recent audit logs: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
