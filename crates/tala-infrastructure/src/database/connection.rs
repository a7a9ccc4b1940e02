//! Database connection pool and tenant transaction scoping

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::error;
use uuid::Uuid;

use tala_core::error::DomainError;

pub async fn create_pool(
    url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(url)
        .await
}

/// Applies pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Begins a transaction pinned to one tenant.
///
/// The transaction-local `app.current_tenant` setting drives the row-level
/// security policies, so every statement issued on the returned transaction
/// only sees (and can only write) that organization's rows. Statements run
/// directly on the pool carry no tenant setting and pass the policies'
/// fallback arm; repositories reserve that for lookups that happen before a
/// tenant is known and for cross-tenant sweeps.
pub async fn tenant_tx(
    pool: &PgPool,
    organization_id: &Uuid,
) -> Result<Transaction<'static, Postgres>, DomainError> {
    let mut tx = pool.begin().await.map_err(|e| {
        error!("Database error starting tenant transaction: {}", e);
        DomainError::DatabaseError(e.to_string())
    })?;

    sqlx::query("SELECT set_config('app.current_tenant', $1, true)")
        .bind(organization_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error scoping tenant transaction: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

    Ok(tx)
}

pub(crate) async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DomainError> {
    tx.commit().await.map_err(|e| {
        error!("Database error committing transaction: {}", e);
        DomainError::DatabaseError(e.to_string())
    })
}
