use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;

use tala_api::{build_router, AppState};
use tala_infrastructure::database::{create_pool, run_migrations};
use tala_shared::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize telemetry
    tala_shared::telemetry::init_telemetry("info,tala_server=debug");

    info!("🚀 Starting Tala Server...");

    // Load configuration
    let config = AppConfig::load()?;
    info!("✅ Configuration loaded");

    // Initialize database pool
    let pool = create_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("✅ Database connection established");

    // Apply pending migrations
    run_migrations(&pool).await?;
    info!("✅ Migrations applied");

    // Server address (config moves into state below)
    let addr = SocketAddr::from((
        config.app.host.parse::<std::net::IpAddr>()?,
        config.app.port,
    ));

    // Wire services and build the router
    let state = AppState::build(config, pool)?;
    let app = build_router(state);

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
