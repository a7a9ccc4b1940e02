use anyhow::Result;
use tracing::info;

use tala_infrastructure::database::create_pool;
use tala_shared::config::AppConfig;

mod jobs;
mod worker;

use worker::Worker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tala_worker=debug".to_string()),
        )
        .with_target(true)
        .init();

    info!("🚀 Starting Tala Worker...");

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

    // Wire services and run until shutdown
    let worker = Worker::new(config, pool)?;
    worker.run().await
}
