//! Telemetry setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `default_directives` applies when
/// `RUST_LOG` is not set, e.g. `"info,tala_server=debug"`.
pub fn init_telemetry(default_directives: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).json())
        .init();
}
