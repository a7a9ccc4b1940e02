//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub security: SecuritySettings,
    pub email: EmailSettings,
    pub billing: BillingSettings,
    pub tenancy: TenancySettings,
    pub worker: WorkerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Public base URL used to build links in outbound emails.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecuritySettings {
    /// Base64-encoded 32-byte key for PII field encryption. Empty disables
    /// encryption and fields are stored as plaintext.
    pub field_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BillingSettings {
    pub stripe_webhook_secret: String,
    pub paypal_webhook_id: String,
    /// Maximum age in seconds accepted for a signed webhook timestamp.
    pub signature_tolerance: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TenancySettings {
    /// Leftmost DNS label of the shared (non-tenant) host, e.g. `app`.
    pub base_label: String,
    pub slug_cache_ttl: u64,
    pub slug_negative_cache_ttl: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerSettings {
    pub mailer_poll_interval: u64,
    pub webhook_poll_interval: u64,
    pub renewal_interval: u64,
    pub alerts_interval: u64,
    pub cleanup_interval: u64,
    pub batch_size: i64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "tala-server")?
            .set_default("app.public_url", "http://localhost:8080")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("jwt.access_token_expiry", 900)?
            .set_default("jwt.refresh_token_expiry", 604_800)?
            .set_default("security.field_key", "")?
            .set_default("billing.stripe_webhook_secret", "")?
            .set_default("billing.paypal_webhook_id", "")?
            .set_default("billing.signature_tolerance", 300)?
            .set_default("tenancy.base_label", "app")?
            .set_default("tenancy.slug_cache_ttl", 300)?
            .set_default("tenancy.slug_negative_cache_ttl", 60)?
            .set_default("worker.mailer_poll_interval", 10)?
            .set_default("worker.webhook_poll_interval", 15)?
            .set_default("worker.renewal_interval", 3600)?
            .set_default("worker.alerts_interval", 86_400)?
            .set_default("worker.cleanup_interval", 3600)?
            .set_default("worker.batch_size", 50)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }
}
