//! Application-wide constants

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Header consulted when the host does not carry a tenant subdomain.
pub const TENANT_HEADER: &str = "x-tenant";
/// Path prefix form of tenant addressing, `/t/<slug>/...`.
pub const TENANT_PATH_PREFIX: &str = "/t/";
pub const SLUG_MAX_LENGTH: usize = 50;

pub const INVITE_EXPIRY_DAYS: i64 = 7;
pub const RESET_TOKEN_EXPIRY_HOURS: i64 = 24;
pub const ACCESS_TOKEN_LENGTH: usize = 43;

/// Questions without a dimension are grouped under this bucket when scoring.
pub const GENERAL_DIMENSION: &str = "general";
/// Likert answers are normalized against a seven-point ceiling.
pub const PERCENTILE_SCALE: f64 = 7.0;

pub const INVOICE_PREFIX: &str = "INV";
pub const MAX_EMAIL_ATTEMPTS: i32 = 3;
pub const MAX_WEBHOOK_ATTEMPTS: i32 = 3;
/// Usage alerts fire when a meter crosses this share of its limit.
pub const USAGE_ALERT_THRESHOLD: f64 = 80.0;
