//! Request middleware: authentication, tenant resolution, audit trail
//! and rate limiting

pub mod audit;
pub mod auth;
pub mod rate_limit;
pub mod tenant;
