//! # Tala API
//!
//! HTTP surface of the platform: axum handlers, request extractors,
//! tenant/auth/audit middleware, the response envelope and the router.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use response::ApiResponse;
pub use router::build_router;
pub use state::AppState;
