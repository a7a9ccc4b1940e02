// ============================================================================
// Tala API - Rate Limiting Middleware
// File: crates/tala-api/src/middleware/rate_limit.rs
// ============================================================================
//! Keyed rate limiter for the auth and webhook route groups, keyed by
//! client address.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

use crate::error::ApiError;
use crate::middleware::audit::client_ip;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<KeyedLimiter>,
}

impl RateLimit {
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests.max(1)).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    pub fn check(&self, key: &String) -> bool {
        self.limiter.check_key(key).is_ok()
    }
}

pub async fn enforce(
    State(rate): State<RateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(request.headers());
    if !rate.check(&key) {
        return Err(ApiError::TooManyRequests);
    }
    Ok(next.run(request).await)
}

fn client_key(headers: &HeaderMap) -> String {
    let ip = client_ip(headers);
    if ip.is_empty() {
        "unknown".to_string()
    } else {
        ip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_trips_after_quota() {
        let rate = RateLimit::per_minute(2);
        let key = "203.0.113.9".to_string();
        assert!(rate.check(&key));
        assert!(rate.check(&key));
        assert!(!rate.check(&key));
        // Other keys are unaffected.
        assert!(rate.check(&"203.0.113.10".to_string()));
    }
}
