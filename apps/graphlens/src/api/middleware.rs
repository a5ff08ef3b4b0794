//! # Middleware Module
//!
//! Request metering for the GraphLens HTTP API.
//!
//! A search costs two store round-trips (the primary query and its paired
//! table query); drill-down, property and chart requests cost one. The limiter
//! therefore bounds the query load the server can put on the graph store.
//! Liveness probes never reach the store and are not metered.
//!
//! ## Configuration
//!
//! - `GRAPHLENS_RATE_LIMIT`: requests per second across all clients
//!   (default: 100, 0 disables)

use super::error::ApiError;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default ceiling in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Paths served without touching the store.
const UNMETERED_PATHS: [&str; 1] = ["/health"];

/// One limiter shared by every client of the process.
pub type StoreLoadLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Limiter admitting `requests_per_second`, with an equal burst. Zero means the default.
pub fn create_rate_limiter(requests_per_second: u32) -> StoreLoadLimiter {
    let rps = NonZeroU32::new(requests_per_second)
        .or(NonZeroU32::new(DEFAULT_RATE_LIMIT))
        .unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// `GRAPHLENS_RATE_LIMIT`, or the default when unset or unparsable.
pub fn get_rate_limit_from_env() -> u32 {
    let raw = std::env::var("GRAPHLENS_RATE_LIMIT").ok();
    match raw.as_deref().map(str::trim).map(str::parse::<u32>) {
        Some(Ok(limit)) => limit,
        Some(Err(_)) => {
            tracing::warn!("Ignoring invalid GRAPHLENS_RATE_LIMIT, using {}", DEFAULT_RATE_LIMIT);
            DEFAULT_RATE_LIMIT
        }
        None => DEFAULT_RATE_LIMIT,
    }
}

/// 429 once the limiter is exhausted. Liveness probes pass through.
pub async fn rate_limit_middleware(
    State(limiter): State<StoreLoadLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if UNMETERED_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }
    if limiter.check().is_err() {
        tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
        return Err(ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"));
    }
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================
