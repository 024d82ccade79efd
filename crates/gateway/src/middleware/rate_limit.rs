//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use flightgraph_common::errors::AppError;
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Shared limiter plus the configured rate reported in rejections
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<GlobalRateLimiter>,
    requests_per_second: u32,
}

impl RateLimit {
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

/// Create a new rate limiter. Zero rates are clamped to one.
pub fn create_rate_limiter(requests_per_second: u32, burst: u32) -> RateLimit {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(rate);
    let quota = Quota::per_second(rate).allow_burst(burst);

    RateLimit {
        limiter: Arc::new(RateLimiter::direct(quota)),
        requests_per_second: rate.get(),
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limit): State<RateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if limit.check() {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
    Err(AppError::RateLimited { limit: limit.requests_per_second })
}
