//! Rate limiting middleware.
//!
//! Login attempts are rate limited per client address using the
//! governor crate, to slow down credential stuffing.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;

/// Keyed rate limiter state, one bucket per client address
pub type RateLimiterState = Arc<DefaultKeyedRateLimiter<String>>;

/// Create a rate limiter allowing `requests_per_minute` per client
pub fn create_rate_limiter(requests_per_minute: u32) -> RateLimiterState {
    let quota = Quota::per_minute(
        NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::new(10).unwrap()),
    );
    Arc::new(RateLimiter::keyed(quota))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    match limiter.check_key(&key) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!("Rate limit exceeded for {}: {}", key, request.uri());
            (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(json!({ "detail": "Request was throttled." })),
            )
                .into_response()
        }
    }
}

/// Identify the client by the first forwarded address, falling back to
/// a shared bucket for direct connections.
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}
