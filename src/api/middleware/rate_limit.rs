//! Rate-limit adapter between HTTP and [`RateLimiter`](crate::rate_limit::RateLimiter).
//!
//! Denials become [`AppError::RateLimited`]; admitted responses carry the
//! advisory `X-RateLimit-*` headers.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::clock::Clock;

pub const ANONYMOUS_IDENTIFIER: &str = "anonymous";

pub(crate) const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub(crate) const X_RATELIMIT_REMAINING: HeaderName =
    HeaderName::from_static("x-ratelimit-remaining");
pub(crate) const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Caller identity: first `X-Forwarded-For` hop, then `X-Real-IP`, then
/// [`ANONYMOUS_IDENTIFIER`].
pub fn client_identifier(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for")
        && let Some(first) = forwarded.split(',').map(str::trim).find(|v| !v.is_empty())
    {
        return first.to_string();
    }

    header("x-real-ip")
        .map(String::from)
        .unwrap_or_else(|| ANONYMOUS_IDENTIFIER.to_string())
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_time: i64) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_time));
}

/// # Example
/// ```ignore
/// Router::new()
///     .nest("/recipes", recipe_routes())
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
/// ```
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.rate_limit.enabled {
        return Ok(next.run(request).await);
    }

    let identifier = client_identifier(request.headers());
    let policy = state.rate_limit.policy();
    let result = state
        .limiter
        .check(&identifier, policy.limit, policy.window_seconds)
        .await;

    if !result.allowed {
        let now_secs = state.limiter.clock().now_millis().div_euclid(1000);
        return Err(AppError::rate_limited(policy.limit, &result, now_secs));
    }

    let mut response = next.run(request).await;
    apply_rate_limit_headers(
        response.headers_mut(),
        policy.limit,
        result.remaining,
        result.reset_time,
    );
    Ok(response)
}
