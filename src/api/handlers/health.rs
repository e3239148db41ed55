//! Health check endpoint handlers.
//!
//! The cache check performs a real write/read/delete round trip against the
//! configured store, so `/health` reflects whether the backend is reachable.

use std::collections::HashMap;
use std::time::Instant;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};

use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Component health report
/// - `GET /health/ready` - Readiness probe
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/live", get(liveness_check))
}

/// Returns 200 with the report when every component is healthy, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache = check_cache(&state).await;
    let status = cache.status;

    let mut checks = HashMap::new();
    checks.insert("cache".to_string(), cache);

    let response = HealthResponse {
        status,
        version: crate::pkg_version().to_string(),
        timestamp: jiff::Timestamp::now().to_string(),
        checks,
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(response))
}

pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match check_cache(&state).await.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// If we can respond, we're alive.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

async fn check_cache(state: &AppState) -> ComponentHealth {
    let start_time = Instant::now();
    let health = state.services.cache.health_check().await;
    let response_time_ms = Some(start_time.elapsed().as_millis() as u64);

    if !health.ok {
        tracing::warn!(message = %health.message, "Cache health check failed");
    }

    ComponentHealth {
        status: if health.ok {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        message: Some(health.message),
        response_time_ms,
    }
}
