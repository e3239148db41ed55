//! Router configuration for the API.

use axum::{Router, middleware};
use tower_http::{compression::CompressionLayer, cors::CorsLayer};

use crate::api::handlers;
use crate::api::middleware::{
    global_error_handler, logging_middleware, rate_limit_middleware, request_id_middleware,
};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. CORS and compression
/// 2. Request ID - generates/propagates request IDs
/// 3. Logging - logs requests with request IDs
/// 4. Error rewriting - JSON bodies for bare error statuses
/// 5. Rate limiting - `/api` routes only, after routing has matched
///
/// # Routes
/// - `/health`, `/health/ready`, `/health/live`
/// - `/api/recipes/{id}/views`
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/recipes", handlers::recipes::recipe_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api", api_routes)
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
