//! Conversion of `AppError` into HTTP responses.

use axum::{
    Json,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::RequestId;
use super::rate_limit::apply_rate_limit_headers;
use crate::api::dto::{ErrorResponse, RateLimitErrorResponse};
use crate::error::AppError;

impl IntoResponse for AppError {
    /// # Status Code Mapping
    /// - RateLimited → 429 TOO_MANY_REQUESTS
    /// - Validation → 400 BAD_REQUEST
    /// - ServiceUnavailable → 503 SERVICE_UNAVAILABLE
    /// - Configuration, Internal → 500 INTERNAL_SERVER_ERROR
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::RateLimited {
                limit,
                remaining,
                reset_time,
                retry_after,
            } => return rate_limited_response(*limit, *remaining, *reset_time, *retry_after),
            AppError::Validation { field, reason } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::validation_error(field, reason),
            ),
            AppError::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("SERVICE_UNAVAILABLE", message),
            ),
            AppError::Configuration { key, source } => {
                tracing::error!(key = %key, error = %source, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("CONFIGURATION_ERROR", "Service is misconfigured"),
                )
            }
            AppError::Internal { source } => {
                tracing::error!(error = %source, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

fn rate_limited_response(limit: u32, remaining: u32, reset_time: i64, retry_after: i64) -> Response {
    let body = RateLimitErrorResponse::new(reset_time, retry_after);
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    apply_rate_limit_headers(headers, limit, remaining, reset_time);
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after.max(1)));
    response
}

/// Rewrites plain-text error responses (unmatched routes, wrong methods)
/// into the JSON [`ErrorResponse`] shape, tagged with the request id.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().cloned();
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if is_json {
        return response;
    }

    let (code, message) = match status {
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => (
            "METHOD_NOT_ALLOWED",
            "HTTP method not allowed for this endpoint",
        ),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "The request took too long"),
        s if s.is_client_error() => ("BAD_REQUEST", "Bad request - invalid or malformed request"),
        _ => ("INTERNAL_ERROR", "An internal error occurred"),
    };

    let mut error_response = ErrorResponse::new(code, message);
    if let Some(RequestId(id)) = request_id {
        error_response = error_response.with_request_id(&id);
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);
    (parts, Json(error_response)).into_response()
}
