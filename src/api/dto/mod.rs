//! Data Transfer Objects for API responses.
//!
//! - `error` - Error response bodies
//! - `health` - Health check responses
//! - `recipe` - Recipe counter responses

mod error;
mod health;
mod recipe;

pub use error::{ErrorResponse, RateLimitErrorResponse};
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use recipe::RecipeViewsResponse;
