//! Middleware components for request processing.

mod error_handler;
mod logging;
mod rate_limit;
mod request_id;

pub use error_handler::global_error_handler;
pub use logging::logging_middleware;
pub use rate_limit::{ANONYMOUS_IDENTIFIER, apply_rate_limit_headers, client_identifier, rate_limit_middleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
