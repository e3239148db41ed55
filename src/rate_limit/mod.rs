//! Request rate limiting.
//!
//! [`RateLimiter`] counts requests per identifier in a sliding window kept
//! in the shared key-value store. It favours availability: a store outage
//! admits callers unless the limiter is built with `with_fail_open(false)`.

mod limiter;
mod types;

pub use limiter::RateLimiter;
pub use types::{RateLimitPolicy, RateLimitResult};
