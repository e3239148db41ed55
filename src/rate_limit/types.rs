//! Rate limit value types.

use serde::{Deserialize, Serialize};

/// Outcome of one limiter evaluation.
///
/// `remaining` is never negative: it is `limit - current - 1` on approval
/// and `0` on denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Unix seconds.
    pub reset_time: i64,
}

impl RateLimitResult {
    /// Whole seconds a denied caller should wait, at least one.
    pub fn retry_after(&self, now_secs: i64) -> i64 {
        self.reset_time.saturating_sub(now_secs).max(1)
    }
}

/// How many requests one identifier may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_seconds: u64,
}

impl RateLimitPolicy {
    pub fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_camel_case() {
        let result = RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_time: 1_700_000_060,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["resetTime"], 1_700_000_060);
        assert_eq!(json["allowed"], false);
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let result = RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_time: 100,
        };
        assert_eq!(result.retry_after(40), 60);
        assert_eq!(result.retry_after(100), 1);
        assert_eq!(result.retry_after(130), 1);
    }
}
