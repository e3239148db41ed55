//! Sliding-window rate limiter over a sorted set.
//!
//! Each `(identifier, window)` pair owns one sorted set whose members are
//! request hits scored by their arrival time in milliseconds. An evaluation
//! prunes hits older than the window, counts what is left and, if there is
//! room, records a new hit.
//!
//! The prune/count/record steps are separate store round trips, not one
//! transaction. Concurrent evaluations for the same identifier can all read
//! the same count and all be admitted, so a burst may exceed `limit` within
//! a window. The limiter is advisory; exact enforcement would need the steps
//! folded into one server-side script.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheError, CacheKey, KeyValueStore};
use crate::rate_limit::RateLimitResult;
use crate::utils::clock::SharedClock;

/// Sliding-window request counter shared by every caller of the process.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: SharedClock,
    fail_open: bool,
}

impl RateLimiter {
    /// Create a limiter that admits callers when the store is unreachable.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            fail_open: true,
        }
    }

    /// Choose what happens when the store fails: admit (`true`) or deny.
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    pub fn fail_open(&self) -> bool {
        self.fail_open
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Evaluate one request for `identifier` against `limit` hits per
    /// `window_seconds`.
    ///
    /// Never fails: store errors produce the fail-open (or fail-closed)
    /// verdict.
    pub async fn check(&self, identifier: &str, limit: u32, window_seconds: u64) -> RateLimitResult {
        let now = self.clock.now_millis();
        match self.evaluate(identifier, limit, window_seconds, now).await {
            Ok(result) => {
                if result.allowed {
                    debug!(identifier = %identifier, remaining = result.remaining, "Request admitted");
                } else {
                    info!(identifier = %identifier, limit, window_seconds, "Rate limit exceeded");
                }
                result
            }
            Err(e) => {
                warn!(
                    identifier = %identifier,
                    error = %e,
                    fail_open = self.fail_open,
                    "Rate limit store unavailable"
                );
                self.fallback(limit, window_seconds, now)
            }
        }
    }

    async fn evaluate(
        &self,
        identifier: &str,
        limit: u32,
        window_seconds: u64,
        now: i64,
    ) -> Result<RateLimitResult, CacheError> {
        let key = CacheKey::RateLimit {
            identifier,
            window_seconds,
        }
        .build();
        let window_ms = window_millis(now, window_seconds).ok_or_else(|| {
            CacheError::Operation(format!("window of {window_seconds}s is out of range"))
        })?;
        let window_start = now - window_ms;

        // Scores are whole milliseconds: drop everything below window_start.
        self.store
            .zrem_range_by_score(&key, 0.0, (window_start - 1) as f64)
            .await?;

        let current = self.store.zcard(&key).await?;

        if current >= u64::from(limit) {
            return Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_time: ceil_secs(window_start + window_ms),
            });
        }

        // Unique member so two hits in the same millisecond both count.
        let member = format!("{now}-{:08x}", rand::random::<u32>());
        self.store.zadd(&key, now as f64, &member).await?;
        self.store.expire(&key, window_seconds).await?;

        Ok(RateLimitResult {
            allowed: true,
            remaining: limit - current as u32 - 1,
            reset_time: ceil_secs(now + window_ms),
        })
    }

    fn fallback(&self, limit: u32, window_seconds: u64, now: i64) -> RateLimitResult {
        let reset_time = now
            .div_euclid(1000)
            .saturating_add(i64::try_from(window_seconds).unwrap_or(i64::MAX));
        if self.fail_open {
            RateLimitResult {
                allowed: true,
                remaining: limit.saturating_sub(1),
                reset_time,
            }
        } else {
            RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_time,
            }
        }
    }
}

/// Window length in milliseconds, `None` when `now + window` would overflow.
fn window_millis(now: i64, window_seconds: u64) -> Option<i64> {
    i64::try_from(window_seconds)
        .ok()?
        .checked_mul(1000)
        .filter(|millis| now.checked_add(*millis).is_some())
}

/// Milliseconds to Unix seconds, rounded up.
fn ceil_secs(millis: i64) -> i64 {
    (millis + 999).div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::cache::testing::FailingStore;
    use crate::utils::clock::ManualClock;
    use async_trait::async_trait;
    use std::time::Duration;

    const START: i64 = 1_700_000_000_000;

    fn limiter() -> (RateLimiter, Arc<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        (RateLimiter::new(store.clone(), clock.clone()), store, clock)
    }

    #[tokio::test]
    async fn test_six_calls_against_limit_of_five() {
        let (limiter, _, _) = limiter();
        let mut outcomes = Vec::new();
        for _ in 0..6 {
            let r = limiter.check("ip-A", 5, 60).await;
            outcomes.push((r.allowed, r.remaining));
        }
        assert_eq!(
            outcomes,
            vec![
                (true, 4),
                (true, 3),
                (true, 2),
                (true, 1),
                (true, 0),
                (false, 0)
            ]
        );
    }

    #[tokio::test]
    async fn test_same_millisecond_hits_all_count() {
        let (limiter, store, _) = limiter();
        for _ in 0..3 {
            assert!(limiter.check("ip-B", 10, 60).await.allowed);
        }
        assert_eq!(store.zcard("rate_limit:ip-B:60").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_denied_call_is_not_recorded() {
        let (limiter, store, _) = limiter();
        limiter.check("ip-C", 1, 60).await;
        let denied = limiter.check("ip-C", 1, 60).await;
        assert!(!denied.allowed);
        assert_eq!(store.zcard("rate_limit:ip-C:60").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_window_resets_after_it_elapses() {
        let (limiter, _, clock) = limiter();
        for _ in 0..3 {
            limiter.check("ip-A", 3, 10).await;
        }
        assert!(!limiter.check("ip-A", 3, 10).await.allowed);

        clock.advance(Duration::from_secs(11));
        let r = limiter.check("ip-A", 3, 10).await;
        assert!(r.allowed);
        assert_eq!(r.remaining, 2);
    }

    #[tokio::test]
    async fn test_window_slides_instead_of_resetting_in_buckets() {
        let (limiter, _, clock) = limiter();
        assert!(limiter.check("ip-D", 2, 10).await.allowed);
        clock.advance(Duration::from_secs(6));
        assert!(limiter.check("ip-D", 2, 10).await.allowed);
        clock.advance(Duration::from_secs(2));
        assert!(!limiter.check("ip-D", 2, 10).await.allowed);

        // first hit leaves the window, second is still inside
        clock.advance(Duration::from_secs(3));
        let r = limiter.check("ip-D", 2, 10).await;
        assert!(r.allowed);
        assert_eq!(r.remaining, 0);
    }

    #[tokio::test]
    async fn test_hit_exactly_at_window_start_still_counts() {
        let (limiter, _, clock) = limiter();
        assert!(limiter.check("ip-E", 2, 10).await.allowed);
        clock.advance(Duration::from_secs(5));
        assert!(limiter.check("ip-E", 2, 10).await.allowed);
        clock.advance(Duration::from_secs(5));
        assert!(!limiter.check("ip-E", 2, 10).await.allowed);
        clock.advance(Duration::from_millis(1));
        assert!(limiter.check("ip-E", 2, 10).await.allowed);
    }

    #[tokio::test]
    async fn test_identifiers_and_windows_are_independent() {
        let (limiter, _, _) = limiter();
        assert!(limiter.check("ip-A", 1, 60).await.allowed);
        assert!(!limiter.check("ip-A", 1, 60).await.allowed);
        assert!(limiter.check("ip-B", 1, 60).await.allowed);
        assert!(limiter.check("ip-A", 1, 3600).await.allowed);
    }

    #[tokio::test]
    async fn test_window_key_expires_with_window() {
        let (limiter, store, _) = limiter();
        limiter.check("ip-A", 5, 60).await;
        assert_eq!(store.ttl_millis("rate_limit:ip-A:60"), Some(60_000));
    }

    #[tokio::test]
    async fn test_reset_times() {
        let (limiter, _, _) = limiter();
        let allowed = limiter.check("ip-A", 1, 60).await;
        assert_eq!(allowed.reset_time, START / 1000 + 60);
        let denied = limiter.check("ip-A", 1, 60).await;
        assert_eq!(denied.reset_time, START / 1000);
    }

    #[tokio::test]
    async fn test_fail_open_when_store_is_down() {
        let clock = Arc::new(ManualClock::new(START));
        let limiter = RateLimiter::new(Arc::new(FailingStore), clock);
        for _ in 0..20 {
            let r = limiter.check("ip-A", 5, 60).await;
            assert!(r.allowed);
            assert_eq!(r.remaining, 4);
            assert_eq!(r.reset_time, START / 1000 + 60);
        }
    }

    #[tokio::test]
    async fn test_out_of_range_window_takes_fallback_path() {
        let (open, _, _) = limiter();
        for window in [u64::MAX / 100, u64::MAX] {
            let r = open.check("ip-A", 5, window).await;
            assert!(r.allowed);
            assert_eq!(r.remaining, 4);
            assert!(r.reset_time > START / 1000);
        }

        let (closed, _, _) = limiter();
        let r = closed.with_fail_open(false).check("ip-A", 5, u64::MAX).await;
        assert!(!r.allowed);
        assert_eq!(r.remaining, 0);
    }

    #[test]
    fn test_window_millis_bounds() {
        assert_eq!(window_millis(START, 60), Some(60_000));
        assert_eq!(window_millis(START, u64::MAX), None);
        assert_eq!(window_millis(START, i64::MAX as u64 / 1000), None);
    }

    #[tokio::test]
    async fn test_fail_closed_when_configured() {
        let clock = Arc::new(ManualClock::new(START));
        let limiter = RateLimiter::new(Arc::new(FailingStore), clock).with_fail_open(false);
        let r = limiter.check("ip-A", 5, 60).await;
        assert!(!r.allowed);
        assert_eq!(r.remaining, 0);
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(1_000), 1);
        assert_eq!(ceil_secs(1_001), 2);
        assert_eq!(ceil_secs(0), 0);
    }

    /// Memory store that yields after counting, so concurrent checks
    /// interleave between the count and the record steps.
    struct InterleavingStore(MemoryStore);

    #[async_trait]
    impl KeyValueStore for InterleavingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.0.get(key).await
        }
        async fn set_ex(&self, key: &str, value: String, ttl: u64) -> Result<(), CacheError> {
            self.0.set_ex(key, value, ttl).await
        }
        async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
            self.0.del(keys).await
        }
        async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
            self.0.keys(pattern).await
        }
        async fn incr(&self, key: &str) -> Result<i64, CacheError> {
            self.0.incr(key).await
        }
        async fn expire(&self, key: &str, ttl: u64) -> Result<bool, CacheError> {
            self.0.expire(key, ttl).await
        }
        async fn exists(&self, key: &str) -> Result<bool, CacheError> {
            self.0.exists(key).await
        }
        async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
            self.0.mget(keys).await
        }
        async fn sadd(&self, key: &str, member: &str) -> Result<bool, CacheError> {
            self.0.sadd(key, member).await
        }
        async fn sismember(&self, key: &str, member: &str) -> Result<bool, CacheError> {
            self.0.sismember(key, member).await
        }
        async fn srem(&self, key: &str, member: &str) -> Result<bool, CacheError> {
            self.0.srem(key, member).await
        }
        async fn zrem_range_by_score(&self, k: &str, a: f64, b: f64) -> Result<u64, CacheError> {
            self.0.zrem_range_by_score(k, a, b).await
        }
        async fn zcard(&self, key: &str) -> Result<u64, CacheError> {
            let count = self.0.zcard(key).await?;
            tokio::task::yield_now().await;
            Ok(count)
        }
        async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool, CacheError> {
            self.0.zadd(key, score, member).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_burst_can_exceed_limit() {
        let clock = Arc::new(ManualClock::new(START));
        let store = Arc::new(InterleavingStore(MemoryStore::new(clock.clone())));
        let limiter = RateLimiter::new(store.clone(), clock);

        let (a, b) = tokio::join!(limiter.check("ip-A", 1, 60), limiter.check("ip-A", 1, 60));

        // both read a count of zero before either recorded its hit
        assert!(a.allowed && b.allowed);
        assert_eq!(store.zcard("rate_limit:ip-A:60").await.unwrap(), 2);
        assert!(!limiter.check("ip-A", 1, 60).await.allowed);
    }
}
