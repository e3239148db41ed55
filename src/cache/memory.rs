//! In-process key-value store.
//!
//! Implements the same primitives as the Redis backend on top of a
//! [`DashMap`], with lazy expiry against an injected [`Clock`]. Used for
//! local development and as the store behind the test suite.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;

use crate::cache::{CacheError, KeyValueStore};
use crate::utils::clock::{SharedClock, SystemClock};

enum Value {
    Str(String),
    Set(HashSet<String>),
    ZSet(HashMap<String, f64>),
}

struct Entry {
    value: Value,
    /// Unix milliseconds.
    expires_at: Option<i64>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Store held entirely in process memory.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    clock: SharedClock,
}

impl MemoryStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Expire a key immediately, as if its TTL had elapsed.
    pub fn expire_now(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remaining TTL of a key in milliseconds, `None` when absent or persistent.
    pub fn ttl_millis(&self, key: &str) -> Option<i64> {
        let now = self.now();
        self.purge(key, now);
        self.entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|exp| exp - now)
    }

    fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    fn purge(&self, key: &str, now: i64) {
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
    }

    fn wrong_type(key: &str) -> CacheError {
        CacheError::WrongType(key.to_string())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(std::sync::Arc::new(SystemClock))
    }
}

/// Absolute expiry in Unix milliseconds, rejecting TTLs that overflow
/// the way Redis rejects them.
fn expiry_at(now: i64, ttl_seconds: u64, command: &str) -> Result<i64, CacheError> {
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
        .and_then(|millis| now.checked_add(millis))
        .ok_or_else(|| CacheError::Operation(format!("invalid expire time in '{command}' command")))
}

/// Translate a Redis glob into an anchored regex.
///
/// Supports `*`, `?` and backslash escapes; every other character matches
/// itself.
fn glob_to_regex(pattern: &str) -> Result<Regex, CacheError> {
    let mut source = String::with_capacity(pattern.len() * 2 + 2);
    source.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    source.push_str(&regex::escape(&next.to_string()));
                }
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|e| CacheError::Operation(e.to_string()))
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.purge(key, self.now());
        match self.entries.get(key) {
            None => Ok(None),
            Some(entry) => match &entry.value {
                Value::Str(s) => Ok(Some(s.clone())),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), CacheError> {
        if ttl_seconds == 0 {
            return Err(CacheError::Operation(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }
        let entry = Entry {
            value: Value::Str(value),
            expires_at: Some(expiry_at(self.now(), ttl_seconds, "setex")?),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        let now = self.now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| !entry.is_expired(now))
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let matcher = glob_to_regex(pattern)?;
        let now = self.now();
        Ok(self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now) && matcher.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        self.purge(key, self.now());
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Str("0".to_string())));
        match &mut entry.value {
            Value::Str(current) => {
                let next = current
                    .parse::<i64>()
                    .ok()
                    .and_then(|n| n.checked_add(1))
                    .ok_or_else(|| {
                        CacheError::Operation(
                            "value is not an integer or out of range".to_string(),
                        )
                    })?;
                *current = next.to_string();
                Ok(next)
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        let now = self.now();
        self.purge(key, now);
        let expires_at = expiry_at(now, ttl_seconds, "expire")?;
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.purge(key, self.now());
        Ok(self.entries.contains_key(key))
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        let now = self.now();
        Ok(keys
            .iter()
            .map(|key| {
                self.purge(key, now);
                self.entries.get(key).and_then(|entry| match &entry.value {
                    Value::Str(s) => Some(s.clone()),
                    _ => None,
                })
            })
            .collect())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        self.purge(key, self.now());
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Set(HashSet::new())));
        match &mut entry.value {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        self.purge(key, self.now());
        match self.entries.get(key) {
            None => Ok(false),
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.contains(member)),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        self.purge(key, self.now());
        let removed = match self.entries.get_mut(key) {
            None => return Ok(false),
            Some(mut entry) => match &mut entry.value {
                Value::Set(set) => set.remove(member),
                _ => return Err(Self::wrong_type(key)),
            },
        };
        self.entries
            .remove_if(key, |_, entry| matches!(&entry.value, Value::Set(s) if s.is_empty()));
        Ok(removed)
    }

    async fn zrem_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<u64, CacheError> {
        self.purge(key, self.now());
        let removed = match self.entries.get_mut(key) {
            None => return Ok(0),
            Some(mut entry) => match &mut entry.value {
                Value::ZSet(members) => {
                    let before = members.len();
                    members.retain(|_, score| *score < min || *score > max);
                    (before - members.len()) as u64
                }
                _ => return Err(Self::wrong_type(key)),
            },
        };
        self.entries
            .remove_if(key, |_, entry| matches!(&entry.value, Value::ZSet(m) if m.is_empty()));
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64, CacheError> {
        self.purge(key, self.now());
        match self.entries.get(key) {
            None => Ok(0),
            Some(entry) => match &entry.value {
                Value::ZSet(members) => Ok(members.len() as u64),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool, CacheError> {
        self.purge(key, self.now());
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::ZSet(HashMap::new())));
        match &mut entry.value {
            Value::ZSet(members) => Ok(members.insert(member.to_string(), score).is_none()),
            _ => Err(Self::wrong_type(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn store() -> (MemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        (MemoryStore::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_get_set() {
        let (store, _) = store();
        store.set_ex("key", "value".into(), 60).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_set_rejects_zero_ttl() {
        let (store, _) = store();
        assert!(store.set_ex("key", "value".into(), 0).await.is_err());
    }

    #[tokio::test]
    async fn test_set_rejects_overflowing_ttl() {
        let (store, _) = store();
        assert!(store.set_ex("key", "value".into(), 1 << 60).await.is_err());
        assert!(store.set_ex("key", "value".into(), u64::MAX).await.is_err());
        assert_eq!(store.get("key").await.unwrap(), None);

        store.set_ex("key", "value".into(), 60).await.unwrap();
        assert!(store.expire("key", u64::MAX).await.is_err());
        assert_eq!(store.ttl_millis("key"), Some(60_000));
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let (store, clock) = store();
        store.set_ex("key", "value".into(), 5).await.unwrap();
        clock.advance(Duration::from_secs(4));
        assert!(store.exists("key").await.unwrap());
        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get("key").await.unwrap(), None);
        assert!(!store.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_del_counts_existing_keys() {
        let (store, _) = store();
        store.set_ex("a", "1".into(), 60).await.unwrap();
        store.set_ex("b", "2".into(), 60).await.unwrap();
        let removed = store
            .del(&["a".into(), "b".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn test_keys_glob() {
        let (store, _) = store();
        for key in ["ns:a", "ns:b", "other:a", "nsx"] {
            store.set_ex(key, "v".into(), 60).await.unwrap();
        }
        let mut keys = store.keys("ns:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["ns:a".to_string(), "ns:b".to_string()]);
        assert_eq!(store.keys("ns?a").await.unwrap(), vec!["ns:a".to_string()]);
        assert!(store.keys("ns\\*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incr_and_expire() {
        let (store, clock) = store();
        assert_eq!(store.incr("counter").await.unwrap(), 1);
        assert_eq!(store.incr("counter").await.unwrap(), 2);
        assert_eq!(store.ttl_millis("counter"), None);
        assert!(store.expire("counter", 10).await.unwrap());
        assert_eq!(store.ttl_millis("counter"), Some(10_000));
        clock.advance(Duration::from_secs(10));
        assert_eq!(store.incr("counter").await.unwrap(), 1);
        assert!(!store.expire("missing", 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let (store, _) = store();
        store.set_ex("k", "\"text\"".into(), 60).await.unwrap();
        assert!(store.incr("k").await.is_err());
    }

    #[tokio::test]
    async fn test_mget_preserves_order() {
        let (store, _) = store();
        store.set_ex("a", "1".into(), 60).await.unwrap();
        store.set_ex("c", "3".into(), 60).await.unwrap();
        let values = store
            .mget(&["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();
        assert_eq!(values, vec![Some("1".into()), None, Some("3".into())]);
    }

    #[tokio::test]
    async fn test_set_membership() {
        let (store, _) = store();
        assert!(store.sadd("s", "x").await.unwrap());
        assert!(!store.sadd("s", "x").await.unwrap());
        assert!(store.sismember("s", "x").await.unwrap());
        assert!(store.srem("s", "x").await.unwrap());
        assert!(!store.sismember("s", "x").await.unwrap());
        assert!(!store.exists("s").await.unwrap());
    }

    #[tokio::test]
    async fn test_sorted_set_range_removal() {
        let (store, _) = store();
        store.zadd("z", 100.0, "a").await.unwrap();
        store.zadd("z", 200.0, "b").await.unwrap();
        store.zadd("z", 300.0, "c").await.unwrap();
        assert_eq!(store.zcard("z").await.unwrap(), 3);
        assert_eq!(store.zrem_range_by_score("z", 0.0, 199.0).await.unwrap(), 1);
        assert_eq!(store.zcard("z").await.unwrap(), 2);
        assert_eq!(store.zcard("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let (store, _) = store();
        store.sadd("s", "x").await.unwrap();
        assert!(matches!(
            store.get("s").await,
            Err(CacheError::WrongType(_))
        ));
        assert!(matches!(
            store.zcard("s").await,
            Err(CacheError::WrongType(_))
        ));
    }

    #[test]
    fn test_glob_to_regex_escapes_metacharacters() {
        let re = glob_to_regex("a.b*").unwrap();
        assert!(re.is_match("a.bcd"));
        assert!(!re.is_match("axbcd"));
    }
}
