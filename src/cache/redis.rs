//! Redis key-value store using a bb8 connection pool.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::cache::{CacheError, KeyValueStore};
use crate::config::settings::RedisCacheConfig;

type RedisPool = Pool<Client>;

/// `COUNT` hint for each `SCAN` step.
const SCAN_BATCH: usize = 200;

/// Redis-backed store. Every primitive is one command on a pooled
/// multiplexed connection, bounded by the configured command timeout.
pub struct RedisStore {
    pool: RedisPool,
    command_timeout: Duration,
}

impl RedisStore {
    pub async fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let url = authenticated_url(&config.url, &config.token);
        let client = Client::open(url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            command_timeout: Duration::from_millis(config.command_timeout_ms),
        })
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }

    /// Run one command against a pooled connection within the timeout.
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, CacheError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = Result<T, RedisError>>,
    {
        let timeout_ms = self.command_timeout.as_millis() as u64;
        let attempt = async {
            let conn = self.get_conn().await?;
            let conn_ref: &MultiplexedConnection = &conn;
            op(conn_ref.clone())
                .await
                .map_err(|e| CacheError::Operation(e.to_string()))
        };
        tokio::time::timeout(self.command_timeout, attempt)
            .await
            .map_err(|_| CacheError::Timeout(timeout_ms))?
    }
}

fn scan_cmd(cursor: u64, pattern: &str) -> redis::Cmd {
    let mut cmd = redis::cmd("SCAN");
    cmd.arg(cursor)
        .arg("MATCH")
        .arg(pattern)
        .arg("COUNT")
        .arg(SCAN_BATCH);
    cmd
}

/// Put the access token into the URL's userinfo unless it already has one.
fn authenticated_url(url: &str, token: &str) -> String {
    if token.is_empty() {
        return url.to_string();
    }
    match url.split_once("://") {
        Some((scheme, rest)) if !rest.contains('@') => format!("{scheme}://:{token}@{rest}"),
        _ => url.to_string(),
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.run(|mut conn| async move { conn.get(key).await }).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), CacheError> {
        self.run(|mut conn| async move { conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await })
            .await
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.run(|mut conn| async move { conn.del(keys).await }).await
    }

    /// Cursor walk with `SCAN`. A key may be reported twice, so the result
    /// is deduplicated.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .run(|mut conn| async move {
                let mut found = Vec::new();
                let mut cursor: u64 = 0;
                loop {
                    let (next, batch): (u64, Vec<String>) =
                        scan_cmd(cursor, pattern).query_async(&mut conn).await?;
                    found.extend(batch);
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                Ok::<_, RedisError>(found)
            })
            .await?;
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        self.run(|mut conn| async move { conn.incr(key, 1_i64).await })
            .await
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        self.run(|mut conn| async move {
            redis::cmd("EXPIRE")
                .arg(key)
                .arg(ttl_seconds)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.run(|mut conn| async move { conn.exists(key).await })
            .await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.run(|mut conn| async move {
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await
        })
        .await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        self.run(|mut conn| async move { conn.sadd(key, member).await })
            .await
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        self.run(|mut conn| async move { conn.sismember(key, member).await })
            .await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        self.run(|mut conn| async move { conn.srem(key, member).await })
            .await
    }

    async fn zrem_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<u64, CacheError> {
        self.run(|mut conn| async move {
            redis::cmd("ZREMRANGEBYSCORE")
                .arg(key)
                .arg(min)
                .arg(max)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn zcard(&self, key: &str) -> Result<u64, CacheError> {
        self.run(|mut conn| async move {
            redis::cmd("ZCARD").arg(key).query_async(&mut conn).await
        })
        .await
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool, CacheError> {
        self.run(|mut conn| async move {
            redis::cmd("ZADD")
                .arg(key)
                .arg(score)
                .arg(member)
                .query_async(&mut conn)
                .await
        })
        .await
    }
}
