//! Redis cache backend
//!
//! Entries are stored as JSON under a shared key prefix with a server-side
//! TTL, so expiry survives gateway restarts. The hit counter rides along in
//! the JSON and is written back under the remaining TTL on each hit.

use super::store::{CacheEntry, CacheStore};
use crate::clock::Clock;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_PREFIX: &str = "fundmatch:cache:";

/// Redis-backed cache shared across gateway instances
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    prefix: String,
    clock: Arc<dyn Clock>,
}

impl RedisCache {
    /// Connect to Redis at `redis_url`
    pub fn new(redis_url: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| GatewayError::Storage(format!("Redis connect failed: {}", e)))?;
        Ok(Self {
            client,
            prefix: DEFAULT_PREFIX.to_string(),
            clock,
        })
    }

    /// Override the key prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn build_key(&self, fingerprint: &str) -> String {
        format!("{}{}", self.prefix, fingerprint)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| GatewayError::Storage(format!("Redis connection failed: {}", e)))
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>> {
        let key = self.build_key(fingerprint);
        let mut conn = self.get_connection().await?;

        let raw: Option<String> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| GatewayError::Storage(format!("Redis GET failed: {}", e)))?;

        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let mut entry: CacheEntry = serde_json::from_str(&raw)
            .map_err(|e| GatewayError::Storage(format!("corrupt cache entry: {}", e)))?;

        let now = self.clock.now_utc();
        if entry.is_expired(now) {
            // Server-side expiry has not fired yet; honor the stamp
            let _: () = redis::cmd("DEL")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(|e| GatewayError::Storage(format!("Redis DEL failed: {}", e)))?;
            return Ok(None);
        }

        entry.hit_count += 1;
        let remaining = entry.remaining_ttl_secs(now).max(1);
        let json = serde_json::to_string(&entry)
            .map_err(|e| GatewayError::Storage(format!("serialize cache entry: {}", e)))?;
        let _: () = redis::cmd("SETEX")
            .arg(&key)
            .arg(remaining)
            .arg(&json)
            .query_async(&mut conn)
            .await
            .map_err(|e| GatewayError::Storage(format!("Redis SETEX failed: {}", e)))?;

        Ok(Some(entry))
    }

    async fn put(&self, fingerprint: &str, value: String, ttl: Duration) -> Result<()> {
        let key = self.build_key(fingerprint);
        let entry = CacheEntry::new(fingerprint, value, ttl, self.clock.now_utc());
        let json = serde_json::to_string(&entry)
            .map_err(|e| GatewayError::Storage(format!("serialize cache entry: {}", e)))?;

        let mut conn = self.get_connection().await?;
        debug!(fingerprint = %fingerprint, ttl_secs = ttl.as_secs(), "caching response in redis");
        let _: () = redis::cmd("SETEX")
            .arg(&key)
            .arg(ttl.as_secs())
            .arg(&json)
            .query_async(&mut conn)
            .await
            .map_err(|e| GatewayError::Storage(format!("Redis SETEX failed: {}", e)))?;
        Ok(())
    }

    async fn invalidate(&self, fingerprint: &str) -> Result<bool> {
        let key = self.build_key(fingerprint);
        let mut conn = self.get_connection().await?;
        let deleted: i64 = redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| GatewayError::Storage(format!("Redis DEL failed: {}", e)))?;
        Ok(deleted > 0)
    }
}

// Redis tests require a running Redis instance.
// Run with: cargo test --features redis-tests
#[cfg(all(test, feature = "redis-tests"))]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    fn test_cache() -> RedisCache {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        RedisCache::new(&url, Arc::new(SystemClock::new()))
            .unwrap()
            .with_prefix("fundmatch:test:cache:")
    }

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache = test_cache();
        let fingerprint = format!("fp-{}", uuid::Uuid::new_v4());

        cache
            .put(&fingerprint, "payload".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let entry = cache.get(&fingerprint).await.unwrap().unwrap();
        assert_eq!(entry.value, "payload");
        assert_eq!(entry.hit_count, 1);

        assert!(cache.invalidate(&fingerprint).await.unwrap());
        assert!(cache.get(&fingerprint).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_reads_as_none() {
        let cache = test_cache();
        assert!(cache.get("fp-never-written").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hit_count_persists_across_reads() {
        let cache = test_cache();
        let fingerprint = format!("fp-{}", uuid::Uuid::new_v4());

        cache
            .put(&fingerprint, "payload".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.get(&fingerprint).await.unwrap();
        let entry = cache.get(&fingerprint).await.unwrap().unwrap();
        assert_eq!(entry.hit_count, 2);

        cache.invalidate(&fingerprint).await.unwrap();
    }
}
