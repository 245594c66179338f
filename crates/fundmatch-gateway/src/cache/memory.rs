//! In-memory cache backend

use super::store::{CacheEntry, CacheStore};
use crate::clock::Clock;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory cache for tests and single-node deployments
#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, including expired ones not yet swept
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Remove expired entries, returning how many were dropped.
    ///
    /// Expired entries are already invisible to `get`; this only reclaims
    /// memory on long-running processes.
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_utc();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>> {
        let now = self.clock.now_utc();
        let mut entries = self.entries.write().await;

        let expired = match entries.get(fingerprint) {
            Some(entry) => entry.is_expired(now),
            None => return Ok(None),
        };
        if expired {
            entries.remove(fingerprint);
            debug!(fingerprint = %fingerprint, "cache entry expired, dropping");
            return Ok(None);
        }

        match entries.get_mut(fingerprint) {
            Some(entry) => {
                entry.hit_count += 1;
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, fingerprint: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(fingerprint, value, ttl, self.clock.now_utc());
        debug!(fingerprint = %fingerprint, ttl_secs = ttl.as_secs(), "caching response");
        self.entries
            .write()
            .await
            .insert(fingerprint.to_string(), entry);
        Ok(())
    }

    async fn invalidate(&self, fingerprint: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(fingerprint).is_some())
    }
}
