//! Cache entry type and storage trait

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached provider response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Fingerprint the entry is stored under
    pub key: String,
    /// Serialized response payload
    pub value: String,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
    /// How many times the entry has been served
    pub hit_count: u64,
}

impl CacheEntry {
    /// Create an entry expiring `ttl` after `now`
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            created_at: now,
            expires_at: now + ChronoDuration::seconds(ttl.as_secs() as i64),
            hit_count: 0,
        }
    }

    /// Whether the entry is stale at `now`. An entry at exactly its expiry
    /// counts as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds until expiry at `now`, zero once expired
    #[must_use]
    pub fn remaining_ttl_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}

/// Storage backend for cached responses
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a fresh entry, counting the hit. Expired entries read as
    /// absent.
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>>;

    /// Store a payload under a fingerprint with the given TTL, replacing
    /// any previous entry
    async fn put(&self, fingerprint: &str, value: String, ttl: Duration) -> Result<()>;

    /// Drop an entry, reporting whether one existed
    async fn invalidate(&self, fingerprint: &str) -> Result<bool>;
}
