//! Fingerprint-keyed response cache
//!
//! Provider responses are cached under request fingerprints with per-type
//! TTLs. Entries are immutable once written except for their hit counter.
//! The memory backend serves tests and single-node deployments; the Redis
//! backend shares entries across gateway instances.

pub mod memory;
pub mod redis;
pub mod store;

pub use memory::MemoryCache;
pub use redis::RedisCache;
pub use store::{CacheEntry, CacheStore};
