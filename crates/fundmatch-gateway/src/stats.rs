//! Daily serving counters
//!
//! Tracks cache hits, cache misses, and fallback responses for the current
//! UTC day. Counters reset lazily when the first event of a new day
//! arrives; there is no midnight task.

use crate::clock::Clock;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Snapshot of today's serving counters
#[derive(Debug, Clone, Serialize)]
pub struct DayStats {
    /// UTC day the counters cover
    pub day: NaiveDate,
    /// Responses served from cache
    pub cache_hits: u64,
    /// Requests that missed the cache
    pub cache_misses: u64,
    /// Canned responses served during provider trouble
    pub fallbacks_served: u64,
}

#[derive(Debug)]
struct DayCountersInner {
    day: NaiveDate,
    cache_hits: u64,
    cache_misses: u64,
    fallbacks_served: u64,
}

/// Rolling counters for the current UTC day
#[derive(Clone)]
pub struct DayCounters {
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<DayCountersInner>>,
}

impl DayCounters {
    /// Create counters starting at the clock's current day
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let day = clock.now_utc().date_naive();
        Self {
            clock,
            inner: Arc::new(Mutex::new(DayCountersInner {
                day,
                cache_hits: 0,
                cache_misses: 0,
                fallbacks_served: 0,
            })),
        }
    }

    /// Record a response served from cache
    pub fn record_hit(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.roll_if_stale(&mut inner);
        inner.cache_hits += 1;
    }

    /// Record a request that missed the cache
    pub fn record_miss(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.roll_if_stale(&mut inner);
        inner.cache_misses += 1;
    }

    /// Record a canned response served in place of a live call
    pub fn record_fallback(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.roll_if_stale(&mut inner);
        inner.fallbacks_served += 1;
    }

    /// Current day's counters
    #[must_use]
    pub fn snapshot(&self) -> DayStats {
        let mut inner = self.inner.lock().unwrap();
        self.roll_if_stale(&mut inner);
        DayStats {
            day: inner.day,
            cache_hits: inner.cache_hits,
            cache_misses: inner.cache_misses,
            fallbacks_served: inner.fallbacks_served,
        }
    }

    fn roll_if_stale(&self, inner: &mut DayCountersInner) {
        let today = self.clock.now_utc().date_naive();
        if inner.day != today {
            inner.day = today;
            inner.cache_hits = 0;
            inner.cache_misses = 0;
            inner.fallbacks_served = 0;
        }
    }
}
