//! Tier quota enforcement
//!
//! Monthly per-organization call counters with limits derived from the
//! subscription tier. Consumption is charged on every attempt, including
//! cache hits and fallback-served calls, so retry storms and cached traffic
//! stay visible in usage. Counters roll over lazily when the calendar month
//! changes; there is no reset task.

use crate::clock::{next_period_start, period_key, Clock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Subscription tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Free plan, tightly limited AI usage
    Free,
    /// Entry paid plan
    Starter,
    /// Full paid plan
    Pro,
}

impl Tier {
    /// Stable string form
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Starter => "starter",
            Tier::Pro => "pro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Monthly call limits per tier.
///
/// A configured limit of zero means unlimited. Internally an unlimited
/// tier runs with a limit of `u64::MAX` through the same code path as
/// every other tier; there is no special-cased skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierLimits {
    /// Free tier calls per month
    #[serde(default = "default_free_monthly")]
    pub free_monthly: u64,
    /// Starter tier calls per month
    #[serde(default = "default_starter_monthly")]
    pub starter_monthly: u64,
    /// Pro tier calls per month (zero = unlimited)
    #[serde(default = "default_pro_monthly")]
    pub pro_monthly: u64,
}

fn default_free_monthly() -> u64 {
    10
}

fn default_starter_monthly() -> u64 {
    200
}

fn default_pro_monthly() -> u64 {
    0
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            free_monthly: default_free_monthly(),
            starter_monthly: default_starter_monthly(),
            pro_monthly: default_pro_monthly(),
        }
    }
}

impl TierLimits {
    /// Effective limit for a tier
    #[must_use]
    pub fn limit_for(&self, tier: Tier) -> u64 {
        let configured = match tier {
            Tier::Free => self.free_monthly,
            Tier::Starter => self.starter_monthly,
            Tier::Pro => self.pro_monthly,
        };
        match configured {
            0 => u64::MAX,
            limit => limit,
        }
    }
}

/// Outcome of a quota check
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitVerdict {
    /// Whether the call may proceed
    pub allowed: bool,
    /// Calls remaining after this one
    pub remaining: u64,
    /// When the counter resets
    pub reset_at: DateTime<Utc>,
    /// Calls consumed so far this period
    pub used: u64,
}

impl RateLimitVerdict {
    fn allow(remaining: u64, reset_at: DateTime<Utc>, used: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            reset_at,
            used,
        }
    }

    fn deny(reset_at: DateTime<Utc>, used: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_at,
            used,
        }
    }
}

#[derive(Debug, Clone)]
struct UsageCounter {
    period: String,
    used: u64,
    reset_at: DateTime<Utc>,
}

/// Monthly quota limiter keyed by caller
pub struct RateLimiter {
    limits: TierLimits,
    clock: Arc<dyn Clock>,
    counters: Arc<RwLock<HashMap<String, UsageCounter>>>,
}

impl RateLimiter {
    /// Create a limiter with the given tier limits
    #[must_use]
    pub fn new(limits: TierLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            counters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check the caller's quota and consume one unit when allowed.
    ///
    /// Check-then-increment runs under one write lock, so concurrent
    /// callers at the boundary serialize and the counter never exceeds
    /// the limit. Denials consume nothing.
    pub async fn check_and_consume(&self, caller_id: &str, tier: Tier) -> RateLimitVerdict {
        let now = self.clock.now_utc();
        let period = period_key(now);
        let limit = self.limits.limit_for(tier);

        let mut counters = self.counters.write().await;
        let counter = counters
            .entry(caller_id.to_string())
            .or_insert_with(|| UsageCounter {
                period: period.clone(),
                used: 0,
                reset_at: next_period_start(now),
            });

        // Lazy rollover on first touch in a new month
        if counter.period != period {
            counter.period = period;
            counter.used = 0;
            counter.reset_at = next_period_start(now);
        }

        if counter.used >= limit {
            debug!(
                caller = %caller_id,
                tier = %tier,
                used = counter.used,
                "quota exhausted, denying call"
            );
            return RateLimitVerdict::deny(counter.reset_at, counter.used);
        }

        counter.used += 1;
        RateLimitVerdict::allow(limit - counter.used, counter.reset_at, counter.used)
    }

    /// Calls consumed this period, without consuming
    pub async fn usage(&self, caller_id: &str) -> u64 {
        let period = period_key(self.clock.now_utc());
        let counters = self.counters.read().await;
        counters
            .get(caller_id)
            .filter(|counter| counter.period == period)
            .map_or(0, |counter| counter.used)
    }

    /// Forget a caller's counter (support escape hatch)
    pub async fn reset(&self, caller_id: &str) {
        self.counters.write().await.remove(caller_id);
    }
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            limits: self.limits.clone(),
            clock: Arc::clone(&self.clock),
            counters: Arc::clone(&self.counters),
        }
    }
}

#[cfg(test)]
mod tests;
