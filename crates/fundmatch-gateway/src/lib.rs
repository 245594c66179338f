//! Outbound AI gateway for the FundMatch platform.
//!
//! Every AI-backed feature (match-set generation, match explanations) calls
//! the provider through [`gateway::Gateway::invoke`], which layers, in
//! order:
//!
//! - **Quota**: monthly per-organization call limits by subscription tier,
//!   charged on every attempt including cache hits
//! - **Response cache**: fingerprint-keyed results with per-request-type
//!   TTLs, served without touching the provider or the breaker
//! - **Circuit breaker**: per-endpoint failure tracking with lazy
//!   open/half-open/closed transitions and a single recovery probe
//! - **Fallback content**: a well-formed degraded response whenever the
//!   provider is unreachable, never cached
//! - **Cost ledger and budget alerts**: append-only micro-USD accounting
//!   with at-most-once monthly threshold notifications
//!
//! All time-based behavior runs against an injected [`clock::Clock`], so
//! tests drive breaker timers, cache expiry and quota periods without
//! sleeping.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod breaker;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fingerprint;
pub mod gateway;
pub mod ledger;
pub mod ratelimit;
pub mod request;
pub mod stats;

pub use breaker::{BreakerConfig, CircuitBreaker, CircuitState, Decision, EndpointSnapshot};
pub use cache::{CacheEntry, CacheStore, MemoryCache, RedisCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    load_config, BreakerSettings, BudgetSettings, CacheSettings, GatewayConfig,
};
pub use error::{GatewayError, Result};
pub use fallback::fallback_text;
pub use fingerprint::compute_fingerprint;
pub use gateway::{cache_from_settings, Gateway, GatewaySnapshot};
pub use ledger::{
    BudgetAlert, BudgetConfig, BudgetNotifier, BudgetWatch, CostRecord, DailyCost, LedgerStore,
    LogNotifier, MemoryLedger, SqliteLedger,
};
pub use ratelimit::{RateLimitVerdict, RateLimiter, Tier, TierLimits};
pub use request::{GatewayRequest, GatewayResponse, RequestType};
pub use stats::{DayCounters, DayStats};
