//! Gateway configuration
//!
//! Settings load from optional TOML files under `config/` with environment
//! variables as the highest-priority source. Every field has a serde
//! default, so an empty deployment runs with the documented defaults.

use crate::breaker::BreakerConfig;
use crate::error::{GatewayError, Result};
use crate::ledger::BudgetConfig;
use crate::ratelimit::TierLimits;
use crate::request::RequestType;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Circuit breaker settings
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSettings {
    /// Failures within the window that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Sliding failure window, seconds
    #[serde(default = "default_failure_window_secs")]
    pub failure_window_secs: u64,
    /// Time the circuit stays open before probing, seconds
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
    /// Concurrent probes allowed while half-open
    #[serde(default = "default_max_probes")]
    pub max_probes: u32,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_failure_window_secs() -> u64 {
    60
}

fn default_open_timeout_secs() -> u64 {
    30
}

fn default_max_probes() -> u32 {
    1
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            failure_window_secs: default_failure_window_secs(),
            open_timeout_secs: default_open_timeout_secs(),
            max_probes: default_max_probes(),
        }
    }
}

impl BreakerSettings {
    /// Breaker configuration with durations resolved
    #[must_use]
    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.failure_threshold,
            failure_window: Duration::from_secs(self.failure_window_secs),
            open_timeout: Duration::from_secs(self.open_timeout_secs),
            max_probes: self.max_probes,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// TTL for match set responses, seconds
    #[serde(default = "default_match_set_ttl_secs")]
    pub match_set_ttl_secs: u64,
    /// TTL for explanation responses, seconds
    #[serde(default = "default_explanation_ttl_secs")]
    pub explanation_ttl_secs: u64,
    /// Redis connection string; the in-memory cache is used when unset
    #[serde(default)]
    pub redis_url: Option<String>,
}

fn default_match_set_ttl_secs() -> u64 {
    86_400
}

fn default_explanation_ttl_secs() -> u64 {
    3_600
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            match_set_ttl_secs: default_match_set_ttl_secs(),
            explanation_ttl_secs: default_explanation_ttl_secs(),
            redis_url: None,
        }
    }
}

impl CacheSettings {
    /// Cache TTL for a request type
    #[must_use]
    pub fn ttl_for(&self, request_type: RequestType) -> Duration {
        match request_type {
            RequestType::MatchSet => Duration::from_secs(self.match_set_ttl_secs),
            RequestType::Explanation => Duration::from_secs(self.explanation_ttl_secs),
        }
    }
}

/// Budget alert settings
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetSettings {
    /// Monthly ceiling in micro-USD; zero disables alerting
    #[serde(default)]
    pub monthly_ceiling_microdollars: u64,
    /// Percent thresholds reported once each per month
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<u8>,
}

fn default_thresholds() -> Vec<u8> {
    vec![50, 80, 100]
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            monthly_ceiling_microdollars: 0,
            thresholds: default_thresholds(),
        }
    }
}

impl BudgetSettings {
    /// Budget alerting configuration
    #[must_use]
    pub fn budget_config(&self) -> BudgetConfig {
        BudgetConfig {
            monthly_ceiling_microdollars: self.monthly_ceiling_microdollars,
            thresholds: self.thresholds.clone(),
        }
    }
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Circuit breaker settings
    #[serde(default)]
    pub breaker: BreakerSettings,
    /// Response cache settings
    #[serde(default)]
    pub cache: CacheSettings,
    /// Budget alert settings
    #[serde(default)]
    pub budget: BudgetSettings,
    /// Monthly call limits per tier
    #[serde(default)]
    pub limits: TierLimits,
    /// Upper bound on one provider call, milliseconds
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
}

fn default_provider_timeout_ms() -> u64 {
    30_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            breaker: BreakerSettings::default(),
            cache: CacheSettings::default(),
            budget: BudgetSettings::default(),
            limits: TierLimits::default(),
            provider_timeout_ms: default_provider_timeout_ms(),
        }
    }
}

/// Load configuration from files and environment
pub fn load_config() -> Result<GatewayConfig> {
    let config = Config::builder()
        // 1. File overrides (optional)
        .add_source(File::with_name("config/gateway").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 2. Environment variables (highest priority)
        // prefix_separator("_") keeps FUNDMATCH_CACHE__REDIS_URL working;
        // without it config-rs expects FUNDMATCH__CACHE__REDIS_URL.
        .add_source(
            Environment::with_prefix("FUNDMATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| GatewayError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| GatewayError::Configuration(e.to_string()))
}
