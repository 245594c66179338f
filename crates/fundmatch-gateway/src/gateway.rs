//! Gateway orchestrator
//!
//! The single entry point for AI-backed features. `invoke` sequences quota,
//! cache, circuit breaker, the provider call, and accounting, and always
//! hands the caller a well-formed response unless the request itself is bad
//! or quota is exhausted.

use crate::breaker::{CircuitBreaker, Decision, EndpointSnapshot};
use crate::cache::{CacheStore, MemoryCache, RedisCache};
use crate::clock::{period_start, Clock};
use crate::config::{CacheSettings, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::fallback::fallback_text;
use crate::ledger::{BudgetNotifier, BudgetWatch, CostRecord, DailyCost, LedgerStore};
use crate::ratelimit::RateLimiter;
use crate::request::{GatewayRequest, GatewayResponse};
use crate::stats::{DayCounters, DayStats};
use fundmatch_llm::{CompletionRequest, PricingTable, ProviderClient};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Read-only operational view for the admin surface
#[derive(Debug, Clone, Serialize)]
pub struct GatewaySnapshot {
    /// Circuit state per endpoint
    pub breakers: Vec<EndpointSnapshot>,
    /// Today's cache hit/miss/fallback counters
    pub today: DayStats,
    /// Per-day spend, most recent day first
    pub daily_costs: Vec<DailyCost>,
}

/// Orchestrates one provider behind quota, cache, breaker and accounting
pub struct Gateway {
    provider: Arc<dyn ProviderClient>,
    cache: Arc<dyn CacheStore>,
    ledger: Arc<dyn LedgerStore>,
    breaker: CircuitBreaker,
    limiter: RateLimiter,
    budget: BudgetWatch,
    notifier: Arc<dyn BudgetNotifier>,
    pricing: PricingTable,
    stats: DayCounters,
    config: GatewayConfig,
    clock: Arc<dyn Clock>,
}

impl Gateway {
    /// Assemble a gateway from its parts.
    ///
    /// Breaker, limiter, budget watch and day counters are built here from
    /// the config. Stores and the provider are injected so deployments pick
    /// their backends.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        provider: Arc<dyn ProviderClient>,
        cache: Arc<dyn CacheStore>,
        ledger: Arc<dyn LedgerStore>,
        notifier: Arc<dyn BudgetNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            breaker: CircuitBreaker::new(config.breaker.breaker_config(), clock.clone()),
            limiter: RateLimiter::new(config.limits.clone(), clock.clone()),
            budget: BudgetWatch::new(config.budget.budget_config(), clock.clone()),
            stats: DayCounters::new(clock.clone()),
            pricing: PricingTable::new(),
            provider,
            cache,
            ledger,
            notifier,
            config,
            clock,
        }
    }

    /// Replace the default pricing table
    #[must_use]
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    // Breaker state is tracked per provider endpoint, not per caller: one
    // provider outage is one circuit.
    fn endpoint_key(&self, request: &GatewayRequest) -> String {
        format!("{}:{}", self.provider.name(), request.request_type.as_str())
    }

    /// Run one request through the serving sequence.
    ///
    /// Order: quota, cache, breaker, provider call, accounting. Quota is
    /// consumed exactly once per call on every path, including cache hits.
    /// Provider trouble degrades to fallback content, and storage trouble is
    /// logged without touching the response; only malformed requests and
    /// exhausted quota surface as errors.
    #[instrument(skip(self, request), fields(
        caller = %request.caller_id,
        request_type = %request.request_type,
    ))]
    pub async fn invoke(&self, request: GatewayRequest) -> Result<GatewayResponse> {
        request.validate()?;

        let verdict = self
            .limiter
            .check_and_consume(&request.caller_id, request.tier)
            .await;
        if !verdict.allowed {
            return Err(GatewayError::RateLimitExceeded {
                remaining: verdict.remaining,
                reset_at: verdict.reset_at,
            });
        }

        // A hit ends the sequence here: no breaker, no provider. A broken
        // cache backend reads as a miss so the serving path stays up.
        match self.cache.get(&request.fingerprint).await {
            Ok(Some(entry)) => {
                self.stats.record_hit();
                debug!(fingerprint = %request.fingerprint, "serving cached response");
                return Ok(GatewayResponse::cached(entry.value));
            }
            Ok(None) => self.stats.record_miss(),
            Err(error) => {
                warn!(error = %error, "cache lookup failed, treating as miss");
                self.stats.record_miss();
            }
        }

        let endpoint = self.endpoint_key(&request);
        let decision = self.breaker.allow(&endpoint);
        if decision == Decision::Reject {
            self.stats.record_fallback();
            debug!(endpoint = %endpoint, "circuit open, serving fallback");
            return Ok(GatewayResponse::fallback(fallback_text(
                request.request_type,
            )));
        }
        let probe = decision == Decision::ProceedAsProbe;

        let mut completion = CompletionRequest::new(request.prompt.clone());
        if let Some(max_tokens) = request.max_tokens {
            completion = completion.with_max_tokens(max_tokens);
        }

        // Dropping the call future on timeout cancels it; the breaker sees
        // exactly one failure either way.
        let timeout = Duration::from_millis(self.config.provider_timeout_ms);
        let outcome = tokio::time::timeout(timeout, self.provider.complete(completion)).await;

        let response = match outcome {
            Err(_elapsed) => {
                self.breaker.record_failure(&endpoint);
                self.stats.record_fallback();
                warn!(
                    endpoint = %endpoint,
                    timeout_ms = self.config.provider_timeout_ms,
                    probe,
                    "provider call timed out, serving fallback"
                );
                return Ok(GatewayResponse::fallback(fallback_text(
                    request.request_type,
                )));
            }
            Ok(Err(error)) => {
                self.breaker.record_failure(&endpoint);
                self.stats.record_fallback();
                warn!(
                    endpoint = %endpoint,
                    error = %error,
                    probe,
                    "provider call failed, serving fallback"
                );
                return Ok(GatewayResponse::fallback(fallback_text(
                    request.request_type,
                )));
            }
            Ok(Ok(response)) => response,
        };

        self.breaker.record_success(&endpoint);

        // Accounting writes are awaited before the response goes back, but
        // their failures are logged, never propagated: the caller keeps the
        // live answer.
        if let Err(error) = self
            .cache
            .put(
                &request.fingerprint,
                response.content.clone(),
                self.config.cache.ttl_for(request.request_type),
            )
            .await
        {
            warn!(error = %error, "cache write failed, response served uncached");
        }

        let usage = response.usage.clone().unwrap_or_default();
        let cost = self
            .pricing
            .cost_for(&response.model, usage.prompt_tokens, usage.completion_tokens);
        let record = CostRecord::new(
            self.clock.now_utc(),
            &request.caller_id,
            request.request_type,
            usage.prompt_tokens,
            usage.completion_tokens,
            cost.total_microdollars(),
        );
        if let Err(error) = self.ledger.append(&record).await {
            error!(
                caller = %request.caller_id,
                cost_micros = record.amount_microdollars,
                error = %error,
                "ledger append failed, cost record lost"
            );
        }

        match self
            .ledger
            .period_spend(period_start(self.clock.now_utc()))
            .await
        {
            Ok(spend) => {
                for alert in self.budget.evaluate(spend) {
                    self.notifier.notify(&alert).await;
                }
            }
            Err(error) => {
                error!(error = %error, "period spend query failed, skipping budget check");
            }
        }

        info!(
            endpoint = %endpoint,
            cost_micros = record.amount_microdollars,
            input_units = record.input_units,
            output_units = record.output_units,
            probe,
            "provider call succeeded"
        );
        Ok(GatewayResponse::live(response.content, response.usage))
    }

    /// Operational snapshot for the admin surface: breaker states, today's
    /// serving counters, and the trailing `days` of spend
    pub async fn admin_snapshot(&self, days: u32) -> Result<GatewaySnapshot> {
        Ok(GatewaySnapshot {
            breakers: self.breaker.snapshot(),
            today: self.stats.snapshot(),
            daily_costs: self.ledger.daily_breakdown(days).await?,
        })
    }
}

/// Build the cache backend named by the settings: Redis when a URL is
/// configured, in-memory otherwise
pub fn cache_from_settings(
    settings: &CacheSettings,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn CacheStore>> {
    match &settings.redis_url {
        Some(url) => Ok(Arc::new(RedisCache::new(url, clock)?)),
        None => Ok(Arc::new(MemoryCache::new(clock))),
    }
}
