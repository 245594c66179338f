//! End-to-end gateway behavior through the public API: an outage with
//! recovery, cache TTL expiry, monthly quotas, and budget alerting, all
//! driven by a manual clock and a scripted provider.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fundmatch_gateway::{
    compute_fingerprint, BudgetAlert, BudgetNotifier, Gateway, GatewayConfig, GatewayError,
    GatewayRequest, ManualClock, MemoryCache, MemoryLedger, RateLimiter, RequestType, Tier,
    TierLimits,
};
use fundmatch_llm::{CompletionRequest, CompletionResponse, ProviderClient, TokenUsage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

enum Outcome {
    Succeed(&'static str),
    Fail,
}

struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Outcome>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(outcomes: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "gpt-4o-mini"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> fundmatch_llm::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Outcome::Succeed(content)) => Ok(CompletionResponse {
                content: content.to_string(),
                model: "gpt-4o-mini".to_string(),
                usage: Some(TokenUsage {
                    prompt_tokens: 120,
                    completion_tokens: 80,
                    total_tokens: 200,
                }),
                finish_reason: Some("stop".to_string()),
            }),
            _ => Err(fundmatch_llm::Error::Network(
                "connection refused".to_string(),
            )),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<BudgetAlert>>,
}

impl RecordingNotifier {
    fn thresholds(&self) -> Vec<u8> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .map(|alert| alert.threshold_pct)
            .collect()
    }
}

#[async_trait]
impl BudgetNotifier for RecordingNotifier {
    async fn notify(&self, alert: &BudgetAlert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

struct TestStack {
    gateway: Gateway,
    provider: Arc<ScriptedProvider>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
}

fn build_stack(config: GatewayConfig, outcomes: Vec<Outcome>) -> TestStack {
    init_tracing();
    let clock = Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
    ));
    let provider = ScriptedProvider::new(outcomes);
    let notifier = Arc::new(RecordingNotifier::default());
    let gateway = Gateway::new(
        config,
        provider.clone(),
        Arc::new(MemoryCache::new(clock.clone())),
        Arc::new(MemoryLedger::new(clock.clone())),
        notifier.clone(),
        clock.clone(),
    );
    TestStack {
        gateway,
        provider,
        notifier,
        clock,
    }
}

fn explanation_request(caller: &str, fingerprint: &str) -> GatewayRequest {
    GatewayRequest::new(
        caller,
        Tier::Free,
        RequestType::Explanation,
        fingerprint,
        "Explain why this program matches",
    )
}

#[tokio::test]
async fn test_outage_and_probe_recovery() {
    let stack = build_stack(
        GatewayConfig::default(),
        vec![
            Outcome::Fail,
            Outcome::Fail,
            Outcome::Fail,
            Outcome::Fail,
            Outcome::Fail,
            Outcome::Succeed("service restored"),
            Outcome::Succeed("steady state"),
        ],
    );

    // Five provider failures a couple of seconds apart, all inside the
    // 60-second window, each served as fallback
    for n in 0..5 {
        let response = stack
            .gateway
            .invoke(explanation_request("org-1", &format!("fp-{n}")))
            .await
            .unwrap();
        assert!(response.served_as_fallback);
        stack.clock.advance(Duration::from_secs(2));
    }
    assert_eq!(stack.provider.calls(), 5);

    // The circuit is open now: requests stop reaching the provider
    let rejected = stack
        .gateway
        .invoke(explanation_request("org-1", "fp-rejected"))
        .await
        .unwrap();
    assert!(rejected.served_as_fallback);
    assert_eq!(stack.provider.calls(), 5);

    // After the 30-second open timeout one probe goes out and succeeds
    stack.clock.advance(Duration::from_secs(31));
    let probe = stack
        .gateway
        .invoke(explanation_request("org-1", "fp-probe"))
        .await
        .unwrap();
    assert!(!probe.served_as_fallback);
    assert_eq!(probe.content, "service restored");

    // Closed again, normal traffic flows
    let normal = stack
        .gateway
        .invoke(explanation_request("org-1", "fp-after"))
        .await
        .unwrap();
    assert_eq!(normal.content, "steady state");
    assert_eq!(stack.provider.calls(), 7);
}

#[tokio::test]
async fn test_match_set_cache_expires_after_a_day() {
    let stack = build_stack(
        GatewayConfig::default(),
        vec![Outcome::Succeed("ranked matches"), Outcome::Succeed("fresh matches")],
    );

    let fingerprint = compute_fingerprint(
        RequestType::MatchSet,
        "org-profile-v3",
        "prog-552",
        "scoring-v2",
    );
    let request = GatewayRequest::new(
        "org-1",
        Tier::Starter,
        RequestType::MatchSet,
        fingerprint,
        "Rank funding programs for org 1",
    );

    stack.gateway.invoke(request.clone()).await.unwrap();

    // One second later the result is still cached
    stack.clock.advance(Duration::from_secs(1));
    let hit = stack.gateway.invoke(request.clone()).await.unwrap();
    assert!(hit.served_from_cache);
    assert_eq!(hit.content, "ranked matches");

    // Past the 24-hour TTL the entry is gone and the provider is called again
    stack.clock.advance(Duration::from_secs(86_400));
    let refreshed = stack.gateway.invoke(request).await.unwrap();
    assert!(!refreshed.served_from_cache);
    assert_eq!(refreshed.content, "fresh matches");
    assert_eq!(stack.provider.calls(), 2);
}

#[tokio::test]
async fn test_free_tier_monthly_quota() {
    let mut config = GatewayConfig::default();
    config.limits.free_monthly = 2;
    let stack = build_stack(
        config,
        vec![Outcome::Succeed("first"), Outcome::Succeed("second")],
    );

    stack
        .gateway
        .invoke(explanation_request("org-free", "fp-1"))
        .await
        .unwrap();
    stack
        .gateway
        .invoke(explanation_request("org-free", "fp-2"))
        .await
        .unwrap();

    // The third call this month is denied with the next reset time, as a
    // hard error rather than fallback content
    let err = stack
        .gateway
        .invoke(explanation_request("org-free", "fp-3"))
        .await
        .unwrap_err();
    match err {
        GatewayError::RateLimitExceeded { remaining, reset_at } => {
            assert_eq!(remaining, 0);
            assert_eq!(reset_at, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
        }
        other => panic!("expected RateLimitExceeded, got {other:?}"),
    }
    assert_eq!(stack.provider.calls(), 2);

    // A month later the counter has rolled over
    stack.clock.advance(Duration::from_secs(30 * 86_400));
    let response = stack
        .gateway
        .invoke(explanation_request("org-free", "fp-4"))
        .await
        .unwrap();
    // Script is exhausted so the call degrades, but quota admitted it
    assert!(response.served_as_fallback);
    assert_eq!(stack.provider.calls(), 3);
}

#[tokio::test]
async fn test_concurrent_quota_checks_admit_exactly_the_limit() {
    let clock = Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
    ));
    let limits = TierLimits {
        free_monthly: 5,
        ..Default::default()
    };
    let limiter = RateLimiter::new(limits, clock);

    let checks = (0..8).map(|_| {
        let limiter = limiter.clone();
        async move { limiter.check_and_consume("org-race", Tier::Free).await }
    });
    let verdicts = futures::future::join_all(checks).await;

    let allowed = verdicts.iter().filter(|verdict| verdict.allowed).count();
    assert_eq!(allowed, 5);
    assert_eq!(limiter.usage("org-race").await, 5);
}

#[tokio::test]
async fn test_budget_alerts_arrive_as_spend_grows() {
    let mut config = GatewayConfig::default();
    // Each scripted success costs 66 micro-USD
    config.budget.monthly_ceiling_microdollars = 100;
    let stack = build_stack(
        config,
        vec![Outcome::Succeed("first"), Outcome::Succeed("second")],
    );

    let mut request = explanation_request("org-1", "fp-1");
    request.tier = Tier::Starter;
    stack.gateway.invoke(request).await.unwrap();
    assert_eq!(stack.notifier.thresholds(), vec![50]);

    let mut request = explanation_request("org-1", "fp-2");
    request.tier = Tier::Starter;
    stack.gateway.invoke(request).await.unwrap();
    assert_eq!(stack.notifier.thresholds(), vec![50, 80, 100]);
}

#[tokio::test]
async fn test_admin_snapshot_through_public_api() {
    let stack = build_stack(
        GatewayConfig::default(),
        vec![Outcome::Succeed("answer"), Outcome::Fail],
    );

    stack
        .gateway
        .invoke(explanation_request("org-1", "fp-1"))
        .await
        .unwrap();
    stack
        .gateway
        .invoke(explanation_request("org-1", "fp-1"))
        .await
        .unwrap();
    stack
        .gateway
        .invoke(explanation_request("org-1", "fp-2"))
        .await
        .unwrap();

    let snapshot = stack.gateway.admin_snapshot(7).await.unwrap();
    assert_eq!(snapshot.today.cache_hits, 1);
    assert_eq!(snapshot.today.cache_misses, 2);
    assert_eq!(snapshot.today.fallbacks_served, 1);
    assert_eq!(snapshot.breakers.len(), 1);
    assert_eq!(snapshot.breakers[0].endpoint, "scripted:explanation");
    assert_eq!(snapshot.daily_costs.len(), 1);
    assert_eq!(snapshot.daily_costs[0].amount_microdollars, 66);
}
