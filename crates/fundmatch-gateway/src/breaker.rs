//! Circuit breaker for provider endpoints
//!
//! Tracks recent failures per logical endpoint ("openai:explanation") and
//! decides whether a call may proceed, must be rejected, or goes through as
//! a recovery probe. All transitions happen lazily when state is read or
//! updated against the injected clock; there are no background timers.
//!
//! States:
//! - **Closed**: calls flow, failures accumulate in a sliding window
//! - **Open**: calls are rejected without contacting the provider
//! - **Half-open**: the open timeout has elapsed and one trial call is out

use crate::clock::Clock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Failing fast, provider is not contacted
    Open,
    /// Testing recovery with a limited number of probes
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Outcome of asking the breaker for permission to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Circuit closed, call normally
    Proceed,
    /// Circuit testing recovery, this call is the trial
    ProceedAsProbe,
    /// Circuit open, do not contact the provider
    Reject,
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Failures within the window that trip the circuit
    pub failure_threshold: u32,
    /// Sliding window over which failures are counted
    pub failure_window: Duration,
    /// How long the circuit stays open before admitting a probe
    pub open_timeout: Duration,
    /// Concurrent probes allowed while half-open
    pub max_probes: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            open_timeout: Duration::from_secs(30),
            max_probes: 1,
        }
    }
}

impl BreakerConfig {
    /// Create a config with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the failure window
    #[must_use]
    pub fn with_failure_window(mut self, window: Duration) -> Self {
        self.failure_window = window;
        self
    }

    /// Set the open timeout
    #[must_use]
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Set the number of concurrent probes allowed while half-open
    #[must_use]
    pub fn with_max_probes(mut self, max_probes: u32) -> Self {
        self.max_probes = max_probes;
        self
    }
}

// Per-endpoint bookkeeping. Failure events are monotonic millisecond stamps,
// pruned against the window whenever the entry is touched.
struct EndpointState {
    status: CircuitState,
    failure_events: Vec<u64>,
    opened_at: Option<u64>,
    probes_in_flight: u32,
}

impl EndpointState {
    fn new() -> Self {
        Self {
            status: CircuitState::Closed,
            failure_events: Vec::new(),
            opened_at: None,
            probes_in_flight: 0,
        }
    }

    fn prune(&mut self, now: u64, window_ms: u64) {
        self.failure_events
            .retain(|&stamp| now.saturating_sub(stamp) < window_ms);
    }
}

/// Point-in-time view of one endpoint, for the admin surface
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSnapshot {
    /// Endpoint key
    pub endpoint: String,
    /// Current circuit state
    pub state: CircuitState,
    /// Failures still inside the sliding window
    pub recent_failures: u32,
    /// Probes currently out
    pub probes_in_flight: u32,
    /// How long the circuit has been open, when it is
    pub open_for_ms: Option<u64>,
}

/// Keyed circuit breaker.
///
/// Every decision and transition runs under one write lock, so concurrent
/// callers racing into half-open are serialized and exactly `max_probes`
/// of them get the probe slot.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    endpoints: Arc<RwLock<HashMap<String, EndpointState>>>,
}

impl CircuitBreaker {
    /// Create a breaker with the given configuration and clock
    #[must_use]
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            endpoints: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Ask whether a call to `endpoint` may go out.
    ///
    /// This is the only method that admits probes: an open circuit whose
    /// timeout has elapsed flips to half-open here, and the caller that
    /// observed the flip owns the probe.
    #[must_use]
    pub fn allow(&self, endpoint: &str) -> Decision {
        let now = self.clock.monotonic_millis();
        let window_ms = self.config.failure_window.as_millis() as u64;
        let open_timeout_ms = self.config.open_timeout.as_millis() as u64;

        let mut endpoints = self.endpoints.write().unwrap();
        let state = endpoints
            .entry(endpoint.to_string())
            .or_insert_with(EndpointState::new);
        state.prune(now, window_ms);

        match state.status {
            CircuitState::Closed => Decision::Proceed,
            CircuitState::Open => {
                let opened_at = state.opened_at.unwrap_or(now);
                if now.saturating_sub(opened_at) >= open_timeout_ms
                    && state.probes_in_flight < self.config.max_probes
                {
                    state.status = CircuitState::HalfOpen;
                    state.probes_in_flight += 1;
                    info!(endpoint = %endpoint, "circuit breaker half-open, admitting probe");
                    Decision::ProceedAsProbe
                } else {
                    debug!(endpoint = %endpoint, "circuit breaker open, rejecting call");
                    Decision::Reject
                }
            }
            CircuitState::HalfOpen => {
                if state.probes_in_flight < self.config.max_probes {
                    state.probes_in_flight += 1;
                    Decision::ProceedAsProbe
                } else {
                    debug!(endpoint = %endpoint, "probe already in flight, rejecting call");
                    Decision::Reject
                }
            }
        }
    }

    /// Record a failed provider call.
    ///
    /// A failed probe reopens the circuit and restarts the open timer. In
    /// the closed state, crossing the threshold trips the circuit.
    pub fn record_failure(&self, endpoint: &str) {
        let now = self.clock.monotonic_millis();
        let window_ms = self.config.failure_window.as_millis() as u64;

        let mut endpoints = self.endpoints.write().unwrap();
        let state = endpoints
            .entry(endpoint.to_string())
            .or_insert_with(EndpointState::new);
        state.prune(now, window_ms);
        state.failure_events.push(now);

        match state.status {
            CircuitState::Closed => {
                let failures = state.failure_events.len() as u32;
                debug!(
                    endpoint = %endpoint,
                    failures,
                    threshold = self.config.failure_threshold,
                    "provider failure recorded"
                );
                if failures >= self.config.failure_threshold {
                    state.status = CircuitState::Open;
                    state.opened_at = Some(now);
                    warn!(endpoint = %endpoint, failures, "circuit breaker opened");
                }
            }
            CircuitState::HalfOpen => {
                state.status = CircuitState::Open;
                state.opened_at = Some(now);
                state.probes_in_flight = state.probes_in_flight.saturating_sub(1);
                warn!(endpoint = %endpoint, "probe failed, circuit breaker reopened");
            }
            CircuitState::Open => {
                // Late failure from a call admitted before the circuit
                // opened. The open timer is not restarted.
            }
        }
    }

    /// Record a successful provider call.
    ///
    /// A successful probe closes the circuit and clears the failure
    /// history. Success in the closed state changes nothing beyond pruning;
    /// in particular it does not reset the failure window.
    pub fn record_success(&self, endpoint: &str) {
        let now = self.clock.monotonic_millis();
        let window_ms = self.config.failure_window.as_millis() as u64;

        let mut endpoints = self.endpoints.write().unwrap();
        let state = match endpoints.get_mut(endpoint) {
            Some(state) => state,
            None => return,
        };
        state.prune(now, window_ms);

        match state.status {
            CircuitState::HalfOpen => {
                state.status = CircuitState::Closed;
                state.failure_events.clear();
                state.opened_at = None;
                state.probes_in_flight = state.probes_in_flight.saturating_sub(1);
                info!(endpoint = %endpoint, "probe succeeded, circuit breaker closed");
            }
            CircuitState::Closed => {}
            CircuitState::Open => {
                // Late success from a pre-open call. Recovery still has to
                // go through a probe.
            }
        }
    }

    /// Current state of an endpoint. Reading state never admits a probe.
    #[must_use]
    pub fn state(&self, endpoint: &str) -> CircuitState {
        let now = self.clock.monotonic_millis();
        let window_ms = self.config.failure_window.as_millis() as u64;

        let mut endpoints = self.endpoints.write().unwrap();
        match endpoints.get_mut(endpoint) {
            Some(state) => {
                state.prune(now, window_ms);
                state.status
            }
            None => CircuitState::Closed,
        }
    }

    /// Failures inside the sliding window for an endpoint
    #[must_use]
    pub fn failure_count(&self, endpoint: &str) -> u32 {
        let now = self.clock.monotonic_millis();
        let window_ms = self.config.failure_window.as_millis() as u64;

        let mut endpoints = self.endpoints.write().unwrap();
        match endpoints.get_mut(endpoint) {
            Some(state) => {
                state.prune(now, window_ms);
                state.failure_events.len() as u32
            }
            None => 0,
        }
    }

    /// Snapshot of all tracked endpoints, sorted by endpoint key
    #[must_use]
    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        let now = self.clock.monotonic_millis();
        let window_ms = self.config.failure_window.as_millis() as u64;

        let mut endpoints = self.endpoints.write().unwrap();
        let mut snapshots: Vec<EndpointSnapshot> = endpoints
            .iter_mut()
            .map(|(endpoint, state)| {
                state.prune(now, window_ms);
                EndpointSnapshot {
                    endpoint: endpoint.clone(),
                    state: state.status,
                    recent_failures: state.failure_events.len() as u32,
                    probes_in_flight: state.probes_in_flight,
                    open_for_ms: state.opened_at.map(|stamp| now.saturating_sub(stamp)),
                }
            })
            .collect();
        snapshots.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        snapshots
    }
}
