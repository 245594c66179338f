//! Budget threshold alerts
//!
//! Compares period spend against a monthly ceiling and reports each
//! configured percent threshold at most once per calendar month. Crossing
//! the budget never blocks calls; what happens with an alert is the
//! notifier's concern.

use crate::clock::{period_key, Clock};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Budget alerting configuration
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    /// Monthly ceiling in micro-USD. Zero disables alerting.
    pub monthly_ceiling_microdollars: u64,
    /// Percent thresholds reported once each per month
    pub thresholds: Vec<u8>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            monthly_ceiling_microdollars: 0,
            thresholds: vec![50, 80, 100],
        }
    }
}

impl BudgetConfig {
    /// Config with the given ceiling and the default 50/80/100 thresholds
    #[must_use]
    pub fn with_ceiling(monthly_ceiling_microdollars: u64) -> Self {
        Self {
            monthly_ceiling_microdollars,
            ..Default::default()
        }
    }

    /// Replace the percent thresholds
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Vec<u8>) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// One threshold crossing
#[derive(Debug, Clone, Serialize)]
pub struct BudgetAlert {
    /// Threshold crossed, percent of the ceiling
    pub threshold_pct: u8,
    /// Spend at evaluation time, micro-USD
    pub period_spend_microdollars: u64,
    /// The configured ceiling, micro-USD
    pub ceiling_microdollars: u64,
    /// Month the alert belongs to ("2026-08")
    pub period: String,
}

/// Delivery seam for budget alerts
#[async_trait]
pub trait BudgetNotifier: Send + Sync {
    /// Deliver one alert
    async fn notify(&self, alert: &BudgetAlert);
}

/// Default notifier: a structured warning in the service log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl BudgetNotifier for LogNotifier {
    async fn notify(&self, alert: &BudgetAlert) {
        warn!(
            threshold_pct = alert.threshold_pct,
            spend_micros = alert.period_spend_microdollars,
            ceiling_micros = alert.ceiling_microdollars,
            period = %alert.period,
            "budget threshold crossed"
        );
    }
}

struct WatchState {
    period: String,
    crossed: HashSet<u8>,
}

/// Tracks which thresholds have fired in the current month.
///
/// `evaluate` is an atomic check-and-mark under one lock, so concurrent
/// evaluations of the same spend level report each crossing exactly once.
/// Crossed thresholds clear when the calendar month rolls over.
pub struct BudgetWatch {
    config: BudgetConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<WatchState>,
}

impl BudgetWatch {
    /// Create a watch over the given budget
    #[must_use]
    pub fn new(config: BudgetConfig, clock: Arc<dyn Clock>) -> Self {
        let period = period_key(clock.now_utc());
        Self {
            config,
            clock,
            state: Mutex::new(WatchState {
                period,
                crossed: HashSet::new(),
            }),
        }
    }

    /// Report thresholds newly crossed at this spend level.
    ///
    /// Spend exactly at a threshold counts as crossed. Already-reported
    /// thresholds stay silent until the month rolls over.
    pub fn evaluate(&self, period_spend_microdollars: u64) -> Vec<BudgetAlert> {
        if self.config.monthly_ceiling_microdollars == 0 {
            return Vec::new();
        }

        let period = period_key(self.clock.now_utc());
        let mut state = self.state.lock().unwrap();
        if state.period != period {
            state.period = period.clone();
            state.crossed.clear();
        }

        let ceiling = self.config.monthly_ceiling_microdollars;
        let mut alerts = Vec::new();
        for &pct in &self.config.thresholds {
            if state.crossed.contains(&pct) {
                continue;
            }
            if period_spend_microdollars >= threshold_amount(ceiling, pct) {
                state.crossed.insert(pct);
                alerts.push(BudgetAlert {
                    threshold_pct: pct,
                    period_spend_microdollars,
                    ceiling_microdollars: ceiling,
                    period: period.clone(),
                });
            }
        }
        alerts
    }

    /// Thresholds already reported this month, sorted ascending
    #[must_use]
    pub fn crossed(&self) -> Vec<u8> {
        let state = self.state.lock().unwrap();
        let mut crossed: Vec<u8> = state.crossed.iter().copied().collect();
        crossed.sort_unstable();
        crossed
    }
}

// Widened so ceiling * pct cannot overflow before the division
fn threshold_amount(ceiling: u64, pct: u8) -> u64 {
    let amount = u128::from(ceiling) * u128::from(pct) / 100;
    u64::try_from(amount).unwrap_or(u64::MAX)
}
