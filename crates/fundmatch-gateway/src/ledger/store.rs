//! Ledger storage trait

use super::record::{CostRecord, DailyCost};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage backend for the append-only cost ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append one record
    async fn append(&self, record: &CostRecord) -> Result<()>;

    /// Per-day aggregates for the trailing `days` UTC days including today,
    /// most recent day first. Days with no spend are omitted.
    async fn daily_breakdown(&self, days: u32) -> Result<Vec<DailyCost>>;

    /// Total micro-USD recorded at or after `period_start`
    async fn period_spend(&self, period_start: DateTime<Utc>) -> Result<u64>;
}
