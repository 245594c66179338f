//! In-memory ledger backend

use super::record::{CostRecord, DailyCost};
use super::store::LedgerStore;
use crate::clock::Clock;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory ledger for tests and single-node deployments
#[derive(Clone)]
pub struct MemoryLedger {
    records: Arc<RwLock<Vec<CostRecord>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }

    /// Number of records appended so far
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// All records for one caller, oldest first
    pub async fn records_for(&self, caller_id: &str) -> Vec<CostRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| record.caller_id == caller_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn append(&self, record: &CostRecord) -> Result<()> {
        debug!(
            caller = %record.caller_id,
            request_type = %record.request_type,
            micros = record.amount_microdollars,
            "cost record appended"
        );
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn daily_breakdown(&self, days: u32) -> Result<Vec<DailyCost>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let today = self.clock.now_utc().date_naive();
        let cutoff = today - ChronoDuration::days(i64::from(days - 1));

        let records = self.records.read().await;
        let mut by_day: BTreeMap<NaiveDate, DailyCost> = BTreeMap::new();
        for record in records.iter() {
            let day = record.occurred_at.date_naive();
            if day < cutoff || day > today {
                continue;
            }
            let daily = by_day.entry(day).or_insert_with(|| DailyCost {
                day,
                ..Default::default()
            });
            daily.request_count += 1;
            daily.input_units += u64::from(record.input_units);
            daily.output_units += u64::from(record.output_units);
            daily.amount_microdollars = daily
                .amount_microdollars
                .saturating_add(record.amount_microdollars);
        }
        Ok(by_day.into_values().rev().collect())
    }

    async fn period_spend(&self, period_start: DateTime<Utc>) -> Result<u64> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.occurred_at >= period_start)
            .fold(0u64, |total, record| {
                total.saturating_add(record.amount_microdollars)
            }))
    }
}
