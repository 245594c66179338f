//! SQLite ledger backend
//!
//! The durable default. One row per cost record; daily breakdowns and
//! period totals are computed in SQL over the RFC 3339 `occurred_at`
//! column, which sorts lexicographically in timestamp order.

use super::record::{CostRecord, DailyCost};
use super::store::LedgerStore;
use crate::clock::Clock;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// SQLite-backed cost ledger
pub struct SqliteLedger {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteLedger {
    /// Open the ledger database at `path`, creating it if missing
    pub async fn new(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| GatewayError::Storage(format!("invalid database path: {}", e)))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| GatewayError::Storage(format!("database connection failed: {}", e)))?;

        let ledger = Self { pool, clock };
        ledger.init_schema().await?;
        info!(path = %path.display(), "cost ledger database ready");
        Ok(ledger)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cost_records (
                id TEXT PRIMARY KEY,
                occurred_at TEXT NOT NULL,
                caller_id TEXT NOT NULL,
                request_type TEXT NOT NULL,
                input_units INTEGER NOT NULL,
                output_units INTEGER NOT NULL,
                amount_microdollars INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::Storage(format!("schema init failed: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cost_records_occurred_at
             ON cost_records(occurred_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::Storage(format!("index init failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn append(&self, record: &CostRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO cost_records
             (id, occurred_at, caller_id, request_type, input_units, output_units, amount_microdollars)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.occurred_at.to_rfc3339())
        .bind(&record.caller_id)
        .bind(record.request_type.as_str())
        .bind(i64::from(record.input_units))
        .bind(i64::from(record.output_units))
        .bind(record.amount_microdollars as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::Storage(format!("ledger append failed: {}", e)))?;

        debug!(
            caller = %record.caller_id,
            micros = record.amount_microdollars,
            "cost record appended"
        );
        Ok(())
    }

    async fn daily_breakdown(&self, days: u32) -> Result<Vec<DailyCost>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let today = self.clock.now_utc().date_naive();
        let cutoff = today - ChronoDuration::days(i64::from(days - 1));
        let cutoff_stamp = format!("{}T00:00:00+00:00", cutoff);

        let rows: Vec<(String, i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT substr(occurred_at, 1, 10) AS day,
                    COUNT(*),
                    COALESCE(SUM(input_units), 0),
                    COALESCE(SUM(output_units), 0),
                    COALESCE(SUM(amount_microdollars), 0)
             FROM cost_records
             WHERE occurred_at >= ?
             GROUP BY day
             ORDER BY day DESC",
        )
        .bind(&cutoff_stamp)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::Storage(format!("daily breakdown query failed: {}", e)))?;

        rows.into_iter()
            .map(|(day, count, input, output, micros)| {
                let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .map_err(|e| GatewayError::Storage(format!("bad day in ledger: {}", e)))?;
                Ok(DailyCost {
                    day,
                    request_count: count.max(0) as u64,
                    input_units: input.max(0) as u64,
                    output_units: output.max(0) as u64,
                    amount_microdollars: micros.max(0) as u64,
                })
            })
            .collect()
    }

    async fn period_spend(&self, period_start: DateTime<Utc>) -> Result<u64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount_microdollars), 0)
             FROM cost_records
             WHERE occurred_at >= ?",
        )
        .bind(period_start.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::Storage(format!("period spend query failed: {}", e)))?;

        Ok(row.0.max(0) as u64)
    }
}
