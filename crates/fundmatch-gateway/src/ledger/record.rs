//! Cost records and aggregates

use crate::request::RequestType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Spend record for one successful provider call.
///
/// Records are append-only. Nothing in the system mutates or deletes them;
/// aggregation always recomputes from the raw rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    /// Record identifier
    pub id: Uuid,
    /// When the provider call completed
    pub occurred_at: DateTime<Utc>,
    /// Organization the call was made for
    pub caller_id: String,
    /// Kind of request that was billed
    pub request_type: RequestType,
    /// Prompt tokens consumed
    pub input_units: u32,
    /// Completion tokens generated
    pub output_units: u32,
    /// Cost in micro-USD at the prices in effect when the call was made
    pub amount_microdollars: u64,
}

impl CostRecord {
    /// Create a record with a fresh id
    #[must_use]
    pub fn new(
        occurred_at: DateTime<Utc>,
        caller_id: impl Into<String>,
        request_type: RequestType,
        input_units: u32,
        output_units: u32,
        amount_microdollars: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            caller_id: caller_id.into(),
            request_type,
            input_units,
            output_units,
            amount_microdollars,
        }
    }
}

/// Aggregate spend for one UTC day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyCost {
    /// The day, UTC
    pub day: NaiveDate,
    /// Provider calls recorded that day
    pub request_count: u64,
    /// Prompt tokens summed
    pub input_units: u64,
    /// Completion tokens summed
    pub output_units: u64,
    /// Micro-USD summed
    pub amount_microdollars: u64,
}
