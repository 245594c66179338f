//! Append-only cost ledger
//!
//! Every successful provider call writes one immutable [`CostRecord`].
//! Aggregation (daily breakdowns, period spend) happens at read time, and a
//! [`BudgetWatch`] compares period spend against a monthly ceiling,
//! reporting each threshold at most once per month. Failed and
//! fallback-served calls cost nothing and are never recorded.

pub mod budget;
pub mod memory;
pub mod record;
pub mod sqlite;
pub mod store;

pub use budget::{BudgetAlert, BudgetConfig, BudgetNotifier, BudgetWatch, LogNotifier};
pub use memory::MemoryLedger;
pub use record::{CostRecord, DailyCost};
pub use sqlite::SqliteLedger;
pub use store::LedgerStore;
