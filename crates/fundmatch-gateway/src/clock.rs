//! Time sources
//!
//! Breaker windows, cache TTLs and quota periods are all evaluated lazily
//! against an injected clock. Nothing in this crate spawns a timer; tests
//! drive every transition by advancing a manual clock.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Clock abstraction over monotonic and wall-clock time.
///
/// Monotonic milliseconds feed failure windows and open timers, which must
/// never run backwards. Wall-clock UTC feeds calendar periods (quota months,
/// cache expiry stamps, ledger timestamps).
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin, never decreasing
    fn monotonic_millis(&self) -> u64;

    /// Current wall-clock time in UTC
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by `Instant` and `Utc::now`
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a system clock anchored at construction time
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
///
/// Monotonic and wall time move together: `advance` shifts both, so a test
/// that skips 31 simulated seconds ages breaker timers and calendar time
/// consistently.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicU64,
    epoch: DateTime<Utc>,
}

impl ManualClock {
    /// Clock starting at the given wall-clock instant with monotonic zero
    #[must_use]
    pub fn starting_at(epoch: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicU64::new(0),
            epoch,
        }
    }

    /// Advance by a duration
    pub fn advance(&self, duration: Duration) {
        self.advance_millis(duration.as_millis() as u64);
    }

    /// Advance by milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(Utc::now())
    }
}

impl Clock for ManualClock {
    fn monotonic_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.epoch + ChronoDuration::milliseconds(self.millis.load(Ordering::SeqCst) as i64)
    }
}

// ============================================================================
// Calendar Periods
// ============================================================================

/// Key of the calendar month containing `now`, e.g. "2026-08".
///
/// Quota counters and budget alert state are scoped to this key; comparing
/// keys is how both roll over lazily.
#[must_use]
pub fn period_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// First instant of the calendar month containing `now`
#[must_use]
pub fn period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    month_start(now.year(), now.month()).unwrap_or(now)
}

/// First instant of the month after the one containing `now`
#[must_use]
pub fn next_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    month_start(year, month).unwrap_or(now)
}

// Day 1 at midnight is always constructible for a valid month
fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
