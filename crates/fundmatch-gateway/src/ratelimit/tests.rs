//! Tests for the rate limiter

use super::*;
use crate::clock::ManualClock;
use chrono::{Duration, TimeZone};

fn march_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
    ))
}

fn free_limits(free_monthly: u64) -> TierLimits {
    TierLimits {
        free_monthly,
        ..Default::default()
    }
}

#[test]
fn test_zero_configured_limit_means_unlimited() {
    let limits = TierLimits::default();
    assert_eq!(limits.limit_for(Tier::Free), 10);
    assert_eq!(limits.limit_for(Tier::Starter), 200);
    assert_eq!(limits.limit_for(Tier::Pro), u64::MAX);
}

#[tokio::test]
async fn test_allows_up_to_the_limit_then_denies() {
    let limiter = RateLimiter::new(free_limits(2), march_clock());

    let first = limiter.check_and_consume("org-1", Tier::Free).await;
    assert!(first.allowed);
    assert_eq!(first.remaining, 1);
    assert_eq!(first.used, 1);

    let second = limiter.check_and_consume("org-1", Tier::Free).await;
    assert!(second.allowed);
    assert_eq!(second.remaining, 0);
    assert_eq!(second.used, 2);

    let third = limiter.check_and_consume("org-1", Tier::Free).await;
    assert!(!third.allowed);
    assert_eq!(third.remaining, 0);
    assert_eq!(third.used, 2);
    assert_eq!(
        third.reset_at,
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_denials_do_not_inflate_usage() {
    let limiter = RateLimiter::new(free_limits(2), march_clock());

    limiter.check_and_consume("org-1", Tier::Free).await;
    limiter.check_and_consume("org-1", Tier::Free).await;
    for _ in 0..5 {
        let verdict = limiter.check_and_consume("org-1", Tier::Free).await;
        assert!(!verdict.allowed);
    }

    assert_eq!(limiter.usage("org-1").await, 2);
}

#[tokio::test]
async fn test_remaining_counts_down_within_a_period() {
    let limiter = RateLimiter::new(free_limits(5), march_clock());

    let mut remaining = Vec::new();
    for _ in 0..5 {
        let verdict = limiter.check_and_consume("org-1", Tier::Free).await;
        assert!(verdict.allowed);
        remaining.push(verdict.remaining);
    }

    assert_eq!(remaining, vec![4, 3, 2, 1, 0]);
}

#[tokio::test]
async fn test_callers_have_independent_counters() {
    let limiter = RateLimiter::new(free_limits(1), march_clock());

    assert!(limiter.check_and_consume("org-1", Tier::Free).await.allowed);
    assert!(!limiter.check_and_consume("org-1", Tier::Free).await.allowed);

    // A different caller is unaffected
    assert!(limiter.check_and_consume("org-2", Tier::Free).await.allowed);
}

#[tokio::test]
async fn test_unlimited_tier_runs_the_same_path() {
    let limiter = RateLimiter::new(TierLimits::default(), march_clock());

    for call in 1..=1_000u64 {
        let verdict = limiter.check_and_consume("org-big", Tier::Pro).await;
        assert!(verdict.allowed);
        assert_eq!(verdict.used, call);
        assert!(verdict.remaining > 1_000_000);
    }

    assert_eq!(limiter.usage("org-big").await, 1_000);
}

#[tokio::test]
async fn test_counter_rolls_over_at_month_boundary() {
    let clock = march_clock();
    let limiter = RateLimiter::new(free_limits(2), clock.clone());

    limiter.check_and_consume("org-1", Tier::Free).await;
    limiter.check_and_consume("org-1", Tier::Free).await;
    assert!(!limiter.check_and_consume("org-1", Tier::Free).await.allowed);

    // March 10th plus 22 days lands in April
    clock.advance(Duration::days(22).to_std().unwrap());

    let verdict = limiter.check_and_consume("org-1", Tier::Free).await;
    assert!(verdict.allowed);
    assert_eq!(verdict.used, 1);
    assert_eq!(
        verdict.reset_at,
        Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_tier_upgrade_keeps_period_usage() {
    let limiter = RateLimiter::new(free_limits(2), march_clock());

    limiter.check_and_consume("org-1", Tier::Free).await;
    limiter.check_and_consume("org-1", Tier::Free).await;
    assert!(!limiter.check_and_consume("org-1", Tier::Free).await.allowed);

    // Upgrading mid-month keeps the calls already consumed
    let verdict = limiter.check_and_consume("org-1", Tier::Starter).await;
    assert!(verdict.allowed);
    assert_eq!(verdict.used, 3);
}

#[tokio::test]
async fn test_usage_and_reset() {
    let limiter = RateLimiter::new(free_limits(2), march_clock());

    assert_eq!(limiter.usage("org-1").await, 0);
    limiter.check_and_consume("org-1", Tier::Free).await;
    limiter.check_and_consume("org-1", Tier::Free).await;
    assert_eq!(limiter.usage("org-1").await, 2);

    limiter.reset("org-1").await;
    assert_eq!(limiter.usage("org-1").await, 0);
    assert!(limiter.check_and_consume("org-1", Tier::Free).await.allowed);
}
