//! Tests for the quota token bucket

use super::*;
use std::time::Duration;

#[test]
fn test_initial_quota_consumed_down_to_zero() {
    // Rate 0 means no refill, so consumption is exact
    let quota = QuotaTracker::new(3.0, 30.0, 0.0);

    assert!(quota.try_consume());
    assert!(quota.try_consume());
    assert!(quota.try_consume());
    assert!(!quota.try_consume());
    assert_eq!(quota.current(), 0.0);
}

#[test]
fn test_refill_over_elapsed_time() {
    let quota = QuotaTracker::new(0.0, 30.0, 0.5);
    let start = Instant::now();

    assert!(!quota.try_consume_at(start));

    // After 2 seconds at 0.5/s the bucket holds exactly one document
    assert!(quota.try_consume_at(start + Duration::from_secs(2)));
    assert!(!quota.try_consume_at(start + Duration::from_secs(2)));
}

#[test]
fn test_refill_capped_at_max() {
    let quota = QuotaTracker::new(0.0, 2.0, 1.0);
    let start = Instant::now();

    // An hour of idle accrual still caps at max
    let later = start + Duration::from_secs(3600);
    assert!(quota.try_consume_at(later));
    assert!(quota.try_consume_at(later));
    assert!(!quota.try_consume_at(later));
}

#[test]
fn test_initial_clamped_to_max() {
    let quota = QuotaTracker::new(100.0, 5.0, 0.0);
    assert_eq!(quota.current(), 5.0);
}

#[test]
fn test_carried_over_preserves_level() {
    let quota = QuotaTracker::new(3.0, 30.0, 0.0);
    assert!(quota.try_consume());

    let carried = quota.carried_over(30.0, 0.0);
    assert_eq!(carried.current(), 2.0);
    assert_eq!(carried.max(), 30.0);
}

#[test]
fn test_defaults() {
    let quota = QuotaTracker::with_defaults();
    assert_eq!(quota.current(), DEFAULT_INITIAL_QUOTA);
    assert_eq!(quota.max(), DEFAULT_MAX_QUOTA);
    assert_eq!(quota.rate_per_sec(), DEFAULT_RATE_PER_SEC);
}

#[test]
fn test_concurrent_consumption_never_oversells() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    let quota = Arc::new(QuotaTracker::new(10.0, 10.0, 0.0));
    let granted = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let quota = Arc::clone(&quota);
            let granted = Arc::clone(&granted);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    if quota.try_consume() {
                        granted.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(granted.load(Ordering::Relaxed), 10);
}
