//! Token-bucket quota for document streams
//!
//! Each document stream may forward a bounded number of full documents.
//! The bucket replenishes continuously at `rate` documents per second up
//! to `max`, and refill is computed lazily from elapsed monotonic time -
//! there is no background task topping buckets up.

use std::time::Instant;

use parking_lot::Mutex;

/// Quota a brand-new stream starts with
pub(crate) const DEFAULT_INITIAL_QUOTA: f64 = 3.0;

/// Upper bound the bucket replenishes toward
pub(crate) const DEFAULT_MAX_QUOTA: f64 = 30.0;

/// Default replenishment rate, documents per second
pub(crate) const DEFAULT_RATE_PER_SEC: f64 = 0.5;

#[derive(Debug)]
struct BucketState {
    current: f64,
    last_refill: Instant,
}

/// Token bucket guarding one document stream.
///
/// `try_consume` is called from every thread handling telemetry, so the
/// critical section is a couple of float operations under a narrow mutex.
#[derive(Debug)]
pub struct QuotaTracker {
    max: f64,
    rate_per_sec: f64,
    state: Mutex<BucketState>,
}

impl QuotaTracker {
    /// Create a bucket with an explicit starting level
    pub fn new(initial: f64, max: f64, rate_per_sec: f64) -> Self {
        let max = max.max(0.0);
        Self {
            max,
            rate_per_sec: rate_per_sec.max(0.0),
            state: Mutex::new(BucketState {
                current: initial.clamp(0.0, max),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Create a bucket with the engine defaults
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_INITIAL_QUOTA, DEFAULT_MAX_QUOTA, DEFAULT_RATE_PER_SEC)
    }

    /// Try to consume one document's worth of quota
    pub fn try_consume(&self) -> bool {
        self.try_consume_at(Instant::now())
    }

    /// Clock-injected variant backing `try_consume`; also used by tests
    pub fn try_consume_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();

        let elapsed = now.saturating_duration_since(state.last_refill);
        state.current = (state.current + elapsed.as_secs_f64() * self.rate_per_sec).min(self.max);
        state.last_refill = now;

        if state.current >= 1.0 {
            state.current -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current bucket level, without refilling
    pub fn current(&self) -> f64 {
        self.state.lock().current
    }

    /// Upper bound of the bucket
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Replenishment rate, documents per second
    pub fn rate_per_sec(&self) -> f64 {
        self.rate_per_sec
    }

    /// New bucket carrying this bucket's current level, with the given
    /// bounds. Used to preserve a surviving stream's quota across
    /// reconfiguration.
    pub fn carried_over(&self, max: f64, rate_per_sec: f64) -> Self {
        Self::new(self.current(), max, rate_per_sec)
    }
}

#[cfg(test)]
#[path = "quota_test.rs"]
mod tests;
