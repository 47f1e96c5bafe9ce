//! Double-buffered counter accumulation
//!
//! `Accumulator` holds the counters for one collection interval. Exactly
//! one accumulator is current at any instant; telemetry threads load the
//! current handle once per operation and increment lock-free atomics. The
//! collection tick swaps in a fresh accumulator and folds the old one into
//! a sample.
//!
//! The swap in `complete_current` is the only point of contention: an
//! increment that raced the swap lands wholly in the returned snapshot or
//! wholly in the new accumulator, never in neither and never in both.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use pulse_filtering::CollectionConfiguration;
use pulse_protocol::{Aggregation, TelemetryItem};

use crate::sample::MetricValue;

/// Upper bound on documents buffered per interval; quota normally keeps
/// the count far below this
const MAX_DOCUMENTS: usize = 500;

/// A telemetry item that matched at least one document stream.
#[derive(Debug, Clone)]
pub struct TelemetryDocument {
    /// The matched item
    pub item: TelemetryItem,
    /// Ids of the streams whose quota admitted the document
    pub matching_streams: Vec<String>,
    /// When the item was seen
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MetricState {
    sum: f64,
    count: u64,
    min: f64,
    max: f64,
}

#[derive(Debug)]
struct MetricSlot {
    aggregation: Aggregation,
    state: Mutex<MetricState>,
}

/// Counters for one collection interval.
#[derive(Debug)]
pub struct Accumulator {
    config: Arc<CollectionConfiguration>,
    start: DateTime<Utc>,

    request_count: AtomicU64,
    request_duration_ns: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,

    dependency_count: AtomicU64,
    dependency_duration_ns: AtomicU64,
    dependencies_succeeded: AtomicU64,
    dependencies_failed: AtomicU64,

    exception_count: AtomicU64,

    documents: Mutex<Vec<TelemetryDocument>>,
    metrics: HashMap<String, MetricSlot>,
}

impl Accumulator {
    /// Create an empty accumulator seeded with a configuration. Metric
    /// slots are laid out up front so tracking is a map lookup plus a
    /// narrow lock, never an allocation.
    pub fn new(config: Arc<CollectionConfiguration>) -> Self {
        let metrics = config
            .metrics()
            .iter()
            .map(|m| {
                (
                    m.id.clone(),
                    MetricSlot {
                        aggregation: m.aggregation,
                        state: Mutex::new(MetricState::default()),
                    },
                )
            })
            .collect();

        Self {
            config,
            start: Utc::now(),
            request_count: AtomicU64::new(0),
            request_duration_ns: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            dependency_count: AtomicU64::new(0),
            dependency_duration_ns: AtomicU64::new(0),
            dependencies_succeeded: AtomicU64::new(0),
            dependencies_failed: AtomicU64::new(0),
            exception_count: AtomicU64::new(0),
            documents: Mutex::new(Vec::new()),
            metrics,
        }
    }

    /// The configuration this accumulator was seeded with
    pub fn config(&self) -> &Arc<CollectionConfiguration> {
        &self.config
    }

    /// When this accumulator became current
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Record one handled request
    pub fn add_request(&self, duration: Duration, success: bool) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.request_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if success {
            self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one dependency call
    pub fn add_dependency(&self, duration: Duration, success: bool) {
        self.dependency_count.fetch_add(1, Ordering::Relaxed);
        self.dependency_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if success {
            self.dependencies_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dependencies_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one tracked exception
    pub fn add_exception(&self) {
        self.exception_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold a value into a tracked metric. Returns false when the metric
    /// id is not part of this accumulator's configuration.
    pub fn track_metric(&self, id: &str, value: f64) -> bool {
        let Some(slot) = self.metrics.get(id) else {
            return false;
        };

        let mut state = slot.state.lock();
        if state.count == 0 {
            state.min = value;
            state.max = value;
        } else {
            state.min = state.min.min(value);
            state.max = state.max.max(value);
        }
        state.sum += value;
        state.count += 1;
        true
    }

    /// Buffer a matched document. Returns false when the interval's
    /// document buffer is full.
    pub fn add_document(&self, document: TelemetryDocument) -> bool {
        let mut documents = self.documents.lock();
        if documents.len() >= MAX_DOCUMENTS {
            return false;
        }
        documents.push(document);
        true
    }

    /// Read the counter values
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            request_count: self.request_count.load(Ordering::Relaxed),
            request_duration: Duration::from_nanos(
                self.request_duration_ns.load(Ordering::Relaxed),
            ),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            dependency_count: self.dependency_count.load(Ordering::Relaxed),
            dependency_duration: Duration::from_nanos(
                self.dependency_duration_ns.load(Ordering::Relaxed),
            ),
            dependencies_succeeded: self.dependencies_succeeded.load(Ordering::Relaxed),
            dependencies_failed: self.dependencies_failed.load(Ordering::Relaxed),
            exception_count: self.exception_count.load(Ordering::Relaxed),
        }
    }

    /// Take the buffered documents, leaving the buffer empty
    pub fn take_documents(&self) -> Vec<TelemetryDocument> {
        std::mem::take(&mut *self.documents.lock())
    }

    /// The aggregated value of every metric that saw at least one sample
    pub fn metric_values(&self) -> Vec<MetricValue> {
        let mut values: Vec<MetricValue> = self
            .metrics
            .iter()
            .filter_map(|(id, slot)| {
                let state = slot.state.lock();
                if state.count == 0 {
                    return None;
                }
                let value = match slot.aggregation {
                    Aggregation::Avg => state.sum / state.count as f64,
                    Aggregation::Sum => state.sum,
                    Aggregation::Min => state.min,
                    Aggregation::Max => state.max,
                };
                Some(MetricValue {
                    id: id.clone(),
                    value,
                    count: state.count,
                })
            })
            .collect();

        // Map iteration order is arbitrary; keep sample content deterministic
        values.sort_by(|a, b| a.id.cmp(&b.id));
        values
    }
}

/// Plain counter values read from an accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Requests seen in the interval
    pub request_count: u64,
    /// Summed request duration
    pub request_duration: Duration,
    /// Requests that succeeded
    pub requests_succeeded: u64,
    /// Requests that failed
    pub requests_failed: u64,
    /// Dependency calls seen in the interval
    pub dependency_count: u64,
    /// Summed dependency duration
    pub dependency_duration: Duration,
    /// Dependency calls that succeeded
    pub dependencies_succeeded: u64,
    /// Dependency calls that failed
    pub dependencies_failed: u64,
    /// Exceptions seen in the interval
    pub exception_count: u64,
}

/// Owner of the current accumulator handle.
///
/// Producers call `current()` per operation; the collection tick calls
/// `complete_current` to seal the interval.
#[derive(Debug)]
pub struct AccumulatorManager {
    current: ArcSwap<Accumulator>,
}

impl AccumulatorManager {
    /// Create a manager whose first accumulator is seeded with `config`
    pub fn new(config: Arc<CollectionConfiguration>) -> Self {
        Self {
            current: ArcSwap::from_pointee(Accumulator::new(config)),
        }
    }

    /// The accumulator to record into right now. Load the handle once per
    /// operation; holding it across operations would leak increments past
    /// the next swap boundary.
    pub fn current(&self) -> Arc<Accumulator> {
        self.current.load_full()
    }

    /// Seal the current interval: atomically install a fresh accumulator
    /// seeded with `next_config` and return the sealed one.
    pub fn complete_current(
        &self,
        next_config: Arc<CollectionConfiguration>,
    ) -> Arc<Accumulator> {
        self.current.swap(Arc::new(Accumulator::new(next_config)))
    }
}

#[cfg(test)]
#[path = "accumulator_test.rs"]
mod tests;
