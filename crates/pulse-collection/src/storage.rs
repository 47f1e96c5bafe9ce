//! Bounded sample storage
//!
//! A ring of the most recent samples, capacity 10. The collection task
//! appends, the state task drains for transmission, and samples that
//! failed to send are put back at the front so a lagging network never
//! grows memory - the oldest samples simply fall off.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::sample::Sample;

/// Maximum samples retained
const MAX_SAMPLES: usize = 10;

/// FIFO ring of collected samples, oldest at the front.
#[derive(Debug, Default)]
pub struct SampleStorage {
    samples: Mutex<VecDeque<Arc<Sample>>>,
}

impl SampleStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, evicting the oldest when capacity is exceeded
    pub fn store(&self, sample: Arc<Sample>) {
        let mut samples = self.samples.lock();
        samples.push_back(sample);
        while samples.len() > MAX_SAMPLES {
            samples.pop_front();
        }
        trace!(stored = samples.len(), "sample stored");
    }

    /// Take every buffered sample, oldest first
    pub fn drain(&self) -> Vec<Arc<Sample>> {
        self.samples.lock().drain(..).collect()
    }

    /// Put samples that failed to send back at the front, in their
    /// original order, then trim the oldest down to capacity. Newer
    /// samples always survive older ones.
    pub fn requeue_front(&self, failed: Vec<Arc<Sample>>) {
        let mut samples = self.samples.lock();
        for sample in failed.into_iter().rev() {
            samples.push_front(sample);
        }
        while samples.len() > MAX_SAMPLES {
            samples.pop_front();
        }
    }

    /// Drop everything
    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// Whether storage is empty
    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Capacity of the ring
    pub fn capacity(&self) -> usize {
        MAX_SAMPLES
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
