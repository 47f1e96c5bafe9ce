//! The collection task
//!
//! Runs only while the service is subscribed. Once per collection
//! interval it seals the current accumulator, merges in performance
//! counter and top-CPU readings, and appends the resulting sample to
//! storage. Ticks align to wall-clock slot boundaries so the cadence does
//! not drift with tick cost.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use pulse_filtering::CollectionConfiguration;

use crate::accumulator::AccumulatorManager;
use crate::collectors::{PerformanceCollector, TopCpuCollector};
use crate::sample::Sample;
use crate::storage::SampleStorage;
use crate::timeslot;

/// How many top CPU consumers each sample carries
const TOP_CPU_COUNT: usize = 5;

/// Per-tick sample production, separated from the task loop so it can be
/// driven directly in tests.
pub(crate) struct SampleCollector {
    accumulators: Arc<AccumulatorManager>,
    configuration: Arc<ArcSwap<CollectionConfiguration>>,
    storage: Arc<SampleStorage>,
    performance: Arc<dyn PerformanceCollector>,
    top_cpu: Arc<dyn TopCpuCollector>,
    disable_top_cpu: bool,
    interval: Duration,
}

impl SampleCollector {
    pub(crate) fn new(
        accumulators: Arc<AccumulatorManager>,
        configuration: Arc<ArcSwap<CollectionConfiguration>>,
        storage: Arc<SampleStorage>,
        performance: Arc<dyn PerformanceCollector>,
        top_cpu: Arc<dyn TopCpuCollector>,
        disable_top_cpu: bool,
        interval: Duration,
    ) -> Self {
        Self {
            accumulators,
            configuration,
            storage,
            performance,
            top_cpu,
            disable_top_cpu,
            interval,
        }
    }

    /// Produce one sample and append it to storage.
    pub(crate) fn collect_tick(&self) {
        let sample = self.collect_sample();
        self.storage.store(Arc::new(sample));
    }

    fn collect_sample(&self) -> Sample {
        // Seal the interval; the replacement is seeded with whatever
        // configuration the state task most recently installed
        let accumulator = self
            .accumulators
            .complete_current(self.configuration.load_full());

        // Each counter read is fault-isolated: a failure is logged and
        // that counter is simply missing from the sample
        let performance_counters = self.performance.collect(&mut |name, error| {
            warn!(counter = name, error = %error, "performance counter read failed");
        });

        let top_cpu_processes = if self.disable_top_cpu {
            Vec::new()
        } else {
            self.top_cpu.top_processes(TOP_CPU_COUNT)
        };

        Sample::collect(
            &accumulator,
            performance_counters,
            top_cpu_processes,
            self.top_cpu.access_denied(),
        )
    }

    /// Run the collection loop until cancelled. An in-flight tick always
    /// finishes; only the sleep is interruptible.
    pub(crate) async fn run(self, cancel: CancellationToken) {
        self.top_cpu.initialize();
        debug!(interval = ?self.interval, "collection task started");

        loop {
            let delay = timeslot::time_until_slot(Utc::now(), self.interval);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => self.collect_tick(),
            }
        }

        self.top_cpu.close();
        debug!("collection task stopped");
    }
}
