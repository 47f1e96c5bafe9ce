//! One collection interval's complete snapshot

use chrono::{DateTime, Utc};

use crate::accumulator::{Accumulator, CounterSnapshot, TelemetryDocument};

/// Aggregated value of one tracked metric over one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    /// Metric identifier
    pub id: String,
    /// Aggregated value
    pub value: f64,
    /// Number of measurements folded in
    pub count: u64,
}

/// Immutable snapshot of one collection interval: sealed counters plus
/// the externally collected performance and CPU data. Created once per
/// tick and never mutated.
#[derive(Debug)]
pub struct Sample {
    /// Configuration version the counters were collected under
    pub config_etag: String,
    /// Counter values folded from the sealed accumulator
    pub counters: CounterSnapshot,
    /// Documents that matched a stream during the interval
    pub documents: Vec<TelemetryDocument>,
    /// Aggregated metric values
    pub metrics: Vec<MetricValue>,
    /// Performance counter readings, `(report_as, value)`
    pub performance_counters: Vec<(String, f64)>,
    /// Top CPU consumers, `(process_name, cpu_percent)`
    pub top_cpu_processes: Vec<(String, i32)>,
    /// Whether the platform denied access to process CPU data
    pub top_cpu_access_denied: bool,
    /// Start of the interval (when the accumulator became current)
    pub interval_start: DateTime<Utc>,
    /// When the sample was assembled
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    /// Fold a sealed accumulator and the collaborator readings into a
    /// sample.
    pub fn collect(
        accumulator: &Accumulator,
        performance_counters: Vec<(String, f64)>,
        top_cpu_processes: Vec<(String, i32)>,
        top_cpu_access_denied: bool,
    ) -> Self {
        Self {
            config_etag: accumulator.config().etag().to_string(),
            counters: accumulator.snapshot(),
            documents: accumulator.take_documents(),
            metrics: accumulator.metric_values(),
            performance_counters,
            top_cpu_processes,
            top_cpu_access_denied,
            interval_start: accumulator.start(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_filtering::CollectionConfiguration;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_collect_folds_accumulator() {
        let acc = Accumulator::new(Arc::new(CollectionConfiguration::bootstrap()));
        acc.add_request(Duration::from_millis(30), true);
        acc.add_exception();

        let sample = Sample::collect(
            &acc,
            vec![("Committed Bytes".into(), 1_048_576.0)],
            vec![("postgres".into(), 37)],
            false,
        );

        assert_eq!(sample.config_etag, "");
        assert_eq!(sample.counters.request_count, 1);
        assert_eq!(sample.counters.exception_count, 1);
        assert_eq!(sample.performance_counters.len(), 1);
        assert_eq!(sample.top_cpu_processes[0].1, 37);
        assert!(!sample.top_cpu_access_denied);
        assert!(sample.timestamp >= sample.interval_start);

        // Folding takes the documents with it
        assert!(acc.take_documents().is_empty());
    }
}
