//! Compiled collection configuration
//!
//! `CollectionConfiguration` is the immutable, compiled form of one pushed
//! configuration version. It is built once per ETag change and replaced by
//! pointer swap; nothing in it mutates except the quota buckets, which are
//! internally synchronized.
//!
//! The build never short-circuits: malformed entries are dropped with
//! structured errors and the rest of the configuration stays usable.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use pulse_protocol::{ConfigurationInfo, MetricInfo, PerformanceCounterInfo};

use crate::error::ConfigurationError;
use crate::filter::Filter;
use crate::quota::{
    DEFAULT_INITIAL_QUOTA, DEFAULT_MAX_QUOTA, DEFAULT_RATE_PER_SEC, QuotaTracker,
};
use crate::stream::{DocumentStream, FilterGroup};

/// Counters the engine always collects, regardless of what the pushed
/// configuration asks for. `(report_as, counter_string)`.
pub const DEFAULT_COUNTERS: &[(&str, &str)] = &[
    ("% Processor Time", "\\Processor(_Total)\\% Processor Time"),
    ("Committed Bytes", "\\Memory\\Committed Bytes"),
];

/// Immutable snapshot of one configuration version.
#[derive(Debug)]
pub struct CollectionConfiguration {
    etag: String,
    streams: Vec<Arc<DocumentStream>>,
    performance_counters: Vec<PerformanceCounterInfo>,
    metrics: Vec<MetricInfo>,
}

impl CollectionConfiguration {
    /// The bootstrap configuration: empty ETag, no streams, default
    /// counters only. Used until the service pushes a real version.
    pub fn bootstrap() -> Self {
        let (config, errors) = Self::build(&ConfigurationInfo::default(), &[]);
        debug_assert!(errors.is_empty());
        config
    }

    /// Compile a pushed configuration document.
    ///
    /// `previous_streams` supplies quota state carried over to streams that
    /// survive (matched by id only - a stream keeps its quota even if its
    /// filters were edited). Errors aggregate and never abort the build;
    /// building twice from identical inputs yields identical results.
    pub fn build(
        info: &ConfigurationInfo,
        previous_streams: &[Arc<DocumentStream>],
    ) -> (Self, Vec<ConfigurationError>) {
        let mut errors = Vec::new();

        let (initial, max, rate) = match info.quota {
            Some(q) => (q.initial, q.max, q.rate),
            None => (DEFAULT_INITIAL_QUOTA, DEFAULT_MAX_QUOTA, DEFAULT_RATE_PER_SEC),
        };

        let mut streams = Vec::new();
        let mut seen_ids = HashSet::new();

        for stream_info in &info.document_streams {
            if !seen_ids.insert(stream_info.id.as_str()) {
                errors.push(ConfigurationError::duplicate_stream(&stream_info.id));
                continue;
            }

            let errors_before = errors.len();
            let mut groups = Vec::new();

            for group_info in &stream_info.document_filter_groups {
                let mut filters = Vec::new();

                for spec in &group_info.filters {
                    match Filter::compile(group_info.telemetry_kind, spec) {
                        Ok(filter) => filters.push(filter),
                        Err(e) => errors.push(ConfigurationError::filter_compilation(
                            &stream_info.id,
                            spec.to_string(),
                            &e,
                        )),
                    }
                }

                // A group that lost every declared filter would match all
                // items of its kind; drop it instead
                if filters.is_empty() && !group_info.filters.is_empty() {
                    continue;
                }

                groups.push(FilterGroup::new(group_info.telemetry_kind, filters));
            }

            if groups.is_empty() {
                // Only report the drop itself when no filter error already
                // explains it
                if errors.len() == errors_before {
                    errors.push(ConfigurationError::empty_stream(&stream_info.id));
                }
                continue;
            }

            let quota = match previous_streams.iter().find(|s| s.id() == stream_info.id) {
                Some(previous) => previous.quota().carried_over(max, rate),
                None => QuotaTracker::new(initial, max, rate),
            };

            streams.push(Arc::new(DocumentStream::new(
                stream_info.id.clone(),
                groups,
                quota,
            )));
        }

        let performance_counters = dedup_counters(&info.performance_counters);
        let metrics = dedup_metrics(&info.metrics, &mut errors);

        debug!(
            etag = %info.etag,
            streams = streams.len(),
            counters = performance_counters.len(),
            metrics = metrics.len(),
            errors = errors.len(),
            "compiled collection configuration"
        );

        (
            Self {
                etag: info.etag.clone(),
                streams,
                performance_counters,
                metrics,
            },
            errors,
        )
    }

    /// Opaque version identifier of this configuration
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Compiled document streams
    pub fn document_streams(&self) -> &[Arc<DocumentStream>] {
        &self.streams
    }

    /// Counters to collect, defaults included
    pub fn performance_counters(&self) -> &[PerformanceCounterInfo] {
        &self.performance_counters
    }

    /// Metrics to track
    pub fn metrics(&self) -> &[MetricInfo] {
        &self.metrics
    }
}

fn normalized(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

/// Dedup requested counters by normalized report-as name (first wins) and
/// union in the engine's default counter set.
fn dedup_counters(requested: &[PerformanceCounterInfo]) -> Vec<PerformanceCounterInfo> {
    let mut seen = HashSet::new();
    let mut counters = Vec::new();

    for counter in requested {
        if seen.insert(normalized(&counter.report_as)) {
            counters.push(counter.clone());
        }
    }

    for (report_as, counter) in DEFAULT_COUNTERS {
        if seen.insert(normalized(report_as)) {
            counters.push(PerformanceCounterInfo {
                report_as: (*report_as).to_string(),
                counter: (*counter).to_string(),
            });
        }
    }

    counters
}

/// Dedup metrics by normalized id, reporting duplicates.
fn dedup_metrics(
    requested: &[MetricInfo],
    errors: &mut Vec<ConfigurationError>,
) -> Vec<MetricInfo> {
    let mut seen = HashSet::new();
    let mut metrics = Vec::new();

    for metric in requested {
        if seen.insert(normalized(&metric.id)) {
            metrics.push(metric.clone());
        } else {
            errors.push(ConfigurationError::duplicate_metric(&metric.id));
        }
    }

    metrics
}

#[cfg(test)]
#[path = "configuration_test.rs"]
mod tests;
