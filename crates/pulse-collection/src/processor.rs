//! The default telemetry processor
//!
//! `LiveMetricsProcessor` sits in the host's telemetry path. While
//! collection is inactive it is a single atomic load per item - the
//! engine's cost when nobody is watching. While active it updates the
//! current accumulator's counters and evaluates the configuration's
//! document streams, forwarding matching items as documents subject to
//! per-stream quota.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::Utc;

use pulse_protocol::TelemetryItem;

use crate::accumulator::TelemetryDocument;
use crate::registry::{CollectionContext, Processor};

/// Telemetry processor feeding the live metrics engine.
#[derive(Default)]
pub struct LiveMetricsProcessor {
    context: ArcSwapOption<CollectionContext>,
}

impl LiveMetricsProcessor {
    /// Create a processor in the passive state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether collection is currently active
    pub fn is_collecting(&self) -> bool {
        self.context.load().is_some()
    }

    /// Feed one telemetry item through the engine.
    ///
    /// Hot path: when collection is inactive this is one atomic load.
    pub fn process(&self, item: &TelemetryItem) {
        let Some(context) = self.context.load_full() else {
            return;
        };

        // The engine's own posts show up as dependency calls; reporting
        // them would feed the channel back into itself
        if let TelemetryItem::Dependency(dep) = item
            && !context.service_uri.is_empty()
            && (dep.data.contains(&context.service_uri)
                || dep.target.contains(&context.service_uri))
        {
            return;
        }

        // One handle load per item: the increment lands wholly in this
        // accumulator or, after a swap, wholly in its successor
        let accumulator = context.accumulators.current();

        match item {
            TelemetryItem::Request(t) => accumulator.add_request(t.duration, t.success),
            TelemetryItem::Dependency(t) => accumulator.add_dependency(t.duration, t.success),
            TelemetryItem::Exception(_) => accumulator.add_exception(),
            TelemetryItem::Metric(t) => {
                accumulator.track_metric(&t.id, t.value);
            }
            TelemetryItem::Trace(_) | TelemetryItem::Event(_) => {}
        }

        if context.disable_full_documents {
            return;
        }

        // Evaluate against the accumulator's own configuration so the
        // interval's documents and counters always agree on a version
        let config = accumulator.config();
        let mut matching_streams = Vec::new();

        for stream in config.document_streams() {
            if stream.matches(item) && stream.quota().try_consume() {
                matching_streams.push(stream.id().to_string());
            }
        }

        if !matching_streams.is_empty() {
            accumulator.add_document(TelemetryDocument {
                item: item.clone(),
                matching_streams,
                timestamp: Utc::now(),
            });
        }
    }
}

impl Processor for LiveMetricsProcessor {
    fn start_collection(&self, context: &CollectionContext) {
        self.context.store(Some(Arc::new(context.clone())));
    }

    fn stop_collection(&self) {
        self.context.store(None);
    }
}

impl std::fmt::Debug for LiveMetricsProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveMetricsProcessor")
            .field("collecting", &self.is_collecting())
            .finish()
    }
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod tests;
