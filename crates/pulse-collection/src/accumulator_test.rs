//! Tests for accumulator double buffering

use super::*;
use pulse_protocol::{
    Aggregation, ConfigurationInfo, MetricInfo, RequestTelemetry, TelemetryItem,
};

fn config() -> Arc<CollectionConfiguration> {
    Arc::new(CollectionConfiguration::bootstrap())
}

fn config_with_metrics(metrics: Vec<MetricInfo>) -> Arc<CollectionConfiguration> {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        metrics,
        ..Default::default()
    };
    let (config, errors) = CollectionConfiguration::build(&info, &[]);
    assert!(errors.is_empty());
    Arc::new(config)
}

fn document() -> TelemetryDocument {
    TelemetryDocument {
        item: TelemetryItem::Request(RequestTelemetry::default()),
        matching_streams: vec!["S1".into()],
        timestamp: Utc::now(),
    }
}

// ============================================================================
// Counter basics
// ============================================================================

#[test]
fn test_counters_accumulate() {
    let acc = Accumulator::new(config());

    acc.add_request(Duration::from_millis(100), true);
    acc.add_request(Duration::from_millis(50), false);
    acc.add_dependency(Duration::from_millis(20), true);
    acc.add_exception();

    let snapshot = acc.snapshot();
    assert_eq!(snapshot.request_count, 2);
    assert_eq!(snapshot.request_duration, Duration::from_millis(150));
    assert_eq!(snapshot.requests_succeeded, 1);
    assert_eq!(snapshot.requests_failed, 1);
    assert_eq!(snapshot.dependency_count, 1);
    assert_eq!(snapshot.dependencies_succeeded, 1);
    assert_eq!(snapshot.exception_count, 1);
}

#[test]
fn test_fresh_accumulator_is_zero() {
    let acc = Accumulator::new(config());
    assert_eq!(acc.snapshot(), CounterSnapshot::default());
    assert!(acc.take_documents().is_empty());
    assert!(acc.metric_values().is_empty());
}

// ============================================================================
// Metric slots
// ============================================================================

#[test]
fn test_metric_aggregations() {
    let acc = Accumulator::new(config_with_metrics(vec![
        MetricInfo {
            id: "avg".into(),
            aggregation: Aggregation::Avg,
        },
        MetricInfo {
            id: "sum".into(),
            aggregation: Aggregation::Sum,
        },
        MetricInfo {
            id: "min".into(),
            aggregation: Aggregation::Min,
        },
        MetricInfo {
            id: "max".into(),
            aggregation: Aggregation::Max,
        },
    ]));

    for value in [2.0, 4.0, 6.0] {
        assert!(acc.track_metric("avg", value));
        assert!(acc.track_metric("sum", value));
        assert!(acc.track_metric("min", value));
        assert!(acc.track_metric("max", value));
    }

    let values = acc.metric_values();
    let by_id: std::collections::HashMap<_, _> =
        values.iter().map(|v| (v.id.as_str(), v)).collect();

    assert_eq!(by_id["avg"].value, 4.0);
    assert_eq!(by_id["sum"].value, 12.0);
    assert_eq!(by_id["min"].value, 2.0);
    assert_eq!(by_id["max"].value, 6.0);
    assert_eq!(by_id["sum"].count, 3);
}

#[test]
fn test_unknown_metric_ignored() {
    let acc = Accumulator::new(config());
    assert!(!acc.track_metric("nobody", 1.0));
    assert!(acc.metric_values().is_empty());
}

#[test]
fn test_untouched_metric_omitted() {
    let acc = Accumulator::new(config_with_metrics(vec![MetricInfo {
        id: "quiet".into(),
        aggregation: Aggregation::Avg,
    }]));
    assert!(acc.metric_values().is_empty());
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn test_documents_buffered_and_taken() {
    let acc = Accumulator::new(config());

    assert!(acc.add_document(document()));
    assert!(acc.add_document(document()));

    let docs = acc.take_documents();
    assert_eq!(docs.len(), 2);
    assert!(acc.take_documents().is_empty());
}

#[test]
fn test_document_buffer_bounded() {
    let acc = Accumulator::new(config());

    for _ in 0..MAX_DOCUMENTS {
        assert!(acc.add_document(document()));
    }
    assert!(!acc.add_document(document()));
    assert_eq!(acc.take_documents().len(), MAX_DOCUMENTS);
}

// ============================================================================
// Manager swap semantics
// ============================================================================

#[test]
fn test_complete_returns_sealed_and_installs_fresh() {
    let manager = AccumulatorManager::new(config());

    manager.current().add_request(Duration::from_millis(10), true);

    let sealed = manager.complete_current(config());
    assert_eq!(sealed.snapshot().request_count, 1);
    assert_eq!(manager.current().snapshot().request_count, 0);
}

#[test]
fn test_complete_carries_new_configuration() {
    let manager = AccumulatorManager::new(config());
    let next = config_with_metrics(vec![MetricInfo {
        id: "m".into(),
        aggregation: Aggregation::Sum,
    }]);

    manager.complete_current(Arc::clone(&next));
    assert_eq!(manager.current().config().etag(), "v1");
    assert!(manager.current().track_metric("m", 1.0));
}

/// The core no-loss/no-double-count property: across any interleaving of
/// concurrent adds and completes, every increment lands in exactly one
/// accumulator.
#[test]
fn test_no_increment_lost_across_swaps() {
    use std::sync::atomic::{AtomicBool, Ordering};

    const WRITERS: usize = 8;
    const ADDS_PER_WRITER: u64 = 10_000;

    let manager = Arc::new(AccumulatorManager::new(config()));
    let stop = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..WRITERS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                for _ in 0..ADDS_PER_WRITER {
                    // Load the handle once per operation, as producers must
                    manager.current().add_request(Duration::from_nanos(1), true);
                }
            })
        })
        .collect();

    let completer = {
        let manager = Arc::clone(&manager);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut total = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let sealed = manager.complete_current(config());
                total += sealed.snapshot().request_count;
                std::thread::yield_now();
            }
            total
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    let sealed_total = completer.join().unwrap();

    // Writers are done, so whatever was not sealed sits in the live one
    let live = manager.current().snapshot().request_count;
    // Plus anything in the final swap race window
    let last = manager.complete_current(config()).snapshot().request_count;
    assert_eq!(live, last);

    assert_eq!(
        sealed_total + last,
        (WRITERS as u64) * ADDS_PER_WRITER,
        "increments must never be lost or double counted"
    );
}
