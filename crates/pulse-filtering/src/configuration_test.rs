//! Tests for the collection configuration builder

use super::*;
use crate::error::ConfigurationErrorKind;
use pulse_protocol::{
    Aggregation, DocumentStreamInfo, FilterGroupInfo, FilterSpec, Predicate, QuotaInfo,
    TelemetryKind,
};

fn filter(field: &str, predicate: Predicate, comparand: &str) -> FilterSpec {
    FilterSpec {
        field_name: field.into(),
        predicate,
        comparand: comparand.into(),
    }
}

fn stream(id: &str, kind: TelemetryKind, filters: Vec<FilterSpec>) -> DocumentStreamInfo {
    DocumentStreamInfo {
        id: id.into(),
        document_filter_groups: vec![FilterGroupInfo {
            telemetry_kind: kind,
            filters,
        }],
    }
}

fn failing_requests(id: &str) -> DocumentStreamInfo {
    stream(
        id,
        TelemetryKind::Request,
        vec![filter("Success", Predicate::Equal, "false")],
    )
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn test_bootstrap_is_empty_etag_with_default_counters() {
    let config = CollectionConfiguration::bootstrap();

    assert_eq!(config.etag(), "");
    assert!(config.document_streams().is_empty());
    assert!(config.metrics().is_empty());
    assert_eq!(config.performance_counters().len(), DEFAULT_COUNTERS.len());
}

// ============================================================================
// Stream compilation and error isolation
// ============================================================================

#[test]
fn test_one_invalid_stream_among_three_valid() {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        document_streams: vec![
            failing_requests("S1"),
            // GreaterThan on a non-numeric-coercible field type
            stream(
                "S2",
                TelemetryKind::Request,
                vec![filter("Success", Predicate::GreaterThan, "true")],
            ),
            failing_requests("S3"),
            failing_requests("S4"),
        ],
        ..Default::default()
    };

    let (config, errors) = CollectionConfiguration::build(&info, &[]);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ConfigurationErrorKind::FilterCompilation);
    assert_eq!(errors[0].stream_id.as_deref(), Some("S2"));

    let ids: Vec<_> = config.document_streams().iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["S1", "S3", "S4"]);
}

#[test]
fn test_invalid_filter_skipped_group_survives() {
    // One bad filter in a group of two: the group keeps the good filter
    let info = ConfigurationInfo {
        etag: "v1".into(),
        document_streams: vec![stream(
            "S1",
            TelemetryKind::Request,
            vec![
                filter("ResponseCode", Predicate::GreaterThanOrEqual, "500"),
                filter("NoSuchField", Predicate::Equal, "x"),
            ],
        )],
        ..Default::default()
    };

    let (config, errors) = CollectionConfiguration::build(&info, &[]);

    assert_eq!(errors.len(), 1);
    assert_eq!(config.document_streams().len(), 1);
    assert_eq!(config.document_streams()[0].groups()[0].filters().len(), 1);
}

#[test]
fn test_stream_with_no_groups_dropped_with_error() {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        document_streams: vec![DocumentStreamInfo {
            id: "empty".into(),
            document_filter_groups: Vec::new(),
        }],
        ..Default::default()
    };

    let (config, errors) = CollectionConfiguration::build(&info, &[]);

    assert!(config.document_streams().is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ConfigurationErrorKind::EmptyStream);
}

#[test]
fn test_duplicate_stream_ids() {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        document_streams: vec![failing_requests("S1"), failing_requests("S1")],
        ..Default::default()
    };

    let (config, errors) = CollectionConfiguration::build(&info, &[]);

    assert_eq!(config.document_streams().len(), 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ConfigurationErrorKind::DuplicateStreamId);
}

#[test]
fn test_group_with_zero_declared_filters_matches_kind() {
    // An intentionally empty group is a match-all for its kind, not an error
    let info = ConfigurationInfo {
        etag: "v1".into(),
        document_streams: vec![stream("all-requests", TelemetryKind::Request, Vec::new())],
        ..Default::default()
    };

    let (config, errors) = CollectionConfiguration::build(&info, &[]);

    assert!(errors.is_empty());
    assert_eq!(config.document_streams().len(), 1);
}

// ============================================================================
// Quota carryover
// ============================================================================

#[test]
fn test_quota_carried_over_by_id() {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        document_streams: vec![failing_requests("S1"), failing_requests("S2")],
        quota: Some(QuotaInfo {
            initial: 5.0,
            max: 30.0,
            rate: 0.0,
        }),
        ..Default::default()
    };

    let (old, _) = CollectionConfiguration::build(&info, &[]);

    // Consume two documents from S1
    let s1 = &old.document_streams()[0];
    assert!(s1.quota().try_consume());
    assert!(s1.quota().try_consume());
    assert_eq!(s1.quota().current(), 3.0);

    // New configuration keeps S1 (filters edited), drops S2, adds S3
    let new_info = ConfigurationInfo {
        etag: "v2".into(),
        document_streams: vec![
            stream(
                "S1",
                TelemetryKind::Request,
                vec![filter("ResponseCode", Predicate::Equal, "500")],
            ),
            failing_requests("S3"),
        ],
        quota: Some(QuotaInfo {
            initial: 5.0,
            max: 30.0,
            rate: 0.0,
        }),
        ..Default::default()
    };

    let (new, errors) = CollectionConfiguration::build(&new_info, old.document_streams());
    assert!(errors.is_empty());

    let ids: Vec<_> = new.document_streams().iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["S1", "S3"]);

    // S1 keeps its spent quota even though its filters changed
    assert_eq!(new.document_streams()[0].quota().current(), 3.0);
    // S3 is new and starts at the configured initial
    assert_eq!(new.document_streams()[1].quota().current(), 5.0);
}

// ============================================================================
// Counter and metric lists
// ============================================================================

#[test]
fn test_counters_deduped_and_defaults_unioned() {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        performance_counters: vec![
            PerformanceCounterInfo {
                report_as: "Request Rate".into(),
                counter: "\\App\\Requests/Sec".into(),
            },
            // Same normalized key, different counter string: first wins
            PerformanceCounterInfo {
                report_as: "request rate ".into(),
                counter: "\\Other\\Requests/Sec".into(),
            },
            // Collides with a default counter; the pushed entry wins
            PerformanceCounterInfo {
                report_as: "% Processor Time".into(),
                counter: "\\Processor(0)\\% Processor Time".into(),
            },
        ],
        ..Default::default()
    };

    let (config, errors) = CollectionConfiguration::build(&info, &[]);
    assert!(errors.is_empty());

    let counters = config.performance_counters();
    // Request Rate + % Processor Time (pushed) + Committed Bytes (default)
    assert_eq!(counters.len(), 3);
    assert_eq!(counters[0].counter, "\\App\\Requests/Sec");
    assert_eq!(counters[1].counter, "\\Processor(0)\\% Processor Time");
    assert_eq!(counters[2].report_as, "Committed Bytes");
}

#[test]
fn test_duplicate_metric_ids_reported() {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        metrics: vec![
            MetricInfo {
                id: "orders".into(),
                aggregation: Aggregation::Sum,
            },
            MetricInfo {
                id: "orders".into(),
                aggregation: Aggregation::Avg,
            },
        ],
        ..Default::default()
    };

    let (config, errors) = CollectionConfiguration::build(&info, &[]);

    assert_eq!(config.metrics().len(), 1);
    assert_eq!(config.metrics()[0].aggregation, Aggregation::Sum);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ConfigurationErrorKind::DuplicateMetricId);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_build_is_idempotent() {
    let info = ConfigurationInfo {
        etag: "v1".into(),
        document_streams: vec![
            failing_requests("S1"),
            stream(
                "bad",
                TelemetryKind::Request,
                vec![filter("Success", Predicate::LessThan, "1")],
            ),
        ],
        metrics: vec![MetricInfo {
            id: "m1".into(),
            aggregation: Aggregation::Max,
        }],
        ..Default::default()
    };

    let (a, errors_a) = CollectionConfiguration::build(&info, &[]);
    let (b, errors_b) = CollectionConfiguration::build(&info, &[]);

    assert_eq!(errors_a, errors_b);
    assert_eq!(a.etag(), b.etag());

    let ids_a: Vec<_> = a.document_streams().iter().map(|s| s.id()).collect();
    let ids_b: Vec<_> = b.document_streams().iter().map(|s| s.id()).collect();
    assert_eq!(ids_a, ids_b);

    assert_eq!(a.performance_counters(), b.performance_counters());
    assert_eq!(a.metrics(), b.metrics());

    for (sa, sb) in a.document_streams().iter().zip(b.document_streams()) {
        assert_eq!(sa.quota().current(), sb.quota().current());
        assert_eq!(sa.groups().len(), sb.groups().len());
    }
}
