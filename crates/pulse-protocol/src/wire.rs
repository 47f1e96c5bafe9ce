//! Control-plane configuration shapes
//!
//! The control-plane service pushes a versioned configuration document
//! (keyed by ETag) describing which telemetry documents to forward and
//! which counters and metrics to collect. These types fix the logical
//! shape of that document; the transport encoding is the service client's
//! concern.
//!
//! All collections default to empty so a minimal document deserializes
//! cleanly - validation happens at compile time in the filtering crate,
//! where malformed entries are rejected individually.

use serde::Deserialize;

use crate::item::TelemetryKind;

/// Filter predicate applied to a projected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Predicate {
    /// Ordinal equality
    Equal,
    /// Ordinal inequality
    NotEqual,
    /// Substring match
    Contains,
    /// Negated substring match
    DoesNotContain,
    /// Numeric greater-than
    GreaterThan,
    /// Numeric greater-than-or-equal
    GreaterThanOrEqual,
    /// Numeric less-than
    LessThan,
    /// Numeric less-than-or-equal
    LessThanOrEqual,
}

impl Predicate {
    /// Whether this predicate compares numerically
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Predicate::GreaterThan
                | Predicate::GreaterThanOrEqual
                | Predicate::LessThan
                | Predicate::LessThanOrEqual
        )
    }

    /// Stable name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::Equal => "Equal",
            Predicate::NotEqual => "NotEqual",
            Predicate::Contains => "Contains",
            Predicate::DoesNotContain => "DoesNotContain",
            Predicate::GreaterThan => "GreaterThan",
            Predicate::GreaterThanOrEqual => "GreaterThanOrEqual",
            Predicate::LessThan => "LessThan",
            Predicate::LessThanOrEqual => "LessThanOrEqual",
        }
    }
}

/// One field/predicate/comparand triple.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterSpec {
    /// Field to project from the telemetry item
    pub field_name: String,
    /// Predicate to apply
    pub predicate: Predicate,
    /// Literal to compare against (always transported as a string)
    pub comparand: String,
}

impl std::fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.field_name,
            self.predicate.as_str(),
            self.comparand
        )
    }
}

/// A conjunction of filters over one telemetry kind: an item matches the
/// group iff it is of that kind and matches every filter in it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterGroupInfo {
    /// Telemetry kind this group applies to
    #[serde(default)]
    pub telemetry_kind: TelemetryKind,
    /// Filters AND'd together
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// A named, quota-limited subscription to individual telemetry documents.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentStreamInfo {
    /// Stream identifier; quota state is carried across reconfiguration
    /// by matching on this id
    pub id: String,
    /// Disjunction of filter groups: an item matches the stream if it
    /// matches at least one group
    #[serde(default)]
    pub document_filter_groups: Vec<FilterGroupInfo>,
}

/// One performance counter to collect.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerformanceCounterInfo {
    /// Name the value is reported under
    pub report_as: String,
    /// Platform counter string handed to the performance collector
    pub counter: String,
}

/// Aggregation applied to a tracked metric within one collection interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Aggregation {
    /// Arithmetic mean of the interval's values
    #[default]
    Avg,
    /// Sum of the interval's values
    Sum,
    /// Minimum value seen in the interval
    Min,
    /// Maximum value seen in the interval
    Max,
}

/// One tracked metric.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricInfo {
    /// Metric identifier; custom metric telemetry is matched by this id
    pub id: String,
    /// How values accumulate within a collection interval
    #[serde(default)]
    pub aggregation: Aggregation,
}

/// Document quota overrides pushed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct QuotaInfo {
    /// Quota a new stream starts with
    pub initial: f64,
    /// Upper bound the bucket replenishes toward
    pub max: f64,
    /// Replenishment rate in documents per second
    pub rate: f64,
}

/// The complete pushed configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigurationInfo {
    /// Opaque version identifier; the empty string is the bootstrap default
    #[serde(default)]
    pub etag: String,
    /// Document stream definitions
    #[serde(default)]
    pub document_streams: Vec<DocumentStreamInfo>,
    /// Performance counters to collect
    #[serde(default)]
    pub performance_counters: Vec<PerformanceCounterInfo>,
    /// Metrics to track
    #[serde(default)]
    pub metrics: Vec<MetricInfo>,
    /// Quota overrides for document streams
    #[serde(default)]
    pub quota: Option<QuotaInfo>,
}
