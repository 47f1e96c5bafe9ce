//! Telemetry item model
//!
//! A closed set of telemetry kinds with typed payloads. The filter engine
//! projects named fields out of these items, so the set of kinds and the
//! fields each kind carries are deliberately fixed rather than an open
//! property map.

use std::time::Duration;

/// Key/value bag attached to every telemetry item.
///
/// Kept as an ordered vec rather than a map: items carry few properties,
/// and lookup order must be deterministic for filter evaluation.
pub type Properties = Vec<(String, String)>;

/// The six telemetry kinds the engine understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize)]
pub enum TelemetryKind {
    /// Incoming request handled by the host application
    #[default]
    Request,
    /// Outbound call to another component (HTTP, database, queue)
    Dependency,
    /// Tracked exception
    Exception,
    /// Free-form trace message
    Trace,
    /// Named custom event
    Event,
    /// Custom metric measurement
    Metric,
}

impl TelemetryKind {
    /// Stable name used in diagnostics and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryKind::Request => "Request",
            TelemetryKind::Dependency => "Dependency",
            TelemetryKind::Exception => "Exception",
            TelemetryKind::Trace => "Trace",
            TelemetryKind::Event => "Event",
            TelemetryKind::Metric => "Metric",
        }
    }
}

/// An incoming request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTelemetry {
    /// Request name (typically method + route)
    pub name: String,
    /// Full request URL
    pub url: String,
    /// Response code as reported by the host (kept textual; may be numeric)
    pub response_code: String,
    /// Whether the request succeeded
    pub success: bool,
    /// Time taken to handle the request
    pub duration: Duration,
    /// Custom dimensions
    pub properties: Properties,
}

/// An outbound dependency call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyTelemetry {
    /// Dependency name (typically method + path)
    pub name: String,
    /// Target host or resource
    pub target: String,
    /// Command or URL sent to the dependency
    pub data: String,
    /// Result code returned by the dependency
    pub result_code: String,
    /// Whether the call succeeded
    pub success: bool,
    /// Call duration
    pub duration: Duration,
    /// Custom dimensions
    pub properties: Properties,
}

/// A tracked exception
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionTelemetry {
    /// Exception type name
    pub exception_type: String,
    /// Exception message
    pub message: String,
    /// Custom dimensions
    pub properties: Properties,
}

/// A trace message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceTelemetry {
    /// Trace message text
    pub message: String,
    /// Custom dimensions
    pub properties: Properties,
}

/// A custom event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTelemetry {
    /// Event name
    pub name: String,
    /// Custom dimensions
    pub properties: Properties,
}

/// A custom metric measurement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTelemetry {
    /// Metric identifier
    pub id: String,
    /// Measured value
    pub value: f64,
    /// Custom dimensions
    pub properties: Properties,
}

/// One telemetry item as seen by a processor.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryItem {
    /// Incoming request
    Request(RequestTelemetry),
    /// Outbound dependency call
    Dependency(DependencyTelemetry),
    /// Tracked exception
    Exception(ExceptionTelemetry),
    /// Trace message
    Trace(TraceTelemetry),
    /// Custom event
    Event(EventTelemetry),
    /// Custom metric
    Metric(MetricTelemetry),
}

impl TelemetryItem {
    /// The kind of this item
    pub fn kind(&self) -> TelemetryKind {
        match self {
            TelemetryItem::Request(_) => TelemetryKind::Request,
            TelemetryItem::Dependency(_) => TelemetryKind::Dependency,
            TelemetryItem::Exception(_) => TelemetryKind::Exception,
            TelemetryItem::Trace(_) => TelemetryKind::Trace,
            TelemetryItem::Event(_) => TelemetryKind::Event,
            TelemetryItem::Metric(_) => TelemetryKind::Metric,
        }
    }

    /// The custom dimensions attached to this item
    pub fn properties(&self) -> &Properties {
        match self {
            TelemetryItem::Request(t) => &t.properties,
            TelemetryItem::Dependency(t) => &t.properties,
            TelemetryItem::Exception(t) => &t.properties,
            TelemetryItem::Trace(t) => &t.properties,
            TelemetryItem::Event(t) => &t.properties,
            TelemetryItem::Metric(t) => &t.properties,
        }
    }

    /// Look up a custom dimension by key (ordinal comparison, first wins)
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Visit every textual field of this item, stopping early when the
    /// visitor returns `true`. Used by the any-field filter scan; covers
    /// the item's own string fields plus all custom dimension values.
    pub fn scan_text(&self, mut visit: impl FnMut(&str) -> bool) -> bool {
        let own: &[&str] = match self {
            TelemetryItem::Request(t) => &[&t.name, &t.url, &t.response_code],
            TelemetryItem::Dependency(t) => &[&t.name, &t.target, &t.data, &t.result_code],
            TelemetryItem::Exception(t) => &[&t.exception_type, &t.message],
            TelemetryItem::Trace(t) => &[&t.message],
            TelemetryItem::Event(t) => &[&t.name],
            TelemetryItem::Metric(t) => &[&t.id],
        };

        for field in own {
            if visit(field) {
                return true;
            }
        }

        self.properties().iter().any(|(_, v)| visit(v))
    }
}

/// A projected field value, typed by the field schema.
///
/// Absent fields project to the empty value of their declared type, so
/// evaluation is total and deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// String projection (ordinal comparisons)
    Text(String),
    /// Numeric projection (f64 comparisons)
    Number(f64),
    /// Boolean projection
    Flag(bool),
}
