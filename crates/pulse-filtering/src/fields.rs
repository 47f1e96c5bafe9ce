//! Field schema and projection
//!
//! A closed table of projectable fields per telemetry kind. Each entry maps
//! a field name to a typed extraction function, so predicate/type
//! compatibility is checked once at compile time and evaluation is a total
//! function - absent fields project to the empty value of their type.
//!
//! Two special field names extend the table:
//! - `*` scans every textual field of the item (Contains/DoesNotContain only)
//! - `CustomDimensions.<key>` projects a custom dimension as text

use std::time::Duration;

use pulse_protocol::{FieldValue, TelemetryItem, TelemetryKind};

use crate::error::FilterError;

/// Field name that scans all textual fields of an item
pub(crate) const ANY_FIELD: &str = "*";

/// Prefix for custom dimension projections
pub(crate) const CUSTOM_DIMENSIONS_PREFIX: &str = "CustomDimensions.";

/// The projected type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Projects to a string; ordinal comparisons, numeric coercion on demand
    Text,
    /// Projects to an f64
    Number,
    /// Projects to a bool; admits only Equal/NotEqual
    Flag,
}

/// Where a compiled filter reads its value from.
#[derive(Debug, Clone)]
pub(crate) enum FieldTarget {
    /// A schema field with a typed extraction function
    Typed {
        kind: FieldKind,
        extract: fn(&TelemetryItem) -> FieldValue,
    },
    /// The `*` any-field scan
    AnyField,
    /// A `CustomDimensions.<key>` projection
    CustomDimension(String),
}

impl FieldTarget {
    /// The projected type of this target; custom dimensions and the
    /// any-field scan behave as text
    pub(crate) fn kind(&self) -> FieldKind {
        match self {
            FieldTarget::Typed { kind, .. } => *kind,
            FieldTarget::AnyField | FieldTarget::CustomDimension(_) => FieldKind::Text,
        }
    }
}

/// Resolve a field name against the schema for one telemetry kind.
pub(crate) fn resolve(kind: TelemetryKind, field_name: &str) -> Result<FieldTarget, FilterError> {
    if field_name == ANY_FIELD {
        return Ok(FieldTarget::AnyField);
    }

    if let Some(key) = field_name.strip_prefix(CUSTOM_DIMENSIONS_PREFIX) {
        return Ok(FieldTarget::CustomDimension(key.to_string()));
    }

    let entry = schema(kind)
        .iter()
        .find(|(name, _, _)| *name == field_name);

    match entry {
        Some((_, field_kind, extract)) => Ok(FieldTarget::Typed {
            kind: *field_kind,
            extract: *extract,
        }),
        None => Err(FilterError::unknown_field(kind, field_name)),
    }
}

type SchemaEntry = (&'static str, FieldKind, fn(&TelemetryItem) -> FieldValue);

/// The projectable fields for one telemetry kind.
fn schema(kind: TelemetryKind) -> &'static [SchemaEntry] {
    match kind {
        TelemetryKind::Request => &[
            ("Name", FieldKind::Text, request_name),
            ("Url", FieldKind::Text, request_url),
            ("ResponseCode", FieldKind::Text, request_response_code),
            ("Success", FieldKind::Flag, request_success),
            ("Duration", FieldKind::Number, request_duration),
        ],
        TelemetryKind::Dependency => &[
            ("Name", FieldKind::Text, dependency_name),
            ("Target", FieldKind::Text, dependency_target),
            ("Data", FieldKind::Text, dependency_data),
            ("ResultCode", FieldKind::Text, dependency_result_code),
            ("Success", FieldKind::Flag, dependency_success),
            ("Duration", FieldKind::Number, dependency_duration),
        ],
        TelemetryKind::Exception => &[
            ("ExceptionType", FieldKind::Text, exception_type),
            ("Message", FieldKind::Text, exception_message),
        ],
        TelemetryKind::Trace => &[("Message", FieldKind::Text, trace_message)],
        TelemetryKind::Event => &[("Name", FieldKind::Text, event_name)],
        TelemetryKind::Metric => &[
            ("Id", FieldKind::Text, metric_id),
            ("Value", FieldKind::Number, metric_value),
        ],
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

// Extraction functions. Each is total: an item of the wrong kind projects
// the empty value, which keeps evaluation deterministic even if a caller
// evaluates a filter against a foreign kind.

fn request_name(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Request(t) => FieldValue::Text(t.name.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn request_url(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Request(t) => FieldValue::Text(t.url.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn request_response_code(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Request(t) => FieldValue::Text(t.response_code.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn request_success(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Request(t) => FieldValue::Flag(t.success),
        _ => FieldValue::Flag(false),
    }
}

fn request_duration(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Request(t) => FieldValue::Number(millis(t.duration)),
        _ => FieldValue::Number(0.0),
    }
}

fn dependency_name(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Dependency(t) => FieldValue::Text(t.name.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn dependency_target(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Dependency(t) => FieldValue::Text(t.target.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn dependency_data(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Dependency(t) => FieldValue::Text(t.data.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn dependency_result_code(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Dependency(t) => FieldValue::Text(t.result_code.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn dependency_success(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Dependency(t) => FieldValue::Flag(t.success),
        _ => FieldValue::Flag(false),
    }
}

fn dependency_duration(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Dependency(t) => FieldValue::Number(millis(t.duration)),
        _ => FieldValue::Number(0.0),
    }
}

fn exception_type(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Exception(t) => FieldValue::Text(t.exception_type.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn exception_message(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Exception(t) => FieldValue::Text(t.message.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn trace_message(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Trace(t) => FieldValue::Text(t.message.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn event_name(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Event(t) => FieldValue::Text(t.name.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn metric_id(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Metric(t) => FieldValue::Text(t.id.clone()),
        _ => FieldValue::Text(String::new()),
    }
}

fn metric_value(item: &TelemetryItem) -> FieldValue {
    match item {
        TelemetryItem::Metric(t) => FieldValue::Number(t.value),
        _ => FieldValue::Number(0.0),
    }
}
