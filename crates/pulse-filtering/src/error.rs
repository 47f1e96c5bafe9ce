//! Error types for the filtering crate

use serde::Serialize;
use thiserror::Error;

use pulse_protocol::{Predicate, TelemetryKind};

/// Why a single filter failed to compile.
///
/// These never abort a configuration build; they are wrapped into
/// `ConfigurationError` entries so the offending filter is identifiable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The field name is not projectable for this telemetry kind
    #[error("field '{field}' is not defined for {kind} telemetry")]
    UnknownField {
        /// Telemetry kind the filter targets
        kind: &'static str,
        /// Offending field name
        field: String,
    },

    /// The predicate cannot apply to the field's projected type
    #[error("predicate {predicate} cannot apply to field '{field}'")]
    PredicateNotApplicable {
        /// Offending predicate
        predicate: &'static str,
        /// Field the predicate was applied to
        field: String,
    },

    /// The comparand does not parse as the type the predicate requires
    #[error("comparand '{comparand}' is not a valid {expected} for predicate {predicate}")]
    InvalidComparand {
        /// Offending comparand literal
        comparand: String,
        /// Type the predicate requires
        expected: &'static str,
        /// Predicate being compiled
        predicate: &'static str,
    },
}

impl FilterError {
    pub(crate) fn unknown_field(kind: TelemetryKind, field: &str) -> Self {
        FilterError::UnknownField {
            kind: kind.as_str(),
            field: field.to_string(),
        }
    }

    pub(crate) fn not_applicable(predicate: Predicate, field: &str) -> Self {
        FilterError::PredicateNotApplicable {
            predicate: predicate.as_str(),
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_comparand(
        predicate: Predicate,
        comparand: &str,
        expected: &'static str,
    ) -> Self {
        FilterError::InvalidComparand {
            comparand: comparand.to_string(),
            expected,
            predicate: predicate.as_str(),
        }
    }
}

/// Classification of configuration build errors, reported to the service
/// alongside subsequent posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfigurationErrorKind {
    /// A filter inside a document stream failed to compile
    FilterCompilation,
    /// Two document streams share an id
    DuplicateStreamId,
    /// A stream lost every filter group to compilation errors
    EmptyStream,
    /// Two metrics share an id
    DuplicateMetricId,
    /// A performance counter could not be registered with the collector
    CounterRegistration,
}

/// One structured error produced while building a `CollectionConfiguration`
/// or reconciling the performance-counter set.
///
/// Errors identify the offending entry (stream, filter, metric, counter)
/// so the control plane can surface them without guessing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationError {
    /// What went wrong
    pub kind: ConfigurationErrorKind,
    /// Human-readable description
    pub message: String,
    /// Stream the error belongs to, if any
    pub stream_id: Option<String>,
    /// Filter the error belongs to, if any (rendered spec)
    pub filter: Option<String>,
    /// Metric or counter id the error belongs to, if any
    pub metric_id: Option<String>,
}

impl ConfigurationError {
    /// Error for a filter that failed to compile within a stream
    pub fn filter_compilation(stream_id: &str, filter: String, error: &FilterError) -> Self {
        Self {
            kind: ConfigurationErrorKind::FilterCompilation,
            message: error.to_string(),
            stream_id: Some(stream_id.to_string()),
            filter: Some(filter),
            metric_id: None,
        }
    }

    /// Error for a duplicated stream id
    pub fn duplicate_stream(stream_id: &str) -> Self {
        Self {
            kind: ConfigurationErrorKind::DuplicateStreamId,
            message: format!("document stream id '{stream_id}' is defined more than once"),
            stream_id: Some(stream_id.to_string()),
            filter: None,
            metric_id: None,
        }
    }

    /// Error for a stream with no usable filter groups
    pub fn empty_stream(stream_id: &str) -> Self {
        Self {
            kind: ConfigurationErrorKind::EmptyStream,
            message: format!("document stream '{stream_id}' has no usable filter groups"),
            stream_id: Some(stream_id.to_string()),
            filter: None,
            metric_id: None,
        }
    }

    /// Error for a duplicated metric id
    pub fn duplicate_metric(metric_id: &str) -> Self {
        Self {
            kind: ConfigurationErrorKind::DuplicateMetricId,
            message: format!("metric id '{metric_id}' is defined more than once"),
            stream_id: None,
            filter: None,
            metric_id: Some(metric_id.to_string()),
        }
    }

    /// Error for a counter the performance collector refused
    pub fn counter_registration(report_as: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            kind: ConfigurationErrorKind::CounterRegistration,
            message: format!("failed to register counter '{report_as}': {reason}"),
            stream_id: None,
            filter: None,
            metric_id: Some(report_as.to_string()),
        }
    }
}
