//! Pulse - Protocol
//!
//! Shared vocabulary for the live metrics engine:
//!
//! - The telemetry item model (`TelemetryItem` and the per-kind payloads)
//!   that processors intercept and the filter engine projects fields from.
//! - The logical shape of the configuration document pushed by the
//!   control-plane service (`ConfigurationInfo` and friends). The wire
//!   encoding itself belongs to the service client implementation; this
//!   crate only fixes the deserialized form.
//!
//! Everything here is plain data - no I/O, no background work.

mod item;
mod wire;

pub use item::{
    DependencyTelemetry, EventTelemetry, ExceptionTelemetry, FieldValue, MetricTelemetry,
    Properties, RequestTelemetry, TelemetryItem, TelemetryKind, TraceTelemetry,
};
pub use wire::{
    Aggregation, ConfigurationInfo, DocumentStreamInfo, FilterGroupInfo, FilterSpec, MetricInfo,
    PerformanceCounterInfo, Predicate, QuotaInfo,
};
