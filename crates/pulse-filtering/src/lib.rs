//! Pulse - Filtering
//!
//! Turns the configuration pushed by the control-plane service into
//! executable predicates and quota-limited document streams.
//!
//! # Overview
//!
//! - `Filter` compiles one field/predicate/comparand triple against the
//!   fixed field schema and evaluates telemetry items without ever failing.
//! - `DocumentStream` groups compiled filters (AND within a group, OR
//!   across groups) behind a token-bucket `QuotaTracker`.
//! - `CollectionConfiguration` is the immutable compiled form of one pushed
//!   configuration version; rebuilding it carries per-stream quota forward
//!   by stream id.
//!
//! # Error model
//!
//! A malformed filter, duplicate stream id, or unusable stream is rejected
//! *individually* and reported as a structured `ConfigurationError`; the
//! rest of the configuration still compiles. Nothing here panics on bad
//! service input.

mod configuration;
mod error;
mod fields;
mod filter;
mod quota;
mod stream;

pub use configuration::{CollectionConfiguration, DEFAULT_COUNTERS};
pub use error::{ConfigurationError, ConfigurationErrorKind, FilterError};
pub use fields::FieldKind;
pub use filter::Filter;
pub use quota::QuotaTracker;
pub use stream::{DocumentStream, FilterGroup};
