//! Document streams
//!
//! A stream is a named, filter-defined, quota-limited subscription to
//! individual telemetry items. Filters AND within a group; groups OR
//! within a stream.

use pulse_protocol::TelemetryItem;

use crate::filter::Filter;
use crate::quota::QuotaTracker;

/// A conjunction of compiled filters over one telemetry kind.
#[derive(Debug)]
pub struct FilterGroup {
    kind: pulse_protocol::TelemetryKind,
    filters: Vec<Filter>,
}

impl FilterGroup {
    pub(crate) fn new(kind: pulse_protocol::TelemetryKind, filters: Vec<Filter>) -> Self {
        Self { kind, filters }
    }

    /// The telemetry kind this group applies to
    pub fn telemetry_kind(&self) -> pulse_protocol::TelemetryKind {
        self.kind
    }

    /// The compiled filters in this group
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// An item matches iff it is of this group's kind and every filter
    /// evaluates true. A group with zero filters matches every item of
    /// its kind.
    pub fn matches(&self, item: &TelemetryItem) -> bool {
        item.kind() == self.kind && self.filters.iter().all(|f| f.evaluate(item))
    }
}

/// One compiled document stream.
#[derive(Debug)]
pub struct DocumentStream {
    id: String,
    groups: Vec<FilterGroup>,
    quota: QuotaTracker,
}

impl DocumentStream {
    pub(crate) fn new(id: String, groups: Vec<FilterGroup>, quota: QuotaTracker) -> Self {
        Self { id, groups, quota }
    }

    /// Stream identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The stream's filter groups
    pub fn groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    /// The stream's document quota
    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    /// An item matches the stream if it matches at least one group.
    pub fn matches(&self, item: &TelemetryItem) -> bool {
        self.groups.iter().any(|g| g.matches(item))
    }
}
