//! Platform collector boundaries
//!
//! Reading OS performance counters and per-process CPU tables is platform
//! work that lives outside this crate. The engine drives these traits and
//! isolates every failure: a counter that cannot be read is reported
//! through the error callback and omitted from the sample, never allowed
//! to abort a collection tick.

use thiserror::Error;

use pulse_protocol::PerformanceCounterInfo;

/// Failure reading or registering a platform counter.
#[derive(Error, Debug, Clone)]
pub enum CollectorError {
    /// The counter does not exist or cannot be opened on this platform
    #[error("counter '{name}' is unavailable: {reason}")]
    Unavailable {
        /// Counter the failure applies to
        name: String,
        /// Platform-specific reason
        reason: String,
    },

    /// The counter exists but the read failed
    #[error("reading counter '{name}' failed: {reason}")]
    Read {
        /// Counter the failure applies to
        name: String,
        /// Platform-specific reason
        reason: String,
    },
}

/// Source of performance counter readings.
///
/// The registered counter set is reconciled against each new collection
/// configuration via `register_counter`/`remove_counter`.
pub trait PerformanceCollector: Send + Sync {
    /// Read every registered counter. Failures are reported per counter
    /// through `on_error` and the affected value is omitted.
    fn collect(&self, on_error: &mut dyn FnMut(&str, &CollectorError)) -> Vec<(String, f64)>;

    /// Start collecting a counter
    fn register_counter(&self, counter: &PerformanceCounterInfo) -> Result<(), CollectorError>;

    /// Stop collecting the counter reported under this name
    fn remove_counter(&self, report_as: &str);

    /// The currently registered counters
    fn counters(&self) -> Vec<PerformanceCounterInfo>;
}

/// Source of top-CPU-process data.
pub trait TopCpuCollector: Send + Sync {
    /// Called once when the collection task starts
    fn initialize(&self) {}

    /// Called once when the collection task stops
    fn close(&self) {}

    /// The `n` processes currently using the most CPU, as
    /// `(process_name, cpu_percent)`
    fn top_processes(&self, n: usize) -> Vec<(String, i32)>;

    /// Whether the platform denied the access needed to read process CPU
    fn access_denied(&self) -> bool;
}
