//! Error types for the config crate

use std::time::Duration;
use thiserror::Error;

/// Errors raised by configuration validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An interval was set to zero
    #[error("interval '{name}' must be greater than zero")]
    ZeroInterval {
        /// Name of the offending field
        name: &'static str,
    },

    /// An interval was set implausibly large
    #[error("interval '{name}' is too large ({value:?}, max {max:?})")]
    IntervalTooLarge {
        /// Name of the offending field
        name: &'static str,
        /// Configured value
        value: Duration,
        /// Maximum accepted value
        max: Duration,
    },

    /// The instrumentation key is missing or blank
    #[error("instrumentation_key must not be empty")]
    MissingInstrumentationKey,
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;
