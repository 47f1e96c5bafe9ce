//! Error types for the collection crate

use thiserror::Error;

use crate::client::ServiceError;
use crate::collectors::CollectorError;

/// Errors surfaced by the collection subsystem.
///
/// None of these escape the background tasks; the state loop classifies
/// them into a retry delay and keeps running.
#[derive(Error, Debug)]
pub enum CollectionError {
    /// Ping/post failed to reach or was rejected by the service
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A performance counter or top-CPU read failed
    #[error(transparent)]
    Collector(#[from] CollectorError),

    /// Unexpected failure inside a state tick
    #[error("unexpected collection failure: {0}")]
    Catastrophic(String),
}

/// Result type for collection operations
pub type Result<T> = std::result::Result<T, CollectionError>;
