//! Control-plane service client boundary
//!
//! The engine never speaks HTTP itself; it drives this trait. Production
//! hosts supply an implementation over their transport of choice, tests
//! supply scripted mocks. Both calls are idempotent from the engine's
//! perspective: duplicate sample delivery is tolerated, and sample loss
//! under sustained failure is bounded by storage capacity.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use pulse_filtering::ConfigurationError;
use pulse_protocol::ConfigurationInfo;

use crate::sample::Sample;

/// Transport-level failure talking to the service.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// The request never completed (connect, send, or receive failed)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("service rejected the request: status {status}")]
    Rejected {
        /// Status code returned by the service
        status: u16,
    },

    /// The response body could not be understood
    #[error("malformed service response: {0}")]
    Malformed(String),
}

/// What the service said in response to a ping or post.
#[derive(Debug, Clone, Default)]
pub struct ServiceResponse {
    /// Whether the service wants collection to run
    pub subscribed: bool,
    /// Configuration document included when the service holds a version
    /// the caller does not have yet
    pub config: Option<ConfigurationInfo>,
}

/// The control-plane service as seen by the state machine.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// URI the client talks to; handed to processors so they can avoid
    /// tracking the engine's own calls as dependencies
    fn service_uri(&self) -> &str;

    /// Ask the service whether anyone is watching. Sent while Idle.
    async fn ping(
        &self,
        instrumentation_key: &str,
        auth_api_key: Option<&str>,
    ) -> Result<ServiceResponse, ServiceError>;

    /// Submit collected samples along with the configuration version they
    /// were collected under and any configuration errors accumulated since
    /// the last successful post. Sent while Collecting.
    async fn post(
        &self,
        instrumentation_key: &str,
        auth_api_key: Option<&str>,
        samples: &[Arc<Sample>],
        config_etag: &str,
        config_errors: &[ConfigurationError],
    ) -> Result<ServiceResponse, ServiceError>;
}
