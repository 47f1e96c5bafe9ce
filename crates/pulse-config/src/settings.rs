//! Module settings
//!
//! Host-supplied settings for the live metrics module: the identity it
//! pings the service with, the optional authenticated-channel API key, and
//! flags that trim what gets collected.

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::timings::TimingsConfig;

/// Live metrics module configuration
///
/// # Example
///
/// ```toml
/// [live_metrics]
/// instrumentation_key = "00000000-0000-0000-0000-000000000000"
/// auth_api_key = "secret"
/// disable_full_documents = false
/// disable_top_cpu = false
///
/// [live_metrics.timings]
/// ping_interval = "5s"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Identity presented to the control-plane service
    pub instrumentation_key: String,

    /// API key for the authenticated configuration channel; without it the
    /// service may withhold configuration that carries sensitive filters
    pub auth_api_key: Option<String>,

    /// Suppress forwarding of full telemetry documents (counters still flow)
    pub disable_full_documents: bool,

    /// Suppress top-CPU-process collection
    pub disable_top_cpu: bool,

    /// Cadence timings
    pub timings: TimingsConfig,
}

impl ModuleConfig {
    /// Create a config with the given instrumentation key and defaults
    /// for everything else
    pub fn new(instrumentation_key: impl Into<String>) -> Self {
        Self {
            instrumentation_key: instrumentation_key.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.instrumentation_key.trim().is_empty() {
            return Err(ConfigError::MissingInstrumentationKey);
        }

        self.timings.validate()
    }
}
