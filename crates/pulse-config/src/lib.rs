//! Pulse - Configuration
//!
//! Local configuration for the live metrics engine: cadence timings and
//! module settings. This is the configuration the *host* supplies; the
//! configuration the *service* pushes at runtime lives in `pulse-protocol`
//! as `ConfigurationInfo`.
//!
//! # Defaults
//!
//! Everything has a working default, so a minimal config is valid:
//!
//! ```toml
//! [live_metrics]
//! instrumentation_key = "00000000-0000-0000-0000-000000000000"
//! ```

mod error;
mod settings;
mod timings;

pub use error::ConfigError;
pub use settings::ModuleConfig;
pub use timings::TimingsConfig;
