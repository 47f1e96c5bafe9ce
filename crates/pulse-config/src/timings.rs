//! Cadence timings for the state and collection loops
//!
//! Four intervals drive the whole subsystem:
//! - `ping_interval`: how often the state loop pings the service while Idle
//! - `collection_interval`: sample production and post cadence while Collecting
//! - `backoff_interval`: retry spacing after a transport failure while Idle
//! - `catastrophic_failure_timeout`: retry spacing after an unexpected error
//!   anywhere in a state tick
//!
//! # Defaults
//!
//! ```toml
//! [timings]
//! ping_interval = "5s"
//! collection_interval = "1s"
//! backoff_interval = "1m"
//! catastrophic_failure_timeout = "2m"
//! ```

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Upper bound accepted for any interval; catches unit typos like "1000s"
/// meant as "1000ms".
const MAX_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Cadence timings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingsConfig {
    /// Ping cadence while Idle
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,

    /// Sample production and post cadence while Collecting
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub collection_interval: Duration,

    /// Retry spacing after a transport failure while Idle
    /// Default: 1m
    #[serde(with = "humantime_serde")]
    pub backoff_interval: Duration,

    /// Retry spacing after an unexpected state-tick error
    /// Default: 2m
    #[serde(with = "humantime_serde")]
    pub catastrophic_failure_timeout: Duration,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(5),
            collection_interval: Duration::from_secs(1),
            backoff_interval: Duration::from_secs(60),
            catastrophic_failure_timeout: Duration::from_secs(120),
        }
    }
}

impl TimingsConfig {
    /// Validate that every interval is nonzero and plausible
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("ping_interval", self.ping_interval),
            ("collection_interval", self.collection_interval),
            ("backoff_interval", self.backoff_interval),
            (
                "catastrophic_failure_timeout",
                self.catastrophic_failure_timeout,
            ),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroInterval { name });
            }
            if value > MAX_INTERVAL {
                return Err(ConfigError::IntervalTooLarge {
                    name,
                    value,
                    max: MAX_INTERVAL,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let timings = TimingsConfig::default();
        assert_eq!(timings.ping_interval, Duration::from_secs(5));
        assert_eq!(timings.collection_interval, Duration::from_secs(1));
        assert_eq!(timings.backoff_interval, Duration::from_secs(60));
        assert_eq!(
            timings.catastrophic_failure_timeout,
            Duration::from_secs(120)
        );
        assert!(timings.validate().is_ok());
    }

    #[test]
    fn test_deserialize_empty() {
        let timings: TimingsConfig = toml::from_str("").unwrap();
        assert_eq!(timings, TimingsConfig::default());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
ping_interval = "10s"
collection_interval = "500ms"
backoff_interval = "30s"
catastrophic_failure_timeout = "5m"
"#;
        let timings: TimingsConfig = toml::from_str(toml).unwrap();
        assert_eq!(timings.ping_interval, Duration::from_secs(10));
        assert_eq!(timings.collection_interval, Duration::from_millis(500));
        assert_eq!(timings.backoff_interval, Duration::from_secs(30));
        assert_eq!(timings.catastrophic_failure_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let timings: TimingsConfig = toml::from_str(r#"collection_interval = "0s""#).unwrap();
        assert!(matches!(
            timings.validate(),
            Err(ConfigError::ZeroInterval {
                name: "collection_interval"
            })
        ));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let timings: TimingsConfig = toml::from_str(r#"ping_interval = "2h""#).unwrap();
        assert!(matches!(
            timings.validate(),
            Err(ConfigError::IntervalTooLarge {
                name: "ping_interval",
                ..
            })
        ));
    }
}
