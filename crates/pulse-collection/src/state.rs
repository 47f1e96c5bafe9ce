//! Collection state machine
//!
//! Two states, driven by one task that never stops: while `Idle` the
//! manager pings the service waiting for someone to start watching; while
//! `Collecting` it posts buffered samples and follows the service's
//! instructions. Every timing decision is returned as "time until the
//! next tick" so the driving loop can compensate for time spent inside
//! the tick.
//!
//! Lifecycle side effects (start/stop the collection task, drain and
//! refill storage, rebuild configuration) are inverted through the
//! `CollectionEvents` trait, implemented by the owning module.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use pulse_config::TimingsConfig;
use pulse_filtering::ConfigurationError;
use pulse_protocol::ConfigurationInfo;

use crate::client::{ServiceClient, ServiceResponse};
use crate::error::Result;
use crate::sample::Sample;

/// Whether the engine is actively collecting. In-memory only; a restart
/// always begins Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    /// Nobody is watching; ping periodically
    Idle,
    /// The service is subscribed; sample and post
    Collecting,
}

/// Lifecycle callbacks fired by state transitions.
pub trait CollectionEvents: Send + Sync {
    /// Entering `Collecting`: start the collection task and notify
    /// processors
    fn on_start_collection(&self);

    /// Leaving `Collecting`: stop the collection task, clear storage,
    /// notify processors
    fn on_stop_collection(&self);

    /// Drain buffered samples for transmission
    fn on_submit_samples(&self) -> Vec<Arc<Sample>>;

    /// Put samples whose post failed back into storage
    fn on_return_failed_samples(&self, samples: Vec<Arc<Sample>>);

    /// The service pushed a configuration with a new ETag; rebuild and
    /// propagate it, returning any per-entry errors
    fn on_updated_configuration(&self, info: ConfigurationInfo) -> Vec<ConfigurationError>;
}

/// The state machine. Owned and driven by a single task; not `Sync` on
/// purpose - all mutation happens through `update_state`.
pub struct CollectionStateManager {
    client: Arc<dyn ServiceClient>,
    events: Arc<dyn CollectionEvents>,
    timings: TimingsConfig,
    state: CollectionState,
    current_etag: String,
    /// Configuration errors not yet delivered to the service
    pending_errors: Vec<ConfigurationError>,
}

impl CollectionStateManager {
    /// Create a manager in the `Idle` state with an empty ETag
    pub fn new(
        client: Arc<dyn ServiceClient>,
        events: Arc<dyn CollectionEvents>,
        timings: TimingsConfig,
    ) -> Self {
        Self {
            client,
            events,
            timings,
            state: CollectionState::Idle,
            current_etag: String::new(),
            pending_errors: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> CollectionState {
        self.state
    }

    /// ETag of the configuration version currently in effect
    pub fn current_etag(&self) -> &str {
        &self.current_etag
    }

    /// Run one state tick and return the time until the next one.
    ///
    /// Transport failures are absorbed here (stay in state, back off);
    /// an `Err` means something unexpected and is retried on the
    /// catastrophic timeout by the driving loop.
    pub async fn update_state(
        &mut self,
        instrumentation_key: &str,
        auth_api_key: Option<&str>,
    ) -> Result<Duration> {
        match self.state {
            CollectionState::Idle => self.tick_idle(instrumentation_key, auth_api_key).await,
            CollectionState::Collecting => {
                self.tick_collecting(instrumentation_key, auth_api_key).await
            }
        }
    }

    async fn tick_idle(
        &mut self,
        instrumentation_key: &str,
        auth_api_key: Option<&str>,
    ) -> Result<Duration> {
        match self.client.ping(instrumentation_key, auth_api_key).await {
            Ok(response) if response.subscribed => {
                self.accept_configuration(response);
                self.events.on_start_collection();
                self.state = CollectionState::Collecting;
                info!(etag = %self.current_etag, "service subscribed, collection started");
                Ok(self.timings.collection_interval)
            }
            Ok(_) => {
                debug!("service not subscribed");
                Ok(self.timings.ping_interval)
            }
            Err(error) => {
                warn!(error = %error, "ping failed, backing off");
                Ok(self.timings.backoff_interval)
            }
        }
    }

    async fn tick_collecting(
        &mut self,
        instrumentation_key: &str,
        auth_api_key: Option<&str>,
    ) -> Result<Duration> {
        let samples = self.events.on_submit_samples();

        let outcome = self
            .client
            .post(
                instrumentation_key,
                auth_api_key,
                &samples,
                &self.current_etag,
                &self.pending_errors,
            )
            .await;

        match outcome {
            Ok(response) => {
                self.pending_errors.clear();

                if response.subscribed {
                    self.accept_configuration(response);
                    Ok(self.timings.collection_interval)
                } else {
                    self.events.on_stop_collection();
                    self.state = CollectionState::Idle;
                    info!("service unsubscribed, collection stopped");
                    Ok(self.timings.ping_interval)
                }
            }
            Err(error) => {
                // Samples go back to the front of storage; the ring bound
                // keeps a lagging network from growing memory
                warn!(error = %error, count = samples.len(), "post failed, returning samples");
                self.events.on_return_failed_samples(samples);
                Ok(self.timings.collection_interval)
            }
        }
    }

    /// Apply a piggybacked configuration when its ETag differs from the
    /// version in effect.
    fn accept_configuration(&mut self, response: ServiceResponse) {
        let Some(info) = response.config else {
            return;
        };

        if info.etag == self.current_etag {
            return;
        }

        let etag = info.etag.clone();
        let errors = self.events.on_updated_configuration(info);

        if !errors.is_empty() {
            debug!(etag = %etag, errors = errors.len(), "configuration compiled with errors");
        }

        self.current_etag = etag;
        self.pending_errors.extend(errors);
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
