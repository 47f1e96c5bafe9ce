//! Module wiring
//!
//! `LiveMetricsModule` owns the whole subsystem: the accumulator manager,
//! sample storage, processor registry, the compiled configuration handle,
//! and the two background tasks. It implements `CollectionEvents`, so the
//! state machine's transitions land here: starting and stopping the
//! collection task, draining storage, rebuilding configuration, and
//! reconciling the platform counter set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pulse_config::{ConfigError, ModuleConfig};
use pulse_filtering::{CollectionConfiguration, ConfigurationError};
use pulse_protocol::ConfigurationInfo;

use crate::accumulator::AccumulatorManager;
use crate::client::ServiceClient;
use crate::collectors::{PerformanceCollector, TopCpuCollector};
use crate::registry::{CollectionContext, Processor, ProcessorRegistry};
use crate::sample::Sample;
use crate::scheduler::SampleCollector;
use crate::state::{CollectionEvents, CollectionStateManager};
use crate::storage::SampleStorage;

/// Bound on joining the background tasks at shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct CollectionTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct ModuleInner {
    config: ModuleConfig,
    client: Arc<dyn ServiceClient>,
    performance: Arc<dyn PerformanceCollector>,
    top_cpu: Arc<dyn TopCpuCollector>,
    configuration: Arc<ArcSwap<CollectionConfiguration>>,
    accumulators: Arc<AccumulatorManager>,
    storage: Arc<SampleStorage>,
    registry: ProcessorRegistry,
    collection: Mutex<Option<CollectionTask>>,
    /// Serializes counter-set reconciliation against concurrent
    /// reconfiguration
    reconcile_lock: Mutex<()>,
    cancel: CancellationToken,
}

/// The live metrics engine, assembled.
pub struct LiveMetricsModule {
    inner: Arc<ModuleInner>,
    state_task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveMetricsModule {
    /// Wire the module up with its collaborators. Validates the host
    /// configuration; nothing runs until `start` is called.
    pub fn new(
        config: ModuleConfig,
        client: Arc<dyn ServiceClient>,
        performance: Arc<dyn PerformanceCollector>,
        top_cpu: Arc<dyn TopCpuCollector>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let bootstrap = Arc::new(CollectionConfiguration::bootstrap());

        let inner = Arc::new(ModuleInner {
            config,
            client,
            performance,
            top_cpu,
            configuration: Arc::new(ArcSwap::new(Arc::clone(&bootstrap))),
            accumulators: Arc::new(AccumulatorManager::new(bootstrap)),
            storage: Arc::new(SampleStorage::new()),
            registry: ProcessorRegistry::new(),
            collection: Mutex::new(None),
            reconcile_lock: Mutex::new(()),
            cancel: CancellationToken::new(),
        });

        Ok(Self {
            inner,
            state_task: Mutex::new(None),
        })
    }

    /// Attach a telemetry processor. Safe to call before or after `start`.
    pub fn register_processor(&self, processor: Arc<dyn Processor>) {
        self.inner.registry.register(processor);
    }

    /// Start the state task. Idempotent; requires a tokio runtime.
    pub fn start(&self) {
        let mut task = self.state_task.lock();
        if task.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let cancel = self.inner.cancel.clone();
        *task = Some(tokio::spawn(state_worker(inner, cancel)));

        info!("live metrics module started");
    }

    /// Stop both background tasks and join them with a bounded wait.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let state = self.state_task.lock().take();
        let collection = self.inner.stop_collection_task();

        for handle in [state, collection].into_iter().flatten() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                warn!("background task did not stop within the shutdown window");
            }
        }

        info!("live metrics module stopped");
    }
}

/// The always-on state loop. Catches everything: a tick that fails
/// unexpectedly is retried on the catastrophic timeout, and the loop only
/// exits on cancellation.
async fn state_worker(inner: Arc<ModuleInner>, cancel: CancellationToken) {
    let timings = inner.config.timings.clone();
    let mut manager = CollectionStateManager::new(
        Arc::clone(&inner.client),
        Arc::clone(&inner) as Arc<dyn CollectionEvents>,
        timings.clone(),
    );

    loop {
        let tick_started = Instant::now();

        let delay = match manager
            .update_state(
                &inner.config.instrumentation_key,
                inner.config.auth_api_key.as_deref(),
            )
            .await
        {
            Ok(delay) => delay,
            Err(error) => {
                warn!(error = %error, "state tick failed, applying catastrophic backoff");
                timings.catastrophic_failure_timeout
            }
        };

        // Subtract time spent inside the tick so the average cadence
        // stays close to the configured interval
        let sleep_for = delay.saturating_sub(tick_started.elapsed());

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(sleep_for) => {}
        }
    }

    // Leaving the loop mid-collection: bring the collection task down too
    if let Some(handle) = inner.stop_collection_task() {
        let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await;
    }

    debug!("state task stopped");
}

impl ModuleInner {
    /// Cancel the collection task if one is running, handing back its
    /// join handle.
    fn stop_collection_task(&self) -> Option<JoinHandle<()>> {
        let task = self.collection.lock().take()?;
        task.cancel.cancel();
        Some(task.handle)
    }

    /// Reconcile the live counter set against a configuration: remove
    /// counters no longer requested, register newly requested ones.
    /// Failures are per counter and reported, never fatal.
    fn reconcile_performance_counters(
        &self,
        config: &CollectionConfiguration,
    ) -> Vec<ConfigurationError> {
        let _guard = self.reconcile_lock.lock();

        let desired = config.performance_counters();
        let current = self.performance.counters();
        let mut errors = Vec::new();

        for counter in &current {
            if !desired.iter().any(|d| d.report_as == counter.report_as) {
                self.performance.remove_counter(&counter.report_as);
                debug!(counter = %counter.report_as, "counter removed");
            }
        }

        for counter in desired {
            if !current.iter().any(|c| c.report_as == counter.report_as) {
                if let Err(error) = self.performance.register_counter(counter) {
                    warn!(counter = %counter.report_as, error = %error, "counter registration failed");
                    errors.push(ConfigurationError::counter_registration(
                        &counter.report_as,
                        &error,
                    ));
                } else {
                    debug!(counter = %counter.report_as, "counter registered");
                }
            }
        }

        errors
    }

    fn collection_context(&self) -> CollectionContext {
        CollectionContext {
            accumulators: Arc::clone(&self.accumulators),
            service_uri: self.client.service_uri().to_string(),
            configuration: Arc::clone(&self.configuration),
            disable_full_documents: self.config.disable_full_documents,
        }
    }
}

impl CollectionEvents for ModuleInner {
    fn on_start_collection(&self) {
        debug!("starting collection");

        // A collection task may survive an unclean transition; replace it
        if self.stop_collection_task().is_some() {
            warn!("stale collection task found on start");
        }

        let config = self.configuration.load_full();

        let errors = self.reconcile_performance_counters(&config);
        if !errors.is_empty() {
            warn!(errors = errors.len(), "counter reconciliation reported errors");
        }

        // Discard counters accrued while idle so the first sample covers
        // a clean interval
        self.accumulators.complete_current(Arc::clone(&config));

        self.registry.start_all(&self.collection_context());

        let collector = SampleCollector::new(
            Arc::clone(&self.accumulators),
            Arc::clone(&self.configuration),
            Arc::clone(&self.storage),
            Arc::clone(&self.performance),
            Arc::clone(&self.top_cpu),
            self.config.disable_top_cpu,
            self.config.timings.collection_interval,
        );

        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(collector.run(cancel.clone()));
        *self.collection.lock() = Some(CollectionTask { cancel, handle });
    }

    fn on_stop_collection(&self) {
        debug!("stopping collection");

        let _ = self.stop_collection_task();
        self.registry.stop_all();
        self.storage.clear();
    }

    fn on_submit_samples(&self) -> Vec<Arc<Sample>> {
        self.storage.drain()
    }

    fn on_return_failed_samples(&self, samples: Vec<Arc<Sample>>) {
        self.storage.requeue_front(samples);
    }

    fn on_updated_configuration(&self, info: ConfigurationInfo) -> Vec<ConfigurationError> {
        let previous = self.configuration.load();
        let (config, mut errors) =
            CollectionConfiguration::build(&info, previous.document_streams());
        let config = Arc::new(config);

        // Readers always see a complete configuration; the next completed
        // accumulator picks it up
        self.configuration.store(Arc::clone(&config));

        errors.extend(self.reconcile_performance_counters(&config));
        errors
    }
}

impl std::fmt::Debug for LiveMetricsModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveMetricsModule")
            .field("processors", &self.inner.registry.count())
            .field("buffered_samples", &self.inner.storage.len())
            .finish_non_exhaustive()
    }
}
