//! Processor registration and fan-out
//!
//! Telemetry-intercepting components register a `Processor`; the state
//! machine's transitions fan `start_collection`/`stop_collection` out to
//! every registered one. The registry is capped: beyond 100 registrations
//! the oldest is dropped, so a misbehaving host cannot grow it without
//! bound.

use std::collections::VecDeque;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use tracing::debug;

use pulse_filtering::CollectionConfiguration;

use crate::accumulator::AccumulatorManager;

/// Maximum number of registered processors
const MAX_PROCESSORS: usize = 100;

/// Everything a processor needs while collection is active.
#[derive(Clone)]
pub struct CollectionContext {
    /// Where to record counters and documents
    pub accumulators: Arc<AccumulatorManager>,
    /// The service endpoint, so processors can avoid reporting the
    /// engine's own calls as dependencies
    pub service_uri: String,
    /// Live handle to the current configuration; swapped on reconfiguration
    pub configuration: Arc<ArcSwap<CollectionConfiguration>>,
    /// Whether full documents are suppressed (counters still flow)
    pub disable_full_documents: bool,
}

impl std::fmt::Debug for CollectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionContext")
            .field("service_uri", &self.service_uri)
            .field("disable_full_documents", &self.disable_full_documents)
            .finish_non_exhaustive()
    }
}

/// A telemetry-intercepting component fed by collection lifecycle events.
pub trait Processor: Send + Sync {
    /// Collection has started; begin applying filters and recording
    fn start_collection(&self, context: &CollectionContext);

    /// Collection has stopped; release the context and go passive
    fn stop_collection(&self);
}

/// Registry of processors with bounded fan-out.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: RwLock<VecDeque<Arc<dyn Processor>>>,
}

impl ProcessorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor. Beyond the cap the oldest registration is
    /// dropped.
    pub fn register(&self, processor: Arc<dyn Processor>) {
        let mut processors = self.processors.write();
        processors.push_back(processor);
        while processors.len() > MAX_PROCESSORS {
            processors.pop_front();
        }
        debug!(count = processors.len(), "processor registered");
    }

    /// Number of registered processors
    pub fn count(&self) -> usize {
        self.processors.read().len()
    }

    /// Fan `start_collection` out to every registered processor
    pub fn start_all(&self, context: &CollectionContext) {
        for processor in self.processors.read().iter() {
            processor.start_collection(context);
        }
    }

    /// Fan `stop_collection` out to every registered processor
    pub fn stop_all(&self) {
        for processor in self.processors.read().iter() {
            processor.stop_collection();
        }
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("count", &self.count())
            .finish()
    }
}
