//! Pulse - Collection
//!
//! The live metrics engine: accumulates in-process counters with
//! lock-minimal double buffering, snapshots them into samples once per
//! second while an operator is watching, and drives the collection state
//! machine against the control-plane service.
//!
//! # Architecture
//!
//! ```text
//! telemetry threads                state task (always running)
//!     │                                 │
//!     ▼                                 │ ping/post
//! LiveMetricsProcessor ──► Accumulator  │
//!     (filters, quota)        │ swap    ▼
//!                             ▼    CollectionStateManager
//!                      collection task  │ start/stop/submit
//!                             │         ▼
//!                             ▼    LiveMetricsModule ◄── processors (≤100)
//!                        SampleStorage (ring of 10)
//! ```
//!
//! The state task runs continuously and owns every service interaction.
//! The collection task exists only while the service is subscribed; it
//! completes the current accumulator each tick, merges in performance
//! counters and top-CPU data, and appends the sample to bounded storage.
//! The state task drains that storage on its own cadence and posts it.
//!
//! No error escapes either task: transport failures back off, collector
//! failures drop the affected value, anything unexpected is caught and
//! retried on the catastrophic timeout.

mod accumulator;
mod client;
mod collectors;
mod error;
mod module;
mod processor;
mod registry;
mod sample;
mod scheduler;
mod state;
mod storage;
mod timeslot;

pub use accumulator::{Accumulator, AccumulatorManager, CounterSnapshot, TelemetryDocument};
pub use client::{ServiceClient, ServiceError, ServiceResponse};
pub use collectors::{CollectorError, PerformanceCollector, TopCpuCollector};
pub use error::CollectionError;
pub use module::LiveMetricsModule;
pub use processor::LiveMetricsProcessor;
pub use registry::{CollectionContext, Processor, ProcessorRegistry};
pub use sample::{MetricValue, Sample};
pub use state::{CollectionEvents, CollectionState, CollectionStateManager};
pub use storage::SampleStorage;
