//! Adaptive QoS engine. Samples interface counters on a background
//! thread, derives synthetic QoS telemetry from the current load,
//! classifies congestion, and applies a state-dependent bandwidth and
//! queue allocation policy.
//!
//! All mutable state lives behind one [`MetricsEngine`] handle. Request
//! handlers, the traffic sampler and the snapshot logger each hold a
//! clone of it.

#![deny(clippy::unwrap_used)]
mod alerts;
mod allocator;
pub mod classifier;
mod counters;
mod engine;
mod estimator;
mod features;
mod ring_buffer;
mod sampler;
mod snapshot;
mod snapshot_logger;

pub use alerts::{AlertEvent, AlertSeverity, CRITICAL_UTILIZATION, ELEVATED_LOSS_PERCENT};
pub use allocator::{allocate, Allocation, ShareTriple};
pub use classifier::{Classification, Classifier, CongestionState};
pub use counters::{CounterError, CounterReading, CounterSource, SysinfoCounters};
pub use engine::{MetricsEngine, MetricsError, MINIMUM_LOAD_MBPS};
pub use estimator::{estimate, PerformanceEstimate};
pub use features::{derive_features, utilization_ratio, DerivedFeatures, TrafficComposition};
pub use sampler::{load_mbps, spawn_traffic_sampler, TrafficSampler};
pub use snapshot::{
    ClassificationView, MetricsSnapshot, MonitoringView, PerformanceView, RouterView, TrafficView,
};
pub use snapshot_logger::{spawn_snapshot_logger, until_next_minute, CycleDelay, SnapshotLogger};
