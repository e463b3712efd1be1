use crate::alerts::{evaluate, local_clock};
use crate::classifier::ClassifierError;
use crate::{
    allocate, derive_features, estimate, Classifier, CongestionState, CounterReading,
    MetricsSnapshot,
};
use aqos_config::{
    clamp_voip_alloc, sanitize_congestion_threshold, BulkPriority, Config, PolicyConfig,
    PolicyError,
};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Lowest load (Mbps) the engine will ever report.
pub const MINIMUM_LOAD_MBPS: f64 = 0.01;

/// Mutable engine state. Only ever touched with the lock held.
struct SharedState {
    current_load_mbps: f64,
    sampled_at: Option<f64>,
    last_counters: Option<CounterReading>,
    policy: PolicyConfig,
    last_classified_state: CongestionState,
}

struct EngineInner {
    state: Mutex<SharedState>,
    classifier: Classifier,
    capacity_mbps: f64,
    load_floor_mbps: f64,
}

/// Handle to the shared metrics state. Cheap to clone; every clone
/// refers to the same state.
#[derive(Clone)]
pub struct MetricsEngine {
    inner: Arc<EngineInner>,
}

impl MetricsEngine {
    pub fn new(
        classifier: Classifier,
        capacity_mbps: f64,
        policy: PolicyConfig,
    ) -> Result<Self, MetricsError> {
        Self::with_load_floor(classifier, capacity_mbps, policy, MINIMUM_LOAD_MBPS)
    }

    pub fn with_load_floor(
        classifier: Classifier,
        capacity_mbps: f64,
        policy: PolicyConfig,
        load_floor_mbps: f64,
    ) -> Result<Self, MetricsError> {
        if !capacity_mbps.is_finite() || capacity_mbps <= 0.0 {
            return Err(MetricsError::InvalidCapacity(capacity_mbps));
        }
        if !load_floor_mbps.is_finite() || load_floor_mbps <= 0.0 {
            return Err(MetricsError::InvalidLoad(load_floor_mbps));
        }
        let policy = sanitize_policy(policy)?;
        Ok(Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(SharedState {
                    current_load_mbps: load_floor_mbps,
                    sampled_at: None,
                    last_counters: None,
                    policy,
                    last_classified_state: CongestionState::Low,
                }),
                classifier,
                capacity_mbps,
                load_floor_mbps,
            }),
        })
    }

    /// Build an engine from the daemon configuration, loading the
    /// congestion model if one is configured.
    pub fn from_config(config: &Config) -> Result<Self, MetricsError> {
        Self::with_load_floor(
            Classifier::from_config(&config.classifier),
            config.link.capacity_mbps,
            config.policy,
            config.sampler.minimum_load_mbps,
        )
    }

    pub fn capacity_mbps(&self) -> f64 {
        self.inner.capacity_mbps
    }

    pub fn is_model_backed(&self) -> bool {
        self.inner.classifier.is_model_backed()
    }

    /// Store a completed sample. The load is floored. Samples read
    /// before the current one (by the monotonic clock) are ignored, and
    /// the reported sample time never goes backwards even if the wall
    /// clock does.
    pub fn record_sample(&self, load_mbps: f64, counters: CounterReading) {
        let load = if load_mbps.is_finite() {
            f64::max(self.inner.load_floor_mbps, load_mbps)
        } else {
            self.inner.load_floor_mbps
        };
        let mut lock = self.inner.state.lock();
        if let Some(previous) = lock.last_counters {
            if counters.taken_at < previous.taken_at {
                debug!("Ignoring out-of-order sample");
                return;
            }
        }
        lock.current_load_mbps = load;
        lock.sampled_at = Some(match lock.sampled_at {
            Some(previous) => f64::max(previous, counters.timestamp),
            None => counters.timestamp,
        });
        lock.last_counters = Some(counters);
    }

    pub fn current_load(&self) -> f64 {
        self.inner.state.lock().current_load_mbps
    }

    pub fn last_counters(&self) -> Option<CounterReading> {
        self.inner.state.lock().last_counters
    }

    pub fn last_classified_state(&self) -> CongestionState {
        self.inner.state.lock().last_classified_state
    }

    /// Build a snapshot of the current metrics.
    ///
    /// Every value is read in one critical section. On error nothing is
    /// changed, including the transition tracking.
    pub fn current_metrics(&self) -> Result<MetricsSnapshot, MetricsError> {
        let mut lock = self.inner.state.lock();
        let features = derive_features(lock.current_load_mbps, self.inner.capacity_mbps)?;
        let classification = self
            .inner
            .classifier
            .classify(&features, lock.policy.congestion_threshold)?;
        let allocation = allocate(classification.state, &lock.policy);
        let performance = estimate(classification.state, &features);
        let alerts = evaluate(
            &local_clock(),
            classification.state,
            &mut lock.last_classified_state,
            &allocation,
            features.utilization_ratio,
            performance.packet_loss,
        );
        Ok(MetricsSnapshot::build(
            lock.sampled_at,
            &features,
            &classification,
            allocation,
            &performance,
            alerts,
        ))
    }

    pub fn policy(&self) -> PolicyConfig {
        self.inner.state.lock().policy
    }

    /// Set the real-time bandwidth share used under high congestion.
    /// Returns the clamped value actually stored.
    pub fn set_voip_alloc(&self, value: i64) -> u8 {
        let value = clamp_voip_alloc(value);
        self.inner.state.lock().policy.voip_alloc = value;
        info!("VoIP allocation set to {value}%");
        value
    }

    /// Set the congestion threshold. Non-finite input is rejected and
    /// the previous threshold kept.
    pub fn set_congestion_threshold(&self, value: f64) -> Result<f64, PolicyError> {
        let value = sanitize_congestion_threshold(value)?;
        self.inner.state.lock().policy.congestion_threshold = value;
        info!("Congestion threshold set to {value}");
        Ok(value)
    }

    pub fn set_bulk_priority(&self, priority: BulkPriority) {
        self.inner.state.lock().policy.bulk_priority = priority;
        info!("Bulk priority set to {priority}");
    }

    pub fn set_bulk_priority_str(&self, priority: &str) -> Result<BulkPriority, PolicyError> {
        let priority = priority.parse::<BulkPriority>()?;
        self.set_bulk_priority(priority);
        Ok(priority)
    }

    /// Replace the whole policy at once. Nothing changes if any value is
    /// rejected.
    pub fn apply_policy(&self, policy: PolicyConfig) -> Result<PolicyConfig, PolicyError> {
        let policy = sanitize_policy(policy)?;
        self.inner.state.lock().policy = policy;
        info!(
            "Policy applied: voip_alloc={}%, congestion_threshold={}, bulk_priority={}",
            policy.voip_alloc, policy.congestion_threshold, policy.bulk_priority
        );
        Ok(policy)
    }
}

fn sanitize_policy(policy: PolicyConfig) -> Result<PolicyConfig, PolicyError> {
    Ok(PolicyConfig {
        voip_alloc: clamp_voip_alloc(policy.voip_alloc as i64),
        congestion_threshold: sanitize_congestion_threshold(policy.congestion_threshold)?,
        bulk_priority: policy.bulk_priority,
    })
}

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid load value: {0}")]
    InvalidLoad(f64),
    #[error("Invalid link capacity: {0}")]
    InvalidCapacity(f64),
    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifierError),
    #[error("Invalid policy: {0}")]
    Policy(#[from] PolicyError),
}
