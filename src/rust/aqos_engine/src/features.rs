//! Closed-form monitoring features derived from the current load.
//!
//! The multipliers and floors here are fixed policy constants. They are
//! not measured, and must not drift: persisted history is compared
//! across releases.

use crate::MetricsError;

/// Loads below this (Mbps) use the light-traffic split.
const LIGHT_TRAFFIC_MBPS: f64 = 1.0;

const ARRIVALS_PER_MBPS: f64 = 120.0;
const BASE_DELAY_MS: f64 = 5.0;
const MAX_UTILIZATION_RATIO: f64 = 0.99;
const QUEUE_ONSET_FRACTION: f64 = 0.4;
const QUEUE_PACKETS_PER_MBPS: f64 = 50.0;

/// Share of the load, and floor, for one traffic class in one regime.
struct ClassSplit {
    share: f64,
    floor_mbps: f64,
}

struct SplitRegime {
    real_time: ClassSplit,
    interactive: ClassSplit,
    bulk: ClassSplit,
}

// Light load: real-time traffic is a large share of what little there is.
const LIGHT_REGIME: SplitRegime = SplitRegime {
    real_time: ClassSplit { share: 0.30, floor_mbps: 0.02 },
    interactive: ClassSplit { share: 0.45, floor_mbps: 0.1 },
    bulk: ClassSplit { share: 0.25, floor_mbps: 0.05 },
};

// Heavy load: interactive traffic dominates.
const HEAVY_REGIME: SplitRegime = SplitRegime {
    real_time: ClassSplit { share: 0.05, floor_mbps: 0.05 },
    interactive: ClassSplit { share: 0.65, floor_mbps: 0.5 },
    bulk: ClassSplit { share: 0.30, floor_mbps: 0.1 },
};

/// Estimated per-class traffic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrafficComposition {
    pub real_time_kbps: f64,
    pub interactive_mbps: f64,
    pub bulk_mbps: f64,
    pub aggregate_mbps: f64,
}

impl TrafficComposition {
    fn split(load_mbps: f64) -> Self {
        let regime = if load_mbps < LIGHT_TRAFFIC_MBPS {
            &LIGHT_REGIME
        } else {
            &HEAVY_REGIME
        };
        let class = |split: &ClassSplit| f64::max(split.floor_mbps, load_mbps * split.share);
        Self {
            real_time_kbps: class(&regime.real_time) * 1000.0,
            interactive_mbps: class(&regime.interactive),
            bulk_mbps: class(&regime.bulk),
            aggregate_mbps: load_mbps,
        }
    }
}

/// Everything the classifier and estimator need, derived from one load
/// reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedFeatures {
    pub load_mbps: f64,
    pub traffic: TrafficComposition,
    pub arrival_rate: u64,
    pub utilization_ratio: f64,
    pub base_delay_ms: f64,
    pub queue_length: f64,
}

impl DerivedFeatures {
    /// Model input, in training column order: load, delay, queue, arrivals.
    pub fn model_input(&self) -> [f64; 4] {
        [
            self.load_mbps,
            self.base_delay_ms,
            self.queue_length,
            self.arrival_rate as f64,
        ]
    }
}

/// Current load as a fraction of capacity, capped at 0.99 so that
/// `1 / (1 - ratio)` stays finite.
pub fn utilization_ratio(load_mbps: f64, capacity_mbps: f64) -> f64 {
    f64::min(MAX_UTILIZATION_RATIO, load_mbps / capacity_mbps)
}

/// Derive the monitoring features for `load_mbps` on a link of
/// `capacity_mbps`.
pub fn derive_features(load_mbps: f64, capacity_mbps: f64) -> Result<DerivedFeatures, MetricsError> {
    if !load_mbps.is_finite() || load_mbps < 0.0 {
        return Err(MetricsError::InvalidLoad(load_mbps));
    }
    if !capacity_mbps.is_finite() || capacity_mbps <= 0.0 {
        return Err(MetricsError::InvalidCapacity(capacity_mbps));
    }

    let utilization_ratio = utilization_ratio(load_mbps, capacity_mbps);
    let base_delay_ms = BASE_DELAY_MS / (1.0 - utilization_ratio);
    let queue_length = f64::max(
        0.0,
        (load_mbps - capacity_mbps * QUEUE_ONSET_FRACTION) * QUEUE_PACKETS_PER_MBPS,
    );

    Ok(DerivedFeatures {
        load_mbps,
        traffic: TrafficComposition::split(load_mbps),
        arrival_rate: (load_mbps * ARRIVALS_PER_MBPS).floor() as u64,
        utilization_ratio,
        base_delay_ms,
        queue_length,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn features(load: f64, capacity: f64) -> DerivedFeatures {
        derive_features(load, capacity).expect("valid inputs")
    }

    #[test]
    fn utilization_is_bounded() {
        for load in [0.0, 0.01, 1.0, 50.0, 99.0, 100.0, 250.0, 1e9] {
            let f = features(load, 100.0);
            assert!((0.0..=0.99).contains(&f.utilization_ratio));
            assert!(f.base_delay_ms.is_finite());
            assert!(f.base_delay_ms > 0.0);
        }
    }

    #[test]
    fn delay_is_finite_at_capacity() {
        let f = features(100.0, 100.0);
        assert_eq!(f.utilization_ratio, 0.99);
        assert!((f.base_delay_ms - 500.0).abs() < 1e-6);
    }

    #[test]
    fn light_regime_floors() {
        let f = features(0.5, 100.0);
        assert!(f.traffic.real_time_kbps >= 20.0);
        assert!(f.traffic.interactive_mbps >= 0.1);
        assert!(f.traffic.bulk_mbps >= 0.05);
        // Light load favours real-time traffic
        assert!((f.traffic.real_time_kbps - 150.0).abs() < 1e-9);
    }

    #[test]
    fn tiny_load_hits_floors() {
        let f = features(0.01, 100.0);
        assert!((f.traffic.real_time_kbps - 20.0).abs() < 1e-9);
        assert!((f.traffic.interactive_mbps - 0.1).abs() < 1e-9);
        assert!((f.traffic.bulk_mbps - 0.05).abs() < 1e-9);
    }

    #[test]
    fn heavy_regime_favours_interactive() {
        let f = features(40.0, 100.0);
        assert!((f.traffic.interactive_mbps - 26.0).abs() < 1e-9);
        assert!((f.traffic.bulk_mbps - 12.0).abs() < 1e-9);
        assert!((f.traffic.real_time_kbps - 2000.0).abs() < 1e-9);
        assert_eq!(f.traffic.aggregate_mbps, 40.0);
    }

    #[test]
    fn regime_switches_at_one_mbps() {
        let below = features(0.999, 100.0);
        let at = features(1.0, 100.0);
        assert!(below.traffic.real_time_kbps > at.traffic.real_time_kbps);
        assert!(at.traffic.interactive_mbps >= 0.5);
    }

    #[test]
    fn arrival_and_queue() {
        let f = features(95.0, 100.0);
        assert_eq!(f.arrival_rate, 11400);
        assert!((f.queue_length - 2750.0).abs() < 1e-9);
        assert!((f.base_delay_ms - 100.0).abs() < 1e-6);

        let idle = features(10.0, 100.0);
        assert_eq!(idle.queue_length, 0.0);
    }

    #[test]
    fn model_input_order() {
        let f = features(60.0, 100.0);
        let input = f.model_input();
        assert_eq!(input[0], 60.0);
        assert_eq!(input[1], f.base_delay_ms);
        assert_eq!(input[2], f.queue_length);
        assert_eq!(input[3], 7200.0);
    }

    #[test]
    fn invalid_inputs_are_errors() {
        assert!(derive_features(f64::NAN, 100.0).is_err());
        assert!(derive_features(-1.0, 100.0).is_err());
        assert!(derive_features(1.0, 0.0).is_err());
    }
}
