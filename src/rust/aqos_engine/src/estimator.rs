use crate::{CongestionState, DerivedFeatures};

/// Loss above this utilization grows linearly under high congestion.
const LOSS_KNEE_UTILIZATION: f64 = 0.75;

/// Estimated performance after the allocation policy is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceEstimate {
    pub delay_ms: f64,
    pub throughput_mbps: f64,
    /// Percent.
    pub packet_loss: f64,
}

pub fn estimate(state: CongestionState, features: &DerivedFeatures) -> PerformanceEstimate {
    let (delay_ms, packet_loss) = match state {
        CongestionState::High => (
            features.base_delay_ms * 0.8,
            0.5 + f64::max(0.0, features.utilization_ratio - LOSS_KNEE_UTILIZATION) * 5.0,
        ),
        CongestionState::Med => (features.base_delay_ms * 0.9, 0.1),
        CongestionState::Low => (features.base_delay_ms, 0.02),
    };
    PerformanceEstimate {
        delay_ms,
        throughput_mbps: features.load_mbps * (1.0 - packet_loss / 100.0),
        packet_loss,
    }
}
