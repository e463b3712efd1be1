use super::CongestionState;

/// Confidence reported by threshold classification.
pub const THRESHOLD_CONFIDENCE: f64 = 80.0;

/// The medium band ends this far above the congestion threshold...
const MEDIUM_BAND_WIDTH: f64 = 0.35;
/// ...but never above this utilization.
const MEDIUM_BAND_CEILING: f64 = 0.95;

/// Classify by utilization alone.
pub fn threshold_state(utilization_ratio: f64, threshold: f64) -> CongestionState {
    if utilization_ratio < threshold {
        CongestionState::Low
    } else if utilization_ratio < f64::min(MEDIUM_BAND_CEILING, threshold + MEDIUM_BAND_WIDTH) {
        CongestionState::Med
    } else {
        CongestionState::High
    }
}
