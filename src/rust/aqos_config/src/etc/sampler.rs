use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the traffic sampler reads interface counters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Interface to watch. If absent, the host-wide counters are used.
    pub interface: Option<String>,

    /// Seconds between the two counter reads of a sample.
    pub window_seconds: f64,

    /// Seconds to wait after a failed counter read.
    pub error_backoff_seconds: f64,

    /// Number of recent samples averaged into the published load.
    /// 1 publishes every sample as-is.
    pub smoothing_samples: usize,

    /// Lowest load (Mbps) ever published.
    pub minimum_load_mbps: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interface: None,
            window_seconds: 2.0,
            error_backoff_seconds: 5.0,
            smoothing_samples: 1,
            minimum_load_mbps: 0.01,
        }
    }
}

impl SamplerConfig {
    /// The sample window as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_seconds)
    }

    /// The error backoff as a `Duration`.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs_f64(self.error_backoff_seconds)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.window_seconds.is_finite() || self.window_seconds <= 0.0 {
            return Err("sampler.window_seconds must be positive".to_string());
        }
        if !self.error_backoff_seconds.is_finite() || self.error_backoff_seconds <= 0.0 {
            return Err("sampler.error_backoff_seconds must be positive".to_string());
        }
        if self.smoothing_samples == 0 {
            return Err("sampler.smoothing_samples must be at least 1".to_string());
        }
        if !self.minimum_load_mbps.is_finite() || self.minimum_load_mbps <= 0.0 {
            return Err("sampler.minimum_load_mbps must be positive".to_string());
        }
        Ok(())
    }
}
