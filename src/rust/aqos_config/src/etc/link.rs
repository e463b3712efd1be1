use serde::{Deserialize, Serialize};

/// Reference link against which utilization is measured.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    /// Assumed capacity of the link, in Mbps.
    pub capacity_mbps: f64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            capacity_mbps: 100.0,
        }
    }
}

impl LinkConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.capacity_mbps.is_finite() || self.capacity_mbps <= 0.0 {
            return Err("link.capacity_mbps must be positive".to_string());
        }
        Ok(())
    }
}
