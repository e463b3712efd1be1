use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-minute snapshot persistence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Should snapshots be persisted at all?
    pub enabled: bool,

    /// SQLite database file.
    pub database_path: String,

    /// Seconds to wait after a failed logging cycle.
    pub error_backoff_seconds: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: "/var/lib/aqos/metrics.sqlite".to_string(),
            error_backoff_seconds: 5.0,
        }
    }
}

impl StorageConfig {
    /// The error backoff as a `Duration`.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs_f64(self.error_backoff_seconds)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.enabled && self.database_path.trim().is_empty() {
            return Err("storage.database_path cannot be empty".to_string());
        }
        if !self.error_backoff_seconds.is_finite() || self.error_backoff_seconds <= 0.0 {
            return Err("storage.error_backoff_seconds must be positive".to_string());
        }
        Ok(())
    }
}
