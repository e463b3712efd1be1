//! Top-level configuration file for the Adaptive QoS monitor.

use super::{
    ClassifierConfig, ConfigError, LinkConfig, PolicyConfig, SamplerConfig, StorageConfig,
};
use serde::{Deserialize, Serialize};

const SUPPORTED_VERSION: &str = "1.0";

/// Top-level configuration file for the Adaptive QoS monitor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Version number for the configuration file. Must be "1.0".
    pub version: String,

    /// Traffic sampling cadence and counter source.
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Reference link capacity.
    #[serde(default)]
    pub link: LinkConfig,

    /// Congestion classifier selection.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Initial QoS allocation policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Per-minute snapshot persistence.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION.to_string(),
            sampler: SamplerConfig::default(),
            link: LinkConfig::default(),
            classifier: ClassifierConfig::default(),
            policy: PolicyConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a configuration from a TOML string.
    pub fn load_from_string(raw: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(raw).map_err(|e| ConfigError::CannotParseToml(e.to_string()))?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Test if a configuration is usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.version.trim() != SUPPORTED_VERSION {
            return Err(format!(
                "Configuration file is at version [{}], but only version {SUPPORTED_VERSION} is supported",
                self.version
            ));
        }
        self.sampler.validate()?;
        self.link.validate()?;
        self.classifier.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BulkPriority;

    const EXAMPLE_CONF: &str = r#"
version = "1.0"

[sampler]
interface = "eth0"
window_seconds = 2.0
error_backoff_seconds = 5.0
smoothing_samples = 3

[link]
capacity_mbps = 100.0

[classifier]
model_path = "/opt/aqos/traffic_model.json"

[policy]
voip_alloc = 60
congestion_threshold = 0.5
bulk_priority = "high"

[storage]
enabled = true
database_path = "/tmp/aqos.sqlite"
"#;

    #[test]
    fn load_example() {
        let config = Config::load_from_string(EXAMPLE_CONF).unwrap();
        assert_eq!(config.sampler.interface.as_deref(), Some("eth0"));
        assert_eq!(config.sampler.smoothing_samples, 3);
        assert_eq!(config.policy.voip_alloc, 60);
        assert_eq!(config.policy.bulk_priority, BulkPriority::High);
        assert_eq!(config.storage.database_path, "/tmp/aqos.sqlite");
        assert_eq!(config.classifier.default_confidence, 90.0);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::load_from_string("version = \"1.0\"").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.link.capacity_mbps, 100.0);
        assert_eq!(config.sampler.window_seconds, 2.0);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let result = Config::load_from_string("version = \"1.5\"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn out_of_range_policy_is_clamped() {
        let raw = "version = \"1.0\"\n[policy]\nvoip_alloc = 250\ncongestion_threshold = 1.7\n";
        let config = Config::load_from_string(raw).unwrap();
        assert_eq!(config.policy.voip_alloc, 100);
        assert_eq!(config.policy.congestion_threshold, crate::MAX_CONGESTION_THRESHOLD);
    }

    #[test]
    fn bad_capacity_is_rejected() {
        let raw = "version = \"1.0\"\n[link]\ncapacity_mbps = 0.0\n";
        assert!(Config::load_from_string(raw).is_err());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = Config::load_from_string("version = ");
        assert!(matches!(result, Err(ConfigError::CannotParseToml(_))));
    }
}
