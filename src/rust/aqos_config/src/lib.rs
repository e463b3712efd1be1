//! Manages the `/etc/aqos.conf` file, and the QoS policy values that
//! can be changed while the daemon runs.

#![warn(missing_docs)]
mod etc;

pub use etc::{
    clamp_voip_alloc, config_path, load_config, reload_config, sanitize_congestion_threshold,
    BulkPriority, ClassifierConfig, Config, ConfigError, LinkConfig, PolicyConfig, PolicyError,
    SamplerConfig, StorageConfig, MAX_CONGESTION_THRESHOLD,
};
