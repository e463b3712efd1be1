//! Loads and caches the `/etc/aqos.conf` file.

mod classifier;
mod link;
mod policy;
mod sampler;
mod storage;
mod top_config;

pub use classifier::ClassifierConfig;
pub use link::LinkConfig;
pub use policy::{
    clamp_voip_alloc, sanitize_congestion_threshold, BulkPriority, PolicyConfig, PolicyError,
    MAX_CONGESTION_THRESHOLD,
};
pub use sampler::SamplerConfig;
pub use storage::StorageConfig;
pub use top_config::Config;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

const DEFAULT_CONFIG_PATH: &str = "/etc/aqos.conf";
const CONFIG_PATH_ENV: &str = "AQOS_CONFIG";

static CONFIG: Lazy<Mutex<Option<Arc<Config>>>> = Lazy::new(|| Mutex::new(None));

/// Location of the configuration file. `AQOS_CONFIG` overrides the
/// default of `/etc/aqos.conf`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the configuration from disk, or return the cached copy if it
/// has already been loaded.
pub fn load_config() -> Result<Arc<Config>, ConfigError> {
    let mut lock = CONFIG.lock();
    if let Some(config) = lock.as_ref() {
        return Ok(config.clone());
    }
    let config = Arc::new(read_config_file(&config_path())?);
    *lock = Some(config.clone());
    Ok(config)
}

/// Re-read the configuration file, replacing the cached copy. On failure
/// the previously cached configuration is retained.
pub fn reload_config() -> Result<Arc<Config>, ConfigError> {
    let config = Arc::new(read_config_file(&config_path())?);
    *CONFIG.lock() = Some(config.clone());
    info!("Configuration reloaded");
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    debug!("Loading configuration from {}", path.display());
    if !path.exists() {
        error!("{} does not exist!", path.display());
        return Err(ConfigError::ConfigDoesNotExist(path.display().to_string()));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| {
        error!("Unable to read contents of {}: {e:?}", path.display());
        ConfigError::CannotReadFile
    })?;
    Config::load_from_string(&raw)
}

/// Errors raised while loading `/etc/aqos.conf`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file is missing.
    #[error("{0} not found. You must setup this file to use the QoS monitor.")]
    ConfigDoesNotExist(String),
    /// The file exists, but couldn't be read.
    #[error("Unable to read the configuration file.")]
    CannotReadFile,
    /// The file isn't valid TOML for this schema.
    #[error("Unable to parse TOML: {0}")]
    CannotParseToml(String),
    /// The file parsed, but contains values we can't use.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
