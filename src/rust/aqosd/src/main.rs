mod program_control;

use anyhow::Result;
use aqos_config::{load_config, Config, ConfigError};
use aqos_engine::{spawn_snapshot_logger, spawn_traffic_sampler, MetricsEngine};
use std::sync::Arc;
use tracing::{info, warn};

// Use JemAllocator only on supported platforms
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use jemallocator::Jemalloc;
use tracing::level_filters::LevelFilter;

// Use JemAllocator only on supported platforms
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Configure console logging. The level comes from `RUST_LOG`.
pub fn set_console_logging() -> anyhow::Result<()> {
    let level = if let Ok(level) = std::env::var("RUST_LOG") {
        match level.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::WARN,
        }
    } else {
        LevelFilter::WARN
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        // Use a more compact, abbreviated log format
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// A missing config file is not fatal: the monitor runs on defaults.
fn startup_config() -> Result<Arc<Config>> {
    match load_config() {
        Ok(config) => Ok(config),
        Err(ConfigError::ConfigDoesNotExist(path)) => {
            warn!("{path} not found, running with the default configuration");
            Ok(Arc::new(Config::default()))
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<()> {
    set_console_logging()?;
    info!("Adaptive QoS Monitor starting");

    let config = startup_config()?;
    let engine = MetricsEngine::from_config(&config)?;
    if engine.is_model_backed() {
        info!("Congestion classification: model");
    } else {
        info!("Congestion classification: utilization threshold");
    }
    info!(
        "Link capacity {} Mbps, policy {:?}",
        engine.capacity_mbps(),
        engine.policy()
    );

    spawn_traffic_sampler(engine.clone(), &config.sampler)?;
    spawn_snapshot_logger(engine.clone(), &config.storage)?;

    // Blocks until a terminating signal arrives
    program_control::handle_signals(engine)
}
