use anyhow::Result;
use aqos_config::reload_config;
use aqos_engine::MetricsEngine;
use signal_hook::{
    consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1},
    iterator::Signals,
};
use tracing::{error, warn};

/// Service process signals until told to stop.
///
/// * `SIGINT`/`SIGTERM` exit.
/// * `SIGHUP` re-reads the configuration file and applies its `[policy]`.
///   Sampler, link and storage settings need a restart.
/// * `SIGUSR1` logs the current snapshot as JSON.
pub fn handle_signals(engine: MetricsEngine) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGHUP, SIGTERM, SIGUSR1])?;
    for sig in signals.forever() {
        match sig {
            SIGINT | SIGTERM => {
                match sig {
                    SIGINT => warn!("Terminating on SIGINT"),
                    SIGTERM => warn!("Terminating on SIGTERM"),
                    _ => warn!("This should never happen - terminating on unknown signal"),
                }
                std::process::exit(0);
            }
            SIGHUP => {
                warn!("Reloading configuration because of SIGHUP");
                reload_policy(&engine);
            }
            SIGUSR1 => log_snapshot(&engine),
            _ => warn!("No handler for signal: {sig}"),
        }
    }
    Ok(())
}

fn reload_policy(engine: &MetricsEngine) {
    let config = match reload_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to reload configuration, keeping the current policy: {e}");
            return;
        }
    };
    if let Err(e) = engine.apply_policy(config.policy) {
        error!("Rejected policy from configuration: {e}");
    }
}

fn log_snapshot(engine: &MetricsEngine) {
    match engine.current_metrics() {
        Ok(snapshot) => match serde_json::to_string(&snapshot) {
            Ok(json) => warn!("Current snapshot: {json}"),
            Err(e) => error!("Unable to serialize snapshot: {e}"),
        },
        Err(e) => error!("Unable to build snapshot: {e}"),
    }
}
