//! Persists one metrics snapshot at the top of every wall-clock minute.

use crate::{MetricsEngine, MetricsError, MetricsSnapshot};
use aqos_config::StorageConfig;
use aqos_store::{SnapshotRecord, SnapshotStore, SqliteStore};
use aqos_utils::unix_time::{duration_until_next_minute, unix_now_f64, TimeError};
use chrono::Utc;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long to wait before the next logging cycle.
pub type CycleDelay = fn() -> Result<Duration, TimeError>;

/// Time remaining until the next wall-clock minute.
pub fn until_next_minute() -> Result<Duration, TimeError> {
    Ok(duration_until_next_minute(unix_now_f64()?))
}

pub struct SnapshotLogger<S: SnapshotStore> {
    engine: MetricsEngine,
    store: S,
    error_backoff: Duration,
    cycle_delay: CycleDelay,
}

impl<S: SnapshotStore> SnapshotLogger<S> {
    pub fn new(engine: MetricsEngine, store: S, error_backoff: Duration) -> Self {
        Self {
            engine,
            store,
            error_backoff,
            cycle_delay: until_next_minute,
        }
    }

    /// Replace the minute alignment, e.g. to log on a short fixed period.
    pub fn with_cycle_delay(mut self, cycle_delay: CycleDelay) -> Self {
        self.cycle_delay = cycle_delay;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Take a snapshot and persist it. A persistence failure is logged
    /// and otherwise ignored; the snapshot is returned either way.
    pub fn log_once(&self) -> Result<MetricsSnapshot, MetricsError> {
        let snapshot = self.engine.current_metrics()?;
        let record = SnapshotRecord::from(&snapshot);
        match self.store.insert(&record, Utc::now()) {
            Ok(()) => debug!("Persisted snapshot ({})", snapshot.ml.state),
            Err(e) => warn!("Unable to persist snapshot: {e}"),
        }
        Ok(snapshot)
    }

    fn cycle(&self) -> anyhow::Result<()> {
        std::thread::sleep((self.cycle_delay)()?);
        self.log_once()?;
        Ok(())
    }

    /// Log forever, once per minute. Anything other than a persistence
    /// failure backs off before the next cycle.
    pub fn run(self) {
        loop {
            match catch_unwind(AssertUnwindSafe(|| self.cycle())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Snapshot logging failed: {e}");
                    std::thread::sleep(self.error_backoff);
                }
                Err(_) => {
                    error!("Snapshot logger panicked, resuming after backoff");
                    std::thread::sleep(self.error_backoff);
                }
            }
        }
    }
}

/// Start the per-minute snapshot logger. Returns `None` if storage is
/// disabled.
pub fn spawn_snapshot_logger(
    engine: MetricsEngine,
    config: &StorageConfig,
) -> anyhow::Result<Option<JoinHandle<()>>> {
    if !config.enabled {
        info!("Snapshot storage is disabled");
        return Ok(None);
    }
    let store = SqliteStore::new(&config.database_path);
    let backoff = config.error_backoff();
    info!("Persisting snapshots to {}", config.database_path);
    let handle = std::thread::Builder::new()
        .name("Snapshot Logger".to_string())
        .spawn(move || {
            SnapshotLogger::new(engine, store, backoff).run();
        })?;
    Ok(Some(handle))
}
