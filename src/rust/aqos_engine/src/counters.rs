use aqos_utils::unix_time::{unix_now_f64, TimeError};
use std::time::Instant;
use sysinfo::Networks;
use thiserror::Error;

/// Cumulative interface byte counters at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CounterReading {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    /// Unix time (fractional seconds) the counters were read. Display
    /// only: wall-clock steps make it unusable for intervals.
    pub timestamp: f64,
    /// Monotonic read time. Rates and sample ordering use this.
    pub taken_at: Instant,
}

/// Reads cumulative sent/received byte counters.
///
/// Counters are expected to be monotonically non-decreasing, but may
/// reset when an interface restarts.
pub trait CounterSource {
    fn read(&mut self) -> Result<CounterReading, CounterError>;
}

/// Counter source backed by `sysinfo`. Reads a single named interface,
/// or the host-wide totals if no interface is given.
pub struct SysinfoCounters {
    networks: Networks,
    interface: Option<String>,
}

impl SysinfoCounters {
    pub fn new(interface: Option<String>) -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            interface,
        }
    }
}

impl CounterSource for SysinfoCounters {
    fn read(&mut self) -> Result<CounterReading, CounterError> {
        self.networks.refresh();
        let taken_at = Instant::now();
        let timestamp = unix_now_f64()?;

        let (bytes_sent, bytes_recv) = match &self.interface {
            Some(name) => {
                let data = self
                    .networks
                    .list()
                    .get(name)
                    .ok_or_else(|| CounterError::InterfaceNotFound(name.clone()))?;
                (data.total_transmitted(), data.total_received())
            }
            None => {
                if self.networks.list().is_empty() {
                    return Err(CounterError::NoInterfaces);
                }
                self.networks.list().iter().fold((0u64, 0u64), |(tx, rx), (_, data)| {
                    (
                        tx.saturating_add(data.total_transmitted()),
                        rx.saturating_add(data.total_received()),
                    )
                })
            }
        };

        Ok(CounterReading {
            bytes_sent,
            bytes_recv,
            timestamp,
            taken_at,
        })
    }
}

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Network interface {0} not found")]
    InterfaceNotFound(String),
    #[error("No network interfaces are visible")]
    NoInterfaces,
    #[error("Unable to read the clock: {0}")]
    Clock(#[from] TimeError),
    #[error("Counter read failed: {0}")]
    Read(String),
}
