//! Background traffic sampler. Reads the interface counters twice per
//! window and stores the resulting load in the engine.

use crate::ring_buffer::RingBuffer;
use crate::{CounterError, CounterReading, CounterSource, MetricsEngine, SysinfoCounters};
use aqos_config::SamplerConfig;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const BITS_PER_BYTE: f64 = 8.0;
const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Load in Mbps between two counter readings, never below `floor`.
/// The interval comes from the monotonic read times, so wall-clock
/// steps don't distort it. A counter that went backwards counts as no
/// traffic.
pub fn load_mbps(first: &CounterReading, second: &CounterReading, floor: f64) -> f64 {
    let elapsed = second
        .taken_at
        .saturating_duration_since(first.taken_at)
        .as_secs_f64();
    if elapsed <= 0.0 {
        return floor;
    }
    let sent = second.bytes_sent.saturating_sub(first.bytes_sent);
    let recv = second.bytes_recv.saturating_sub(first.bytes_recv);
    let bytes = sent.saturating_add(recv) as f64;
    f64::max(floor, bytes / elapsed * BITS_PER_BYTE / BITS_PER_MEGABIT)
}

pub struct TrafficSampler<C: CounterSource> {
    source: C,
    engine: MetricsEngine,
    window: Duration,
    error_backoff: Duration,
    floor_mbps: f64,
    history: RingBuffer,
}

impl<C: CounterSource> TrafficSampler<C> {
    pub fn new(source: C, engine: MetricsEngine, config: &SamplerConfig) -> Self {
        Self {
            source,
            engine,
            window: config.window(),
            error_backoff: config.error_backoff(),
            floor_mbps: config.minimum_load_mbps,
            history: RingBuffer::new(config.smoothing_samples),
        }
    }

    /// Take one sample and store it. Returns the load that was stored.
    pub fn sample_once(&mut self) -> Result<f64, CounterError> {
        let first = self.source.read()?;
        std::thread::sleep(self.window);
        let second = self.source.read()?;

        let load = load_mbps(&first, &second, self.floor_mbps);
        self.history.add(load);
        let smoothed = self.history.average().unwrap_or(load);
        self.engine.record_sample(smoothed, second);
        debug!("Sampled {smoothed:.3} Mbps");
        Ok(smoothed)
    }

    /// Sample forever. Errors and panics are logged, followed by the
    /// error backoff.
    pub fn run(mut self) {
        loop {
            match catch_unwind(AssertUnwindSafe(|| self.sample_once())) {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!("Traffic sampling failed: {e}");
                    std::thread::sleep(self.error_backoff);
                }
                Err(_) => {
                    error!("Traffic sampler panicked, resuming after backoff");
                    std::thread::sleep(self.error_backoff);
                }
            }
        }
    }
}

/// Start the traffic sampler on its own thread, reading the configured
/// interface (or the host totals).
pub fn spawn_traffic_sampler(
    engine: MetricsEngine,
    config: &SamplerConfig,
) -> anyhow::Result<JoinHandle<()>> {
    let config = config.clone();
    let handle = std::thread::Builder::new()
        .name("Traffic Sampler".to_string())
        .spawn(move || {
            match &config.interface {
                Some(name) => info!("Sampling traffic on interface {name}"),
                None => info!("Sampling traffic on all interfaces"),
            }
            let source = SysinfoCounters::new(config.interface.clone());
            TrafficSampler::new(source, engine, &config).run();
        })?;
    Ok(handle)
}
