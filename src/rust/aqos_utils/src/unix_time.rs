use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::error;

/// Length of the persistence period, in seconds.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// If the next minute boundary is closer than this, skip to the
/// following one so a boundary is never serviced twice.
pub const MINIMUM_ALIGNMENT_SLEEP: f64 = 0.1;

/// Retrieves the current time, in seconds since the UNIX epoch.
/// Otherwise known as "unix time".
///
/// It can fail if the clock isn't ready.
pub fn unix_now() -> Result<u64, TimeError> {
    unix_now_duration().map(|t| t.as_secs())
}

/// Retrieves the current time as fractional seconds since the UNIX epoch.
pub fn unix_now_f64() -> Result<f64, TimeError> {
    unix_now_duration().map(|t| t.as_secs_f64())
}

fn unix_now_duration() -> Result<Duration, TimeError> {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(t) => Ok(t),
        Err(e) => {
            error!("Error determining the time in UNIX land: {:?}", e);
            Err(TimeError::ClockNotReady)
        }
    }
}

/// How long to sleep, from unix time `now`, until the next wall-clock
/// minute boundary (`:00` seconds).
///
/// The result is re-derived from the clock on every call, so repeated
/// use never accumulates drift. A boundary less than
/// [`MINIMUM_ALIGNMENT_SLEEP`] away is skipped in favour of the next one.
pub fn seconds_until_next_minute(now: f64) -> f64 {
    let mut sleep = SECONDS_PER_MINUTE - now.rem_euclid(SECONDS_PER_MINUTE);
    if sleep < MINIMUM_ALIGNMENT_SLEEP {
        sleep += SECONDS_PER_MINUTE;
    }
    sleep
}

/// [`seconds_until_next_minute`] as a `Duration`.
pub fn duration_until_next_minute(now: f64) -> Duration {
    Duration::from_secs_f64(seconds_until_next_minute(now))
}

/// Error type for time functions.
#[derive(Error, Debug)]
pub enum TimeError {
    /// The clock isn't ready yet.
    #[error("Clock not ready")]
    ClockNotReady,
}

#[cfg(test)]
mod test {
    use super::*;

    // 2026-10-16 12:00:00 UTC
    const NOON: f64 = 1_792_152_000.0;

    #[test]
    fn sleeps_to_the_next_boundary() {
        let sleep = seconds_until_next_minute(NOON + 15.0);
        assert!((sleep - 45.0).abs() < 1e-6);
    }

    #[test]
    fn exactly_on_boundary_waits_a_full_minute() {
        let sleep = seconds_until_next_minute(NOON);
        assert!((sleep - 60.0).abs() < 1e-6);
    }

    #[test]
    fn near_boundary_skips_to_following_minute() {
        // 12:00:59.95 must not fire at 12:01:00
        let sleep = seconds_until_next_minute(NOON + 59.95);
        assert!((sleep - 60.05).abs() < 1e-3, "slept {sleep}");
    }

    #[test]
    fn just_outside_guard_fires_this_minute() {
        let sleep = seconds_until_next_minute(NOON + 59.8);
        assert!((sleep - 0.2).abs() < 1e-3, "slept {sleep}");
    }

    #[test]
    fn target_lands_on_a_boundary() {
        for offset in [0.0, 1.5, 29.99, 59.0, 59.95] {
            let now = NOON + offset;
            let target = now + seconds_until_next_minute(now);
            let remainder = target.rem_euclid(60.0);
            assert!(remainder < 1e-3 || (60.0 - remainder) < 1e-3);
        }
    }

    #[test]
    fn clock_is_ready() {
        assert!(unix_now().is_ok());
        assert!(unix_now_f64().unwrap() > 0.0);
    }
}
