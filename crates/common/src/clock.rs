//! Clock and timing utilities for playback and recording.
//!
//! Recording is bounded by wall-clock time measured from a monotonic epoch,
//! while sequence playback and frame capture are paced by fixed-rate tick
//! controllers fed with frame timestamps.

use std::time::{Duration, Instant};

/// A recording clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment recording started).
#[derive(Debug, Clone)]
pub struct RecordingClock {
    /// The instant recording started.
    epoch: Instant,

    /// Wall-clock time at epoch.
    epoch_wall: chrono::DateTime<chrono::Utc>,
}

impl RecordingClock {
    /// Create a new recording clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now(),
        }
    }

    /// Get seconds elapsed since recording start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Whether at least `limit` has passed since the epoch.
    pub fn has_elapsed(&self, limit: Duration) -> bool {
        self.epoch.elapsed() >= limit
    }

    /// Wall-clock time at recording start (RFC 3339).
    pub fn epoch_wall(&self) -> String {
        self.epoch_wall.to_rfc3339()
    }
}

/// Fixed-rate tick controller.
///
/// Drives sequence playback at 30 Hz from caller-supplied timestamps.
#[derive(Debug, Clone)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_hz.max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    ///
    /// Ticks are scheduled on the fixed grid `last + interval` so a late
    /// caller does not accumulate drift.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                let behind = (current_ns - last) / self.target_interval_ns;
                self.last_tick_ns = Some(last + behind * self.target_interval_ns);
                true
            }
            _ => false,
        }
    }

    /// Forget the last tick; the next call fires immediately.
    pub fn reset(&mut self) {
        self.last_tick_ns = None;
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }

    /// Target interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.target_interval_ns)
    }
}
