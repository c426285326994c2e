//! Sample timebase
//!
//! Orientation and detection samples carry timestamps in seconds relative
//! to a single monotonic origin so stability windows can be measured
//! without wall-clock jumps.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic clock for sample timestamps
///
/// Sensor adapters stamp samples with [`SampleClock::now`] so that every
/// timestamp fed to a [`PoseTracker`](crate::validation::PoseTracker)
/// shares the same origin.
#[derive(Debug, Clone)]
pub struct SampleClock {
    start: Arc<Instant>,
}

impl SampleClock {
    pub fn new() -> Self {
        Self {
            start: Arc::new(Instant::now()),
        }
    }

    /// Share an existing origin between components
    pub fn from_instant(start: Instant) -> Self {
        Self {
            start: Arc::new(start),
        }
    }

    /// Seconds elapsed since the clock origin
    #[inline]
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Timestamp of a given instant. Instants before the origin map to 0.
    #[inline]
    pub fn at(&self, instant: Instant) -> f64 {
        instant.saturating_duration_since(*self.start).as_secs_f64()
    }

    /// Convert a sample timestamp back into an instant
    pub fn instant_at(&self, timestamp: f64) -> Instant {
        *self.start + Duration::from_secs_f64(timestamp.max(0.0))
    }

    pub fn start_instant(&self) -> Instant {
        *self.start
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::new()
    }
}
