use super::orientation::signed_angular_error;
use crate::types::OrientationSample;

/// Exponential smoothing for orientation samples.
///
/// Each axis is filtered independently. An axis that drops out (no reading)
/// loses its history so a stale value never bleeds into the next reading.
#[derive(Debug, Clone)]
pub struct OrientationSmoother {
    alpha: f64,
    last_pitch: Option<f64>,
    last_yaw: Option<f64>,
    last_roll: Option<f64>,
}

impl OrientationSmoother {
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self {
            alpha,
            last_pitch: None,
            last_yaw: None,
            last_roll: None,
        }
    }

    pub fn apply(&mut self, sample: &OrientationSample) -> OrientationSample {
        let pitch = smooth(self.alpha, &mut self.last_pitch, Some(sample.pitch)).unwrap_or(sample.pitch);
        let yaw = smooth(self.alpha, &mut self.last_yaw, sample.yaw);
        let roll = smooth(self.alpha, &mut self.last_roll, sample.roll);
        OrientationSample {
            pitch,
            yaw,
            roll,
            timestamp: sample.timestamp,
        }
    }

    pub fn reset(&mut self) {
        self.last_pitch = None;
        self.last_yaw = None;
        self.last_roll = None;
    }
}

fn smooth(alpha: f64, last: &mut Option<f64>, value: Option<f64>) -> Option<f64> {
    let filtered = match (value, *last) {
        // Step along the shortest arc so ±180° crossings do not swing through zero.
        (Some(v), Some(prev)) => {
            let next = prev + alpha * signed_angular_error(v, prev);
            Some(signed_angular_error(next, 0.0))
        }
        (Some(v), None) => Some(v),
        (None, _) => None,
    };
    *last = filtered;
    filtered
}
