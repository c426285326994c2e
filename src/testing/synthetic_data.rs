//! Synthetic sensor data for offline testing
//!
//! Generates orientation and detection readings around each angle's
//! profile so the pipeline can be exercised without a device.

use crate::config::CrabPoseConfig;
use crate::profile::AngleProfile;
use crate::types::{BoundingBox, CaptureAngle, DetectionSample, OrientationSample, ValidationStatus};
use crate::validation::{DetectionValidator, OrientationValidator, PoseAggregator, PoseValidation};
use serde::{Deserialize, Serialize};

/// Orientation reading for `angle`, offset from every target by `offset`
/// degrees. Axes the profile does not constrain are reported as untracked.
pub fn synthetic_orientation(angle: CaptureAngle, offset: f64, timestamp: f64) -> OrientationSample {
    let profile = AngleProfile::for_angle(angle);
    OrientationSample::new(
        profile.pitch.target + offset,
        profile.yaw.map(|axis| axis.target + offset),
        profile.roll.map(|axis| axis.target + offset),
        timestamp,
    )
}

/// Subject box centered in frame with the given largest dimension.
pub fn centered_detection(size: f64, timestamp: f64) -> DetectionSample {
    let origin = (1.0 - size) / 2.0;
    DetectionSample::detected(
        BoundingBox {
            x: origin,
            y: origin,
            width: size,
            height: size,
        },
        timestamp,
    )
}

/// A pose whose overall status falls in the same class as `status`.
///
/// `Adjusting` ignores its progress value; the generated pose sits two
/// tolerances off target on every axis.
pub fn synthetic_pose(angle: CaptureAngle, status: ValidationStatus) -> PoseValidation {
    let config = CrabPoseConfig::default();
    let profile = AngleProfile::for_angle(angle);
    let orientation_validator = OrientationValidator::new(config.validation);
    let detection_validator = DetectionValidator::new(config.detection, config.validation);
    let aggregator = PoseAggregator::new(config.validation);

    let (offset, detection, held) = match status {
        ValidationStatus::Locked => (0.0, centered_detection(0.5, 0.0), 1.0),
        ValidationStatus::Valid => (0.0, centered_detection(0.5, 0.0), 0.0),
        ValidationStatus::Adjusting(_) => (2.0 * profile.pitch.tolerance, centered_detection(0.5, 0.0), 0.0),
        ValidationStatus::Invalid => (180.0, DetectionSample::not_detected(0.0), 0.0),
    };

    let orientation = orientation_validator.validate(Some(&synthetic_orientation(angle, offset, 0.0)), profile);
    let detection = detection_validator.validate(Some(&detection));
    aggregator.aggregate(angle, orientation, detection, held)
}

/// One timestamped pair of sensor readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    /// Seconds from trace start
    pub t: f64,
    pub orientation: Option<OrientationSample>,
    pub detection: Option<DetectionSample>,
}

/// Ordered sensor readings, as replayed by the simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseTrace {
    pub samples: Vec<TraceSample>,
}

impl PoseTrace {
    pub fn duration(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.t)
    }

    /// Append `seconds` of readings for `angle` at `rate_hz`, offset from
    /// target by `offset` degrees.
    pub fn hold(&mut self, angle: CaptureAngle, offset: f64, seconds: f64, rate_hz: f64) -> &mut Self {
        let start = self.samples.last().map_or(0.0, |s| s.t + 1.0 / rate_hz);
        let count = (seconds * rate_hz).round() as usize;
        for i in 0..count {
            let t = start + i as f64 / rate_hz;
            self.samples.push(TraceSample {
                t,
                orientation: Some(synthetic_orientation(angle, offset, t)),
                detection: Some(centered_detection(0.5, t)),
            });
        }
        self
    }

    /// A full session: each angle is approached off target, then held.
    pub fn full_session(rate_hz: f64, hold_secs: f64) -> Self {
        let mut trace = Self::default();
        for angle in CaptureAngle::ALL {
            let approach = 3.0 * AngleProfile::for_angle(angle).pitch.tolerance;
            trace.hold(angle, approach, 0.5, rate_hz).hold(angle, 0.0, hold_secs, rate_hz);
        }
        trace
    }
}
