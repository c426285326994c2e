use super::feedback::FeedbackHint;
use crate::config::ValidationConfig;
use crate::profile::{AngleProfile, AxisTarget};
use crate::types::{OrientationSample, ValidationStatus};
use serde::{Deserialize, Serialize};

/// Shortest angular distance in degrees, signed (current relative to target).
pub fn signed_angular_error(current: f64, target: f64) -> f64 {
    (current - target + 180.0).rem_euclid(360.0) - 180.0
}

/// Score for one constrained axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisValidation {
    /// `None` when the required reading was missing
    pub current: Option<f64>,
    pub target: f64,
    pub tolerance: f64,
    pub error: Option<f64>,
    pub is_valid: bool,
    pub progress: f64,
}

impl AxisValidation {
    fn score(current: Option<f64>, axis: &AxisTarget, falloff: f64) -> Self {
        match current {
            Some(value) => {
                let error = signed_angular_error(value, axis.target).abs();
                Self {
                    current: Some(value),
                    target: axis.target,
                    tolerance: axis.tolerance,
                    error: Some(error),
                    is_valid: error <= axis.tolerance,
                    progress: (1.0 - error / (axis.tolerance * falloff)).max(0.0),
                }
            }
            // A missing required axis never passes.
            None => Self {
                current: None,
                target: axis.target,
                tolerance: axis.tolerance,
                error: None,
                is_valid: false,
                progress: 0.0,
            },
        }
    }

    fn signed_error(&self) -> Option<f64> {
        self.current.map(|c| signed_angular_error(c, self.target))
    }
}

/// Orientation score against one [`AngleProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationValidation {
    pub status: ValidationStatus,
    /// Mean progress of the constrained axes (1.0 when all are valid)
    pub progress: f64,
    pub pitch: AxisValidation,
    pub yaw: Option<AxisValidation>,
    pub roll: Option<AxisValidation>,
}

impl OrientationValidation {
    pub fn pitch_error(&self) -> Option<f64> {
        self.pitch.error
    }

    pub fn yaw_error(&self) -> Option<f64> {
        self.yaw.and_then(|y| y.error)
    }

    pub fn roll_error(&self) -> Option<f64> {
        self.roll.and_then(|r| r.error)
    }

    fn axes(&self) -> impl Iterator<Item = (Axis, &AxisValidation)> {
        std::iter::once((Axis::Pitch, &self.pitch))
            .chain(self.yaw.iter().map(|y| (Axis::Yaw, y)))
            .chain(self.roll.iter().map(|r| (Axis::Roll, r)))
    }

    /// Correction for the worst axis, or `HoldStill` when every axis is in range.
    pub fn feedback(&self) -> FeedbackHint {
        let worst = self
            .axes()
            .filter(|(_, a)| !a.is_valid)
            .min_by(|(_, a), (_, b)| a.progress.total_cmp(&b.progress));

        let Some((axis, validation)) = worst else {
            return FeedbackHint::HoldStill;
        };
        let Some(signed) = validation.signed_error() else {
            return FeedbackHint::FaceNotTracked;
        };
        match (axis, signed < 0.0) {
            (Axis::Pitch, true) => FeedbackHint::TiltUp,
            (Axis::Pitch, false) => FeedbackHint::TiltDown,
            (Axis::Yaw, true) => FeedbackHint::TurnRight,
            (Axis::Yaw, false) => FeedbackHint::TurnLeft,
            (Axis::Roll, true) => FeedbackHint::RotateClockwise,
            (Axis::Roll, false) => FeedbackHint::RotateCounterClockwise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Pitch,
    Yaw,
    Roll,
}

/// Scores orientation samples against per-angle targets.
///
/// Validity is a hard per-axis cutoff at 1x tolerance. Progress decays
/// linearly out to `progress_falloff` x tolerance and floors at zero.
#[derive(Debug, Clone, Default)]
pub struct OrientationValidator {
    config: ValidationConfig,
}

impl OrientationValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Score a sample. `None` means no orientation reading is available.
    pub fn validate(&self, sample: Option<&OrientationSample>, profile: &AngleProfile) -> OrientationValidation {
        let falloff = self.config.progress_falloff;

        let pitch = AxisValidation::score(sample.map(|s| s.pitch), &profile.pitch, falloff);
        let yaw = profile
            .yaw
            .map(|axis| AxisValidation::score(sample.and_then(|s| s.yaw), &axis, falloff));
        let roll = profile
            .roll
            .map(|axis| AxisValidation::score(sample.and_then(|s| s.roll), &axis, falloff));

        let axes: Vec<&AxisValidation> = std::iter::once(&pitch)
            .chain(yaw.as_ref())
            .chain(roll.as_ref())
            .collect();

        let all_valid = axes.iter().all(|a| a.is_valid);
        let mean_progress = axes.iter().map(|a| a.progress).sum::<f64>() / axes.len() as f64;

        let (status, progress) = if all_valid {
            (ValidationStatus::Valid, 1.0)
        } else if mean_progress < self.config.low_progress_threshold {
            (ValidationStatus::Invalid, mean_progress)
        } else {
            (ValidationStatus::Adjusting(mean_progress), mean_progress)
        };

        OrientationValidation {
            status,
            progress,
            pitch,
            yaw,
            roll,
        }
    }
}
