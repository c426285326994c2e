use super::detection::DetectionValidation;
use super::feedback::FeedbackHint;
use super::orientation::OrientationValidation;
use crate::config::ValidationConfig;
use crate::types::{CaptureAngle, ValidationStatus};
use serde::{Deserialize, Serialize};

/// Combined orientation and detection result for one sample instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseValidation {
    /// The angle this pose was scored against
    pub angle: CaptureAngle,
    pub orientation: OrientationValidation,
    pub detection: DetectionValidation,
    pub is_stable: bool,
    /// Seconds continuously spent Valid-or-better
    pub stability_duration: f64,
    pub overall_status: ValidationStatus,
    pub progress: f64,
    pub primary_feedback: FeedbackHint,
}

impl PoseValidation {
    pub fn is_locked(&self) -> bool {
        self.overall_status.is_locked()
    }
}

/// Pure combination of sub-validations into a [`PoseValidation`].
///
/// Owns no timer: the caller supplies how long the pose has been held
/// Valid-or-better (see [`PoseTracker`](super::PoseTracker)).
#[derive(Debug, Clone, Default)]
pub struct PoseAggregator {
    config: ValidationConfig,
}

impl PoseAggregator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn stability_threshold(&self) -> f64 {
        self.config.stability_threshold_secs
    }

    pub fn aggregate(
        &self,
        angle: CaptureAngle,
        orientation: OrientationValidation,
        detection: DetectionValidation,
        stability_duration: f64,
    ) -> PoseValidation {
        let both_valid = orientation.status.is_valid_or_better() && detection.status.is_valid_or_better();

        // Stability never survives a sample below Valid.
        let stability_duration = if both_valid { stability_duration.max(0.0) } else { 0.0 };
        let is_stable = both_valid && stability_duration >= self.config.stability_threshold_secs;

        let (overall_status, progress) = if both_valid {
            let status = if is_stable {
                ValidationStatus::Locked
            } else {
                ValidationStatus::Valid
            };
            (status, 1.0)
        } else {
            let combined = (orientation.progress + detection.progress) / 2.0;
            let status = if combined < self.config.aggregate_invalid_threshold {
                ValidationStatus::Invalid
            } else {
                ValidationStatus::Adjusting(combined)
            };
            (status, combined)
        };

        let primary_feedback = match overall_status {
            ValidationStatus::Locked => FeedbackHint::Ready,
            ValidationStatus::Valid => FeedbackHint::HoldStill,
            _ if detection.progress < orientation.progress => detection.feedback,
            _ => orientation.feedback(),
        };

        PoseValidation {
            angle,
            orientation,
            detection,
            is_stable,
            stability_duration,
            overall_status,
            progress,
            primary_feedback,
        }
    }
}
