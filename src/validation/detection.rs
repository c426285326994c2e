use super::feedback::FeedbackHint;
use crate::config::ValidationConfig;
use crate::profile::DetectionPolicy;
use crate::types::{BoundingBox, CenterOffset, DetectionSample, ValidationStatus};
use serde::{Deserialize, Serialize};

/// Subject presence and framing score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionValidation {
    pub status: ValidationStatus,
    pub is_detected: bool,
    pub bounding_box: Option<BoundingBox>,
    pub center_offset: CenterOffset,
    pub size_ratio: f64,
    pub center_progress: f64,
    pub size_progress: f64,
    /// Mean of center and size progress (1.0 when framing is valid)
    pub progress: f64,
    pub feedback: FeedbackHint,
}

impl DetectionValidation {
    fn not_detected() -> Self {
        Self {
            status: ValidationStatus::Invalid,
            is_detected: false,
            bounding_box: None,
            center_offset: CenterOffset::default(),
            size_ratio: 0.0,
            center_progress: 0.0,
            size_progress: 0.0,
            progress: 0.0,
            feedback: FeedbackHint::NotDetected,
        }
    }
}

/// Scores subject detection against a [`DetectionPolicy`].
#[derive(Debug, Clone, Default)]
pub struct DetectionValidator {
    policy: DetectionPolicy,
    config: ValidationConfig,
}

impl DetectionValidator {
    pub fn new(policy: DetectionPolicy, config: ValidationConfig) -> Self {
        Self { policy, config }
    }

    pub fn policy(&self) -> &DetectionPolicy {
        &self.policy
    }

    /// Score a sample. `None` means no detection result is available.
    pub fn validate(&self, sample: Option<&DetectionSample>) -> DetectionValidation {
        let sample = match sample {
            Some(s) if s.is_detected => s,
            _ => return DetectionValidation::not_detected(),
        };

        let falloff = self.config.progress_falloff;
        let policy = &self.policy;

        let distance = sample.center_offset.distance();
        let centered = distance <= policy.max_center_offset;
        let center_progress = (1.0 - distance / (policy.max_center_offset * falloff)).max(0.0);

        let size_gap = if !sample.size_ratio.is_finite() {
            f64::INFINITY
        } else if sample.size_ratio < policy.min_size_ratio {
            policy.min_size_ratio - sample.size_ratio
        } else if sample.size_ratio > policy.max_size_ratio {
            sample.size_ratio - policy.max_size_ratio
        } else {
            0.0
        };
        let sized = size_gap == 0.0;
        let size_progress = (1.0 - size_gap / (policy.min_size_ratio * falloff)).max(0.0);

        let mean_progress = (center_progress + size_progress) / 2.0;
        let (status, progress) = if centered && sized {
            (ValidationStatus::Valid, 1.0)
        } else if mean_progress < self.config.low_progress_threshold {
            (ValidationStatus::Invalid, mean_progress)
        } else {
            (ValidationStatus::Adjusting(mean_progress), mean_progress)
        };

        let feedback = match (centered, sized) {
            (true, true) => FeedbackHint::HoldStill,
            (false, true) => centering_hint(&sample.center_offset),
            (true, false) => size_hint(sample.size_ratio, policy),
            (false, false) if center_progress <= size_progress => centering_hint(&sample.center_offset),
            (false, false) => size_hint(sample.size_ratio, policy),
        };

        DetectionValidation {
            status,
            is_detected: true,
            bounding_box: sample.bounding_box,
            center_offset: sample.center_offset,
            size_ratio: sample.size_ratio,
            center_progress,
            size_progress,
            progress,
            feedback,
        }
    }
}

fn centering_hint(offset: &CenterOffset) -> FeedbackHint {
    // Move toward the frame center along the dominant axis.
    if offset.dx.abs() >= offset.dy.abs() {
        if offset.dx > 0.0 {
            FeedbackHint::MoveLeft
        } else {
            FeedbackHint::MoveRight
        }
    } else if offset.dy > 0.0 {
        FeedbackHint::MoveUp
    } else {
        FeedbackHint::MoveDown
    }
}

fn size_hint(size_ratio: f64, policy: &DetectionPolicy) -> FeedbackHint {
    if size_ratio.is_nan() || size_ratio < policy.min_size_ratio {
        FeedbackHint::MoveCloser
    } else {
        FeedbackHint::MoveBack
    }
}
