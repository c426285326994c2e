//! Per-angle target orientations and tolerances.
//!
//! All angle-specific constants live in this table so they can be tested
//! without touching the validation control flow.

use crate::types::CaptureAngle;
use serde::{Deserialize, Serialize};

/// Target value and tolerance for a single axis, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisTarget {
    pub target: f64,
    pub tolerance: f64,
}

impl AxisTarget {
    pub const fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }
}

/// Orientation requirements for one sequence position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleProfile {
    pub angle: CaptureAngle,
    pub pitch: AxisTarget,
    pub yaw: Option<AxisTarget>,
    pub roll: Option<AxisTarget>,
}

const PROFILES: [AngleProfile; CaptureAngle::COUNT] = [
    AngleProfile {
        angle: CaptureAngle::Front,
        pitch: AxisTarget::new(0.0, 15.0),
        yaw: Some(AxisTarget::new(0.0, 15.0)),
        roll: Some(AxisTarget::new(0.0, 10.0)),
    },
    AngleProfile {
        angle: CaptureAngle::RightProfile,
        pitch: AxisTarget::new(0.0, 15.0),
        yaw: Some(AxisTarget::new(90.0, 20.0)),
        roll: None,
    },
    AngleProfile {
        angle: CaptureAngle::LeftProfile,
        pitch: AxisTarget::new(0.0, 15.0),
        yaw: Some(AxisTarget::new(-90.0, 20.0)),
        roll: None,
    },
    // Device held above the head, lens facing down.
    AngleProfile {
        angle: CaptureAngle::Vertex,
        pitch: AxisTarget::new(-75.0, 20.0),
        yaw: None,
        roll: None,
    },
    // Behind the subject; the face is not trackable so only device pitch applies.
    AngleProfile {
        angle: CaptureAngle::Donor,
        pitch: AxisTarget::new(0.0, 20.0),
        yaw: None,
        roll: None,
    },
];

impl AngleProfile {
    pub fn for_angle(angle: CaptureAngle) -> &'static AngleProfile {
        &PROFILES[angle.index()]
    }

    pub fn all() -> &'static [AngleProfile; CaptureAngle::COUNT] {
        &PROFILES
    }

    /// Number of axes this profile constrains (pitch is always one of them).
    pub fn axis_count(&self) -> usize {
        1 + usize::from(self.yaw.is_some()) + usize::from(self.roll.is_some())
    }
}

/// Subject centering and framing bounds.
///
/// Kept next to the profile table rather than inside it: the same framing
/// rule applies to every angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionPolicy {
    /// Maximum acceptable distance of the subject center from frame center
    pub max_center_offset: f64,
    pub min_size_ratio: f64,
    pub max_size_ratio: f64,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            max_center_offset: 0.15,
            min_size_ratio: 0.15,
            max_size_ratio: 0.85,
        }
    }
}

impl DetectionPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_center_offset <= 0.0 {
            return Err("max_center_offset must be positive".to_string());
        }
        if !(0.0 < self.min_size_ratio && self.min_size_ratio < self.max_size_ratio && self.max_size_ratio <= 1.0) {
            return Err("size ratio bounds must satisfy 0 < min < max <= 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_profile_per_angle_in_order() {
        for (i, profile) in AngleProfile::all().iter().enumerate() {
            assert_eq!(profile.angle.index(), i);
            assert_eq!(AngleProfile::for_angle(profile.angle).angle, profile.angle);
        }
    }

    #[test]
    fn test_tolerances_positive() {
        for profile in AngleProfile::all() {
            assert!(profile.pitch.tolerance > 0.0);
            for axis in [profile.yaw, profile.roll].into_iter().flatten() {
                assert!(axis.tolerance > 0.0);
            }
        }
    }

    #[test]
    fn test_optional_axes() {
        let front = AngleProfile::for_angle(CaptureAngle::Front);
        assert_eq!(front.axis_count(), 3);
        let right = AngleProfile::for_angle(CaptureAngle::RightProfile);
        assert_eq!(right.yaw.map(|y| y.target), Some(90.0));
        assert!(right.roll.is_none());
        let left = AngleProfile::for_angle(CaptureAngle::LeftProfile);
        assert_eq!(left.yaw.map(|y| y.target), Some(-90.0));
        assert_eq!(AngleProfile::for_angle(CaptureAngle::Vertex).axis_count(), 1);
        assert_eq!(AngleProfile::for_angle(CaptureAngle::Donor).axis_count(), 1);
    }

    #[test]
    fn test_detection_policy_validation() {
        assert!(DetectionPolicy::default().validate().is_ok());
        let bad = DetectionPolicy {
            min_size_ratio: 0.9,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
