//! Property-based tests for the pose validation pipeline
//!
//! These tests verify invariants of orientation scoring, aggregation, and
//! the capture session using proptest for input generation and shrinking.
//!
//! Run with: cargo test --test validation_props

use crabpose::profile::AngleProfile;
use crabpose::session::{CaptureSession, CapturedPhoto};
use crabpose::testing::centered_detection;
use crabpose::types::{CaptureAngle, OrientationSample, PhotoPayload, ValidationStatus};
use crabpose::validation::orientation::signed_angular_error;
use crabpose::validation::{DetectionValidator, OrientationValidator, PoseAggregator};
use proptest::prelude::*;

fn any_angle() -> impl Strategy<Value = CaptureAngle> {
    (0usize..CaptureAngle::COUNT).prop_map(|i| CaptureAngle::ALL[i])
}

fn reading() -> impl Strategy<Value = Option<f64>> {
    prop::option::weighted(0.9, -360.0f64..360.0)
}

proptest! {
    /// INVARIANT: angular error is the shortest arc, in [-180, 180)
    #[test]
    fn angular_error_is_shortest_arc(current in -1000.0f64..1000.0, target in -180.0f64..180.0) {
        let error = signed_angular_error(current, target);
        prop_assert!((-180.0..180.0).contains(&error), "error {} out of range", error);
        // Adding full turns never changes the error.
        let turned = signed_angular_error(current + 360.0, target);
        prop_assert!((error - turned).abs() < 1e-6);
    }

    /// INVARIANT: progress stays in [0, 1] and Valid means every constrained axis is in tolerance
    #[test]
    fn orientation_progress_bounded(
        angle in any_angle(),
        pitch in -360.0f64..360.0,
        yaw in reading(),
        roll in reading(),
    ) {
        let profile = AngleProfile::for_angle(angle);
        let v = OrientationValidator::default()
            .validate(Some(&OrientationSample::new(pitch, yaw, roll, 0.0)), profile);

        prop_assert!((0.0..=1.0).contains(&v.progress));
        let axes = [Some(v.pitch), v.yaw, v.roll];
        for axis in axes.iter().flatten() {
            prop_assert!((0.0..=1.0).contains(&axis.progress));
        }
        let all_in_tolerance = axes.iter().flatten().all(|a| a.is_valid);
        prop_assert_eq!(v.status == ValidationStatus::Valid, all_in_tolerance);
        if !all_in_tolerance {
            prop_assert!(v.progress < 1.0);
        }
    }

    /// INVARIANT: unconstrained axes have no effect on the score
    #[test]
    fn unconstrained_axes_ignored(pitch in -120.0f64..60.0, yaw in reading(), roll in reading()) {
        let profile = AngleProfile::for_angle(CaptureAngle::Vertex);
        let validator = OrientationValidator::default();
        let with = validator.validate(Some(&OrientationSample::new(pitch, yaw, roll, 0.0)), profile);
        let without = validator.validate(Some(&OrientationSample::new(pitch, None, None, 0.0)), profile);
        prop_assert_eq!(with, without);
    }

    /// INVARIANT: Locked only when both parts are valid and the hold reached the threshold
    #[test]
    fn locked_requires_valid_and_stable(
        angle in any_angle(),
        offset in 0.0f64..90.0,
        size in 0.05f64..1.0,
        held in 0.0f64..2.0,
    ) {
        let profile = AngleProfile::for_angle(angle);
        let sample = OrientationSample::new(
            profile.pitch.target + offset,
            profile.yaw.map(|a| a.target),
            profile.roll.map(|a| a.target),
            0.0,
        );
        let o = OrientationValidator::default().validate(Some(&sample), profile);
        let d = DetectionValidator::default().validate(Some(&centered_detection(size, 0.0)));
        let aggregator = PoseAggregator::default();
        let pose = aggregator.aggregate(angle, o, d, held);

        prop_assert!((0.0..=1.0).contains(&pose.progress));
        if pose.is_locked() {
            prop_assert!(o.status.is_valid_or_better() && d.status.is_valid_or_better());
            prop_assert!(held >= aggregator.stability_threshold());
        }
        if !pose.overall_status.is_valid_or_better() {
            prop_assert_eq!(pose.stability_duration, 0.0);
        }
    }

    /// INVARIANT: any sequence of adds and retakes keeps one photo per angle
    /// and completion in step with coverage
    #[test]
    fn session_coverage_consistent(ops in prop::collection::vec((any::<bool>(), any_angle()), 0..40)) {
        let mut session = CaptureSession::new();
        for (retake, angle) in ops {
            if retake {
                session.retake_angle(angle);
                prop_assert_eq!(session.current_angle(), angle);
            } else {
                session.add_photo(CapturedPhoto::new(angle, PhotoPayload::new(vec![1u8], "jpeg")));
                prop_assert!(session.has_photo(angle));
            }
            prop_assert!(session.photos().len() <= CaptureAngle::COUNT);
            prop_assert_eq!(session.is_complete(), session.remaining_angles().is_empty());
            if !session.is_complete() {
                prop_assert!(!session.has_photo(session.current_angle()));
            }
        }
    }
}
