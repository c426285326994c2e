use super::aggregate::{PoseAggregator, PoseValidation};
use super::detection::DetectionValidator;
use super::orientation::OrientationValidator;
use super::smoothing::OrientationSmoother;
use crate::config::CrabPoseConfig;
use crate::profile::AngleProfile;
use crate::session::SessionEvent;
use crate::types::{CaptureAngle, DetectionSample, OrientationSample, ValidationStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Status transitions worth an audio or haptic cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusCue {
    EnteredValid,
    EnteredLocked,
    LostValid,
}

/// Result of feeding one sample pair into a [`PoseTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPose {
    pub validation: PoseValidation,
    pub cue: Option<StatusCue>,
}

/// Caller-side driver of the validation pipeline.
///
/// Runs orientation and detection validation for the current target angle,
/// keeps the stability bookkeeping the aggregator deliberately does not
/// own, and reports status transitions. Timestamps are seconds on the
/// session [`SampleClock`](crate::timing::SampleClock).
#[derive(Debug, Clone)]
pub struct PoseTracker {
    angle: CaptureAngle,
    orientation_validator: OrientationValidator,
    detection_validator: DetectionValidator,
    aggregator: PoseAggregator,
    smoother: Option<OrientationSmoother>,
    stale_after: f64,
    stable_since: Option<f64>,
    last_status: Option<ValidationStatus>,
}

impl PoseTracker {
    pub fn new(angle: CaptureAngle, config: &CrabPoseConfig) -> Self {
        Self {
            angle,
            orientation_validator: OrientationValidator::new(config.validation),
            detection_validator: DetectionValidator::new(config.detection, config.validation),
            aggregator: PoseAggregator::new(config.validation),
            smoother: config
                .smoothing
                .enabled
                .then(|| OrientationSmoother::new(config.smoothing.alpha)),
            stale_after: config.validation.stale_sample_secs,
            stable_since: None,
            last_status: None,
        }
    }

    pub fn angle(&self) -> CaptureAngle {
        self.angle
    }

    pub fn profile(&self) -> &'static AngleProfile {
        AngleProfile::for_angle(self.angle)
    }

    pub fn last_status(&self) -> Option<ValidationStatus> {
        self.last_status
    }

    /// Point the tracker at a new angle. Stability must re-accumulate.
    pub fn retarget(&mut self, angle: CaptureAngle) {
        if angle != self.angle {
            log::debug!("Pose tracker retargeted {} -> {}", self.angle, angle);
        }
        self.angle = angle;
        self.reset_stability();
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
        self.last_status = None;
    }

    /// Drop any accumulated stability, e.g. after a capture attempt.
    pub fn reset_stability(&mut self) {
        self.stable_since = None;
    }

    /// Follow a session change: score the session's current angle and make
    /// a fresh lock necessary after every capture attempt.
    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::AngleAdvanced { to, .. } => self.retarget(*to),
            SessionEvent::AngleRetaken { angle, .. } => self.retarget(*angle),
            SessionEvent::SessionReset => self.retarget(CaptureAngle::first()),
            SessionEvent::AttemptRecorded { .. } => self.reset_stability(),
            SessionEvent::PhotoAdded { .. } | SessionEvent::SessionCompleted { .. } => {}
        }
    }

    /// Apply every session event queued on `events` without waiting.
    /// Returns how many were applied.
    pub fn sync(&mut self, events: &mut broadcast::Receiver<SessionEvent>) -> usize {
        let mut applied = 0;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    self.apply(&event);
                    applied += 1;
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    log::warn!("Pose tracker missed {} session events", n);
                }
                Err(_) => return applied,
            }
        }
    }

    pub fn update(
        &mut self,
        orientation: Option<&OrientationSample>,
        detection: Option<&DetectionSample>,
        now: f64,
    ) -> TrackedPose {
        let orientation = orientation.filter(|s| now - s.timestamp <= self.stale_after);
        let orientation = match (orientation, self.smoother.as_mut()) {
            (Some(s), Some(smoother)) => Some(smoother.apply(s)),
            (None, Some(smoother)) => {
                // A gap restarts the average.
                smoother.reset();
                None
            }
            (sample, None) => sample.copied(),
        };
        let detection = detection.filter(|s| now - s.timestamp <= self.stale_after);

        let profile = AngleProfile::for_angle(self.angle);
        let orientation = self.orientation_validator.validate(orientation.as_ref(), profile);
        let detection = self.detection_validator.validate(detection);

        let holding = orientation.status.is_valid_or_better() && detection.status.is_valid_or_better();
        let stability_duration = if holding {
            let since = *self.stable_since.get_or_insert(now);
            (now - since).max(0.0)
        } else {
            self.stable_since = None;
            0.0
        };

        let validation = self
            .aggregator
            .aggregate(self.angle, orientation, detection, stability_duration);

        let cue = transition_cue(self.last_status, validation.overall_status);
        if self
            .last_status
            .map_or(true, |prev| !prev.same_class(&validation.overall_status))
        {
            log::debug!(
                "{}: pose {} ({})",
                self.angle,
                validation.overall_status,
                validation.primary_feedback.message()
            );
        }
        self.last_status = Some(validation.overall_status);

        TrackedPose { validation, cue }
    }
}

fn transition_cue(previous: Option<ValidationStatus>, current: ValidationStatus) -> Option<StatusCue> {
    let was = previous.unwrap_or(ValidationStatus::Invalid);
    if current.is_locked() && !was.is_locked() {
        Some(StatusCue::EnteredLocked)
    } else if current.is_valid_or_better() && !was.is_valid_or_better() {
        Some(StatusCue::EnteredValid)
    } else if !current.is_valid_or_better() && was.is_valid_or_better() {
        Some(StatusCue::LostValid)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CenterOffset;

    fn good_orientation(t: f64) -> OrientationSample {
        OrientationSample::new(0.0, None, None, t)
    }

    fn bad_orientation(t: f64) -> OrientationSample {
        OrientationSample::new(35.0, None, None, t)
    }

    fn centered(t: f64) -> DetectionSample {
        DetectionSample {
            is_detected: true,
            bounding_box: None,
            center_offset: CenterOffset::default(),
            size_ratio: 0.5,
            timestamp: t,
        }
    }

    fn step(tracker: &mut PoseTracker, good: bool, t: f64) -> TrackedPose {
        let o = if good { good_orientation(t) } else { bad_orientation(t) };
        tracker.update(Some(&o), Some(&centered(t)), t)
    }

    #[test]
    fn test_locks_only_after_stability_window() {
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &CrabPoseConfig::default());
        let first = step(&mut tracker, true, 0.0);
        assert_eq!(first.validation.overall_status, ValidationStatus::Valid);
        assert_eq!(first.cue, Some(StatusCue::EnteredValid));

        let mid = step(&mut tracker, true, 0.3);
        assert_eq!(mid.validation.overall_status, ValidationStatus::Valid);
        assert!((mid.validation.stability_duration - 0.3).abs() < 1e-9);

        let locked = step(&mut tracker, true, 0.5);
        assert_eq!(locked.validation.overall_status, ValidationStatus::Locked);
        assert_eq!(locked.cue, Some(StatusCue::EnteredLocked));

        let still = step(&mut tracker, true, 0.6);
        assert_eq!(still.cue, None);
    }

    #[test]
    fn test_noisy_frame_resets_stability() {
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &CrabPoseConfig::default());
        step(&mut tracker, true, 0.0);
        step(&mut tracker, true, 0.4);
        let noisy = step(&mut tracker, false, 0.45);
        assert_eq!(noisy.validation.stability_duration, 0.0);
        assert_eq!(noisy.cue, Some(StatusCue::LostValid));

        let back = step(&mut tracker, true, 0.6);
        assert_eq!(back.validation.overall_status, ValidationStatus::Valid);
        assert_eq!(back.validation.stability_duration, 0.0);
        assert!(!step(&mut tracker, true, 1.0).validation.is_locked());
        assert!(step(&mut tracker, true, 1.1).validation.is_locked());
    }

    #[test]
    fn test_stale_samples_count_as_absent() {
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &CrabPoseConfig::default());
        let pose = tracker.update(Some(&good_orientation(0.0)), Some(&centered(2.0)), 2.0);
        assert_eq!(pose.validation.orientation.status, ValidationStatus::Invalid);
        assert!(!pose.validation.overall_status.is_valid_or_better());
    }

    #[test]
    fn test_retarget_clears_stability() {
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &CrabPoseConfig::default());
        step(&mut tracker, true, 0.0);
        assert!(step(&mut tracker, true, 0.6).validation.is_locked());

        tracker.retarget(CaptureAngle::Donor);
        let pose = step(&mut tracker, true, 0.7);
        assert_eq!(pose.validation.overall_status, ValidationStatus::Valid);
        assert_eq!(pose.validation.angle, CaptureAngle::Donor);
    }

    #[test]
    fn test_missing_reading_restarts_smoothing() {
        let mut config = CrabPoseConfig::default();
        config.smoothing.enabled = true;
        config.smoothing.alpha = 0.5;
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &config);
        tracker.update(Some(&OrientationSample::new(40.0, None, None, 0.0)), Some(&centered(0.0)), 0.0);
        tracker.update(None, Some(&centered(0.1)), 0.1);

        let pose = tracker.update(Some(&good_orientation(0.2)), Some(&centered(0.2)), 0.2);
        assert_eq!(pose.validation.orientation.pitch_error(), Some(0.0));
    }

    #[test]
    fn test_stale_reading_restarts_smoothing() {
        let mut config = CrabPoseConfig::default();
        config.smoothing.enabled = true;
        config.smoothing.alpha = 0.5;
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &config);
        tracker.update(Some(&OrientationSample::new(40.0, None, None, 0.0)), Some(&centered(0.0)), 0.0);
        let old = OrientationSample::new(40.0, None, None, 0.0);
        tracker.update(Some(&old), Some(&centered(2.0)), 2.0);

        let pose = tracker.update(Some(&good_orientation(2.1)), Some(&centered(2.1)), 2.1);
        assert_eq!(pose.validation.orientation.pitch_error(), Some(0.0));
    }

    #[test]
    fn test_session_events_retarget_and_reset() {
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &CrabPoseConfig::default());
        step(&mut tracker, true, 0.0);
        assert!(step(&mut tracker, true, 0.6).validation.is_locked());

        tracker.apply(&SessionEvent::AttemptRecorded {
            angle: CaptureAngle::Donor,
            successful: false,
            attempts: 1,
        });
        assert_eq!(step(&mut tracker, true, 0.7).validation.overall_status, ValidationStatus::Valid);

        tracker.apply(&SessionEvent::AngleAdvanced {
            from: CaptureAngle::Donor,
            to: CaptureAngle::Vertex,
        });
        assert_eq!(tracker.angle(), CaptureAngle::Vertex);

        tracker.apply(&SessionEvent::SessionReset);
        assert_eq!(tracker.angle(), CaptureAngle::Front);

        tracker.apply(&SessionEvent::AngleRetaken {
            angle: CaptureAngle::LeftProfile,
            photo_removed: true,
        });
        assert_eq!(tracker.angle(), CaptureAngle::LeftProfile);
    }

    #[test]
    fn test_sync_drains_queued_events() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut tracker = PoseTracker::new(CaptureAngle::Front, &CrabPoseConfig::default());
        tx.send(SessionEvent::AngleAdvanced {
            from: CaptureAngle::Front,
            to: CaptureAngle::RightProfile,
        })
        .unwrap();
        tx.send(SessionEvent::AngleAdvanced {
            from: CaptureAngle::RightProfile,
            to: CaptureAngle::LeftProfile,
        })
        .unwrap();

        assert_eq!(tracker.sync(&mut rx), 2);
        assert_eq!(tracker.angle(), CaptureAngle::LeftProfile);
        assert_eq!(tracker.sync(&mut rx), 0);
    }

    #[test]
    fn test_smoothing_enabled_from_config() {
        let mut config = CrabPoseConfig::default();
        config.smoothing.enabled = true;
        config.smoothing.alpha = 0.5;
        let mut tracker = PoseTracker::new(CaptureAngle::Donor, &config);
        tracker.update(Some(&good_orientation(0.0)), Some(&centered(0.0)), 0.0);
        // Raw 40 degrees would be out of tolerance; smoothed to 20 it is on the boundary.
        let pose = tracker.update(
            Some(&OrientationSample::new(40.0, None, None, 0.1)),
            Some(&centered(0.1)),
            0.1,
        );
        assert_eq!(pose.validation.orientation.pitch_error(), Some(20.0));
        assert!(pose.validation.orientation.status.is_valid_or_better());
    }
}
