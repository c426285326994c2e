use super::trigger::CaptureTrigger;
use crate::config::CountdownConfig;
use crate::errors::CaptureError;
use crate::session::{CaptureQuality, CapturedPhoto, SessionHandle};
use crate::types::CaptureAngle;
use crate::validation::PoseValidation;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OrchestratorState {
    Idle,
    CountingDown { angle: CaptureAngle, remaining: u32 },
    Capturing { angle: CaptureAngle },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbortReason {
    /// The latest pose fell below Valid during the countdown
    PoseDegraded,
    /// The session's current angle changed (e.g. a retake) before capture
    AngleChanged,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CaptureEvent {
    CountdownStarted { angle: CaptureAngle },
    CountdownTick { angle: CaptureAngle, remaining: u32 },
    CountdownAborted { angle: CaptureAngle, reason: AbortReason },
    CaptureTriggered { angle: CaptureAngle },
    CaptureSucceeded { angle: CaptureAngle, photo_id: Uuid },
    CaptureFailed { angle: CaptureAngle, message: String },
}

/// Result of offering one pose to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum LockOutcome {
    Ignored,
    Aborted(AbortReason),
    Captured { angle: CaptureAngle, photo_id: Uuid },
    Failed { angle: CaptureAngle, error: CaptureError },
}

/// Cancels the countdown in flight, if any. Has no effect on a capture
/// that has already been triggered.
#[derive(Debug, Clone, Default)]
pub struct CountdownHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl CountdownHandle {
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }
}

/// Turns a sustained `Locked` pose into exactly one camera capture.
///
/// idle -> counting down (n..1) -> capturing -> idle. A countdown starts
/// only from idle and only once per lock: after any attempt or abort the
/// orchestrator waits to see a pose below `Locked` before it re-arms.
pub struct AutoCaptureOrchestrator<C> {
    session: SessionHandle,
    camera: C,
    config: CountdownConfig,
    state: watch::Sender<OrchestratorState>,
    events: broadcast::Sender<CaptureEvent>,
    countdown: CountdownHandle,
    armed: bool,
}

impl<C: CaptureTrigger> AutoCaptureOrchestrator<C> {
    pub fn new(session: SessionHandle, camera: C, config: CountdownConfig) -> Self {
        let (state, _) = watch::channel(OrchestratorState::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session,
            camera,
            config,
            state,
            events,
            countdown: CountdownHandle::default(),
            armed: true,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    pub fn countdown_handle(&self) -> CountdownHandle {
        self.countdown.clone()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Consume poses until the session completes or the pose sender is dropped.
    pub async fn run(mut self, mut poses: watch::Receiver<Option<PoseValidation>>) {
        log::info!("Auto-capture running ({} step countdown)", self.config.steps);
        while poses.changed().await.is_ok() {
            let latest = *poses.borrow_and_update();
            if let Some(pose) = latest {
                self.handle_pose(&pose, &poses).await;
            }
            if self.session.is_complete().await {
                log::info!("Auto-capture finished: session complete");
                return;
            }
        }
        log::info!("Auto-capture stopped: pose stream closed");
    }

    /// Offer one pose. Returns once any countdown and capture it started
    /// have finished. `poses` is consulted for fresher samples during the
    /// countdown.
    pub async fn handle_pose(
        &mut self,
        pose: &PoseValidation,
        poses: &watch::Receiver<Option<PoseValidation>>,
    ) -> LockOutcome {
        let current = {
            let mut session = self.session.lock().await;
            if session.is_complete() {
                return LockOutcome::Ignored;
            }
            let current = session.current_angle();
            session.ensure_angle_timer(current, Instant::now());
            current
        };

        if !pose.is_locked() {
            if !self.armed {
                log::debug!("{}: pose released, auto-capture re-armed", current);
            }
            self.armed = true;
            return LockOutcome::Ignored;
        }
        if !self.armed || self.state() != OrchestratorState::Idle || pose.angle != current {
            return LockOutcome::Ignored;
        }

        self.armed = false;
        if let Err(reason) = self.count_down(current, poses).await {
            return self.abort(current, reason);
        }

        let latest = (*poses.borrow()).filter(|p| p.angle == current).unwrap_or(*pose);
        self.capture(current, &latest).await
    }

    async fn count_down(
        &self,
        angle: CaptureAngle,
        poses: &watch::Receiver<Option<PoseValidation>>,
    ) -> Result<(), AbortReason> {
        let token = self.countdown.arm();
        log::info!("{}: pose locked, starting countdown", angle);
        self.emit(CaptureEvent::CountdownStarted { angle });

        for remaining in (1..=self.config.steps).rev() {
            self.set_state(OrchestratorState::CountingDown { angle, remaining });
            self.emit(CaptureEvent::CountdownTick { angle, remaining });

            tokio::select! {
                _ = token.cancelled() => return Err(AbortReason::Cancelled),
                _ = tokio::time::sleep(self.config.step_interval()) => {}
            }

            if self.config.abort_on_degrade {
                check_pose(angle, poses)?;
            }
        }
        Ok(())
    }

    async fn capture(&self, angle: CaptureAngle, pose: &PoseValidation) -> LockOutcome {
        // Held until the result is recorded so a retake cannot interleave.
        let mut session = self.session.lock().await;
        if session.is_complete() || session.current_angle() != angle {
            drop(session);
            return self.abort(angle, AbortReason::AngleChanged);
        }

        self.set_state(OrchestratorState::Capturing { angle });
        self.emit(CaptureEvent::CaptureTriggered { angle });
        log::info!("{}: capture triggered", angle);

        let outcome = match self.camera.capture(angle).await {
            Ok(payload) => {
                let now = Instant::now();
                session.record_attempt(angle, true, now);
                let stats = session.stats(angle);
                let quality = CaptureQuality {
                    pitch_error: pose.orientation.pitch_error(),
                    yaw_error: pose.orientation.yaw_error(),
                    roll_error: pose.orientation.roll_error(),
                    time_spent: stats.time_spent,
                    attempts: stats.attempts,
                };
                let added = session.add_photo(CapturedPhoto::new(angle, payload).with_quality(quality));
                if let Some((_, next)) = added.advanced {
                    session.ensure_angle_timer(next, now);
                }
                self.emit(CaptureEvent::CaptureSucceeded {
                    angle,
                    photo_id: added.photo_id,
                });
                LockOutcome::Captured {
                    angle,
                    photo_id: added.photo_id,
                }
            }
            Err(error) => {
                log::warn!("{}: capture failed: {}", angle, error);
                session.record_attempt(angle, false, Instant::now());
                self.emit(CaptureEvent::CaptureFailed {
                    angle,
                    message: error.to_string(),
                });
                LockOutcome::Failed { angle, error }
            }
        };
        drop(session);

        self.set_state(OrchestratorState::Idle);
        outcome
    }

    fn abort(&self, angle: CaptureAngle, reason: AbortReason) -> LockOutcome {
        log::warn!("{}: countdown aborted ({:?})", angle, reason);
        self.emit(CaptureEvent::CountdownAborted { angle, reason });
        self.set_state(OrchestratorState::Idle);
        LockOutcome::Aborted(reason)
    }

    fn set_state(&self, state: OrchestratorState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: CaptureEvent) {
        let _ = self.events.send(event);
    }
}

fn check_pose(
    angle: CaptureAngle,
    poses: &watch::Receiver<Option<PoseValidation>>,
) -> Result<(), AbortReason> {
    match *poses.borrow() {
        Some(p) if p.angle != angle => Err(AbortReason::AngleChanged),
        Some(p) if p.overall_status.is_valid_or_better() => Ok(()),
        _ => Err(AbortReason::PoseDegraded),
    }
}
