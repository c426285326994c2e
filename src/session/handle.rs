use super::events::SessionEvent;
use super::{AddPhotoOutcome, CaptureSession, CapturedPhoto, SessionSummary};
use crate::types::CaptureAngle;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, MutexGuard};

const EVENT_CAPACITY: usize = 64;

/// Shared, serialized access to a [`CaptureSession`].
///
/// Every mutation takes the session lock, so a user-initiated retake can
/// never interleave with an in-flight capture's completion. Cloning the
/// handle shares the same session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<CaptureSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn new(session: CaptureSession) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(session)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Hold the session exclusively across several operations.
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            session: self.inner.lock().await,
            events: &self.events,
        }
    }

    pub async fn add_photo(&self, photo: CapturedPhoto) -> AddPhotoOutcome {
        self.lock().await.add_photo(photo)
    }

    pub async fn retake_angle(&self, angle: CaptureAngle) -> bool {
        self.lock().await.retake_angle(angle)
    }

    pub async fn reset(&self) {
        self.lock().await.reset();
    }

    pub async fn start_angle_capture(&self, angle: CaptureAngle) {
        self.lock().await.start_angle_capture(angle, Instant::now());
    }

    pub async fn record_attempt(&self, angle: CaptureAngle, successful: bool) {
        self.lock().await.record_attempt(angle, successful, Instant::now());
    }

    pub async fn current_angle(&self) -> CaptureAngle {
        self.inner.lock().await.current_angle()
    }

    pub async fn is_complete(&self) -> bool {
        self.inner.lock().await.is_complete()
    }

    pub async fn summary(&self) -> SessionSummary {
        self.inner.lock().await.summary()
    }

    /// Clone of the current session state
    pub async fn snapshot(&self) -> CaptureSession {
        self.inner.lock().await.clone()
    }
}

/// Exclusive session access that publishes events for each mutation.
pub struct SessionGuard<'a> {
    session: MutexGuard<'a, CaptureSession>,
    events: &'a broadcast::Sender<SessionEvent>,
}

impl SessionGuard<'_> {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn add_photo(&mut self, photo: CapturedPhoto) -> AddPhotoOutcome {
        let outcome = self.session.add_photo(photo);
        self.emit(SessionEvent::PhotoAdded {
            angle: outcome.angle,
            photo_id: outcome.photo_id,
            replaced: outcome.replaced,
        });
        if let Some((from, to)) = outcome.advanced {
            self.emit(SessionEvent::AngleAdvanced { from, to });
        }
        if outcome.completed {
            log::info!("Session {} complete", self.session.id());
            self.emit(SessionEvent::SessionCompleted {
                session_id: self.session.id(),
            });
        }
        outcome
    }

    pub fn retake_angle(&mut self, angle: CaptureAngle) -> bool {
        let photo_removed = self.session.retake_angle(angle);
        self.emit(SessionEvent::AngleRetaken { angle, photo_removed });
        photo_removed
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.emit(SessionEvent::SessionReset);
    }

    pub fn start_angle_capture(&mut self, angle: CaptureAngle, now: Instant) {
        self.session.start_angle_capture_at(angle, now);
    }

    pub fn ensure_angle_timer(&mut self, angle: CaptureAngle, now: Instant) {
        self.session.ensure_angle_timer(angle, now);
    }

    pub fn record_attempt(&mut self, angle: CaptureAngle, successful: bool, now: Instant) {
        self.session.record_attempt_at(angle, successful, now);
        let attempts = self.session.stats(angle).attempts;
        self.emit(SessionEvent::AttemptRecorded {
            angle,
            successful,
            attempts,
        });
    }
}

impl Deref for SessionGuard<'_> {
    type Target = CaptureSession;

    fn deref(&self) -> &CaptureSession {
        &self.session
    }
}
