//! Angle-sequencing capture session
//!
//! `CaptureSession` is the single owner of captured photos, the current
//! angle pointer, and per-angle statistics. It is a plain state machine with
//! no I/O; [`SessionHandle`] wraps it for shared, serialized access and
//! publishes [`SessionEvent`]s to observers.

pub mod events;
pub mod handle;
pub mod stats;

pub use events::SessionEvent;
pub use handle::{SessionGuard, SessionHandle};
pub use stats::AngleStats;

use crate::assert_invariant;
use crate::types::{CaptureAngle, PhotoPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Orientation error and effort recorded at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureQuality {
    pub pitch_error: Option<f64>,
    pub yaw_error: Option<f64>,
    pub roll_error: Option<f64>,
    pub time_spent: Duration,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedPhoto {
    pub id: Uuid,
    pub angle: CaptureAngle,
    pub captured_at: DateTime<Utc>,
    pub payload: PhotoPayload,
    pub quality: Option<CaptureQuality>,
}

impl CapturedPhoto {
    pub fn new(angle: CaptureAngle, payload: PhotoPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            angle,
            captured_at: Utc::now(),
            payload,
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: CaptureQuality) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// What `add_photo` changed, for event publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddPhotoOutcome {
    pub photo_id: Uuid,
    pub angle: CaptureAngle,
    /// A previous photo for the same angle was replaced
    pub replaced: bool,
    pub advanced: Option<(CaptureAngle, CaptureAngle)>,
    pub completed: bool,
}

/// Serializable snapshot for persistence and export collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub current_angle: CaptureAngle,
    pub is_complete: bool,
    pub captured_angles: Vec<CaptureAngle>,
    pub remaining_angles: Vec<CaptureAngle>,
    pub stats: BTreeMap<CaptureAngle, AngleStats>,
    pub total_time_spent: Duration,
}

#[derive(Debug, Clone)]
pub struct CaptureSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    current_angle: CaptureAngle,
    photos: Vec<CapturedPhoto>,
    is_complete: bool,
    stats: BTreeMap<CaptureAngle, AngleStats>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            current_angle: CaptureAngle::first(),
            photos: Vec::with_capacity(CaptureAngle::COUNT),
            is_complete: false,
            stats: fresh_stats(),
        };
        log::info!("Capture session {} started", session.id);
        session.check_invariants("CaptureSession::new");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn current_angle(&self) -> CaptureAngle {
        self.current_angle
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Captured photos in capture order
    pub fn photos(&self) -> &[CapturedPhoto] {
        &self.photos
    }

    pub fn photo(&self, angle: CaptureAngle) -> Option<&CapturedPhoto> {
        self.photos.iter().find(|p| p.angle == angle)
    }

    pub fn has_photo(&self, angle: CaptureAngle) -> bool {
        self.photo(angle).is_some()
    }

    pub fn captured_angles(&self) -> Vec<CaptureAngle> {
        CaptureAngle::ALL.into_iter().filter(|a| self.has_photo(*a)).collect()
    }

    pub fn remaining_angles(&self) -> Vec<CaptureAngle> {
        CaptureAngle::ALL.into_iter().filter(|a| !self.has_photo(*a)).collect()
    }

    /// Fraction of angles captured, 0..=1
    pub fn progress(&self) -> f64 {
        self.photos.len() as f64 / CaptureAngle::COUNT as f64
    }

    pub fn stats(&self, angle: CaptureAngle) -> &AngleStats {
        let stats = self.stats.get(&angle);
        assert_invariant!(stats.is_some(), "Stats exist for every angle", "CaptureSession::stats");
        &self.stats[&angle]
    }

    pub fn all_stats(&self) -> &BTreeMap<CaptureAngle, AngleStats> {
        &self.stats
    }

    fn stats_mut(&mut self, angle: CaptureAngle) -> &mut AngleStats {
        assert_invariant!(
            self.stats.contains_key(&angle),
            "Stats exist for every angle",
            "CaptureSession::stats_mut"
        );
        self.stats.entry(angle).or_default()
    }

    /// Store a photo, replacing any earlier one for the same angle, and move
    /// the sequence forward. This is the only operation that advances the
    /// current angle.
    pub fn add_photo(&mut self, photo: CapturedPhoto) -> AddPhotoOutcome {
        let angle = photo.angle;
        let photo_id = photo.id;

        let before = self.photos.len();
        self.photos.retain(|p| p.angle != angle);
        let replaced = self.photos.len() != before;
        self.photos.push(photo);

        let from = self.current_angle;
        let mut advanced = None;
        if self.photos.len() == CaptureAngle::COUNT {
            self.is_complete = true;
        } else if let Some(next) = self.next_uncaptured_after(from).filter(|next| *next != from) {
            self.current_angle = next;
            advanced = Some((from, next));
        }

        log::info!(
            "Session {}: photo {} stored for {}{}",
            self.id,
            photo_id,
            angle,
            if replaced { " (replaced)" } else { "" }
        );

        self.check_invariants("CaptureSession::add_photo");
        AddPhotoOutcome {
            photo_id,
            angle,
            replaced,
            advanced,
            completed: self.is_complete,
        }
    }

    /// Following angles in sequence order first, then wrap to the earliest gap.
    fn next_uncaptured_after(&self, angle: CaptureAngle) -> Option<CaptureAngle> {
        let start = angle.index() + 1;
        (start..CaptureAngle::COUNT)
            .chain(0..start)
            .filter_map(CaptureAngle::from_index)
            .find(|a| !self.has_photo(*a))
    }

    /// Drop one angle's photo and make it current again. Other angles'
    /// photos and stats are untouched. Returns whether a photo was removed.
    pub fn retake_angle(&mut self, angle: CaptureAngle) -> bool {
        let before = self.photos.len();
        self.photos.retain(|p| p.angle != angle);
        let removed = self.photos.len() != before;

        self.current_angle = angle;
        self.is_complete = false;
        self.stats_mut(angle).reset();

        log::info!("Session {}: retaking {}", self.id, angle);
        self.check_invariants("CaptureSession::retake_angle");
        removed
    }

    pub fn reset(&mut self) {
        self.photos.clear();
        self.current_angle = CaptureAngle::first();
        self.is_complete = false;
        self.stats = fresh_stats();
        log::info!("Session {} reset", self.id);
        self.check_invariants("CaptureSession::reset");
    }

    pub fn start_angle_capture(&mut self, angle: CaptureAngle) {
        self.start_angle_capture_at(angle, Instant::now());
    }

    pub fn start_angle_capture_at(&mut self, angle: CaptureAngle, now: Instant) {
        self.stats_mut(angle).start(now);
    }

    /// Start timing `angle` unless it is already being timed or is done.
    pub fn ensure_angle_timer(&mut self, angle: CaptureAngle, now: Instant) {
        let stats = self.stats_mut(angle);
        if !stats.is_timing() && !stats.completed {
            stats.start(now);
        }
    }

    pub fn record_attempt(&mut self, angle: CaptureAngle, successful: bool) {
        self.record_attempt_at(angle, successful, Instant::now());
    }

    pub fn record_attempt_at(&mut self, angle: CaptureAngle, successful: bool, now: Instant) {
        self.stats_mut(angle).record_attempt(successful, now);
        log::debug!(
            "Session {}: {} attempt {} ({})",
            self.id,
            angle,
            self.stats(angle).attempts,
            if successful { "success" } else { "failed" }
        );
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            current_angle: self.current_angle,
            is_complete: self.is_complete,
            captured_angles: self.captured_angles(),
            remaining_angles: self.remaining_angles(),
            stats: self.stats.clone(),
            total_time_spent: self.stats.values().map(|s| s.time_spent).sum(),
        }
    }

    fn check_invariants(&self, context: &str) {
        assert_invariant!(
            self.stats.len() == CaptureAngle::COUNT
                && CaptureAngle::ALL.iter().all(|a| self.stats.contains_key(a)),
            "Stats exist for every angle",
            context
        );
        assert_invariant!(
            self.photos.len() <= CaptureAngle::COUNT,
            "At most one photo per angle",
            context
        );
        assert_invariant!(
            CaptureAngle::ALL
                .iter()
                .all(|a| self.photos.iter().filter(|p| p.angle == *a).count() <= 1),
            "Photos are unique per angle",
            context
        );
        assert_invariant!(
            self.is_complete == (self.photos.len() == CaptureAngle::COUNT),
            "Complete exactly when every angle has a photo",
            context
        );
    }
}

fn fresh_stats() -> BTreeMap<CaptureAngle, AngleStats> {
    CaptureAngle::ALL
        .into_iter()
        .map(|a| (a, AngleStats::default()))
        .collect()
}
