//! Capture session sequencing, retake, and event publication tests

use crabpose::session::{CaptureSession, CapturedPhoto, SessionEvent, SessionHandle};
use crabpose::types::{CaptureAngle, PhotoPayload};
use std::time::{Duration, Instant};
use tokio_test::assert_ok;

fn photo(angle: CaptureAngle) -> CapturedPhoto {
    CapturedPhoto::new(angle, PhotoPayload::new(vec![0xFF, 0xD8, angle.index() as u8], "jpeg"))
}

#[test]
fn test_new_session_starts_at_front() {
    let session = CaptureSession::new();
    assert_eq!(session.current_angle(), CaptureAngle::Front);
    assert!(!session.is_complete());
    assert!(session.photos().is_empty());
    assert_eq!(session.remaining_angles(), CaptureAngle::ALL.to_vec());
    assert_eq!(session.progress(), 0.0);
}

#[test]
fn test_sequence_advances_in_order_and_completes() {
    let mut session = CaptureSession::new();
    for (i, angle) in CaptureAngle::ALL.into_iter().enumerate() {
        assert_eq!(session.current_angle(), angle);
        let outcome = session.add_photo(photo(angle));
        assert!(!outcome.replaced);
        if i + 1 < CaptureAngle::COUNT {
            assert_eq!(outcome.advanced, Some((angle, CaptureAngle::ALL[i + 1])));
            assert!(!outcome.completed);
        }
    }
    assert!(session.is_complete());
    assert_eq!(session.progress(), 1.0);
    // Completion leaves the pointer on the last angle.
    assert_eq!(session.current_angle(), CaptureAngle::Donor);
}

#[test]
fn test_duplicate_angle_replaces_photo() {
    let mut session = CaptureSession::new();
    let first = session.add_photo(photo(CaptureAngle::Front));
    let second = session.add_photo(photo(CaptureAngle::Front));

    assert!(second.replaced);
    assert_eq!(session.photos().len(), 1);
    assert_eq!(session.photo(CaptureAngle::Front).map(|p| p.id), Some(second.photo_id));
    assert_ne!(first.photo_id, second.photo_id);
}

#[test]
fn test_retake_after_completion_reopens_session() {
    let mut session = CaptureSession::new();
    for angle in CaptureAngle::ALL {
        session.add_photo(photo(angle));
    }
    assert!(session.retake_angle(CaptureAngle::RightProfile));

    assert!(!session.is_complete());
    assert_eq!(session.current_angle(), CaptureAngle::RightProfile);
    assert_eq!(session.remaining_angles(), vec![CaptureAngle::RightProfile]);
    assert_eq!(session.photos().len(), CaptureAngle::COUNT - 1);

    let outcome = session.add_photo(photo(CaptureAngle::RightProfile));
    assert!(outcome.completed);
    assert!(session.is_complete());
}

#[test]
fn test_retake_skips_captured_angles_when_advancing() {
    let mut session = CaptureSession::new();
    for angle in [CaptureAngle::Front, CaptureAngle::RightProfile, CaptureAngle::LeftProfile] {
        session.add_photo(photo(angle));
    }
    session.retake_angle(CaptureAngle::Front);
    let outcome = session.add_photo(photo(CaptureAngle::Front));
    assert_eq!(outcome.advanced, Some((CaptureAngle::Front, CaptureAngle::Vertex)));
}

#[test]
fn test_retake_without_photo_only_moves_pointer() {
    let mut session = CaptureSession::new();
    assert!(!session.retake_angle(CaptureAngle::Donor));
    assert_eq!(session.current_angle(), CaptureAngle::Donor);
    assert!(session.photos().is_empty());
}

#[test]
fn test_stats_track_attempts_and_time() {
    let mut session = CaptureSession::new();
    let t0 = Instant::now();
    session.start_angle_capture_at(CaptureAngle::Front, t0);
    session.record_attempt_at(CaptureAngle::Front, false, t0 + Duration::from_secs(2));
    session.record_attempt_at(CaptureAngle::Front, true, t0 + Duration::from_secs(5));

    let stats = session.stats(CaptureAngle::Front);
    assert_eq!(stats.attempts, 2);
    assert!(stats.completed);
    assert_eq!(stats.time_spent, Duration::from_secs(5));
    assert_eq!(session.stats(CaptureAngle::Vertex).attempts, 0);
}

#[test]
fn test_reset_clears_everything() {
    let mut session = CaptureSession::new();
    let id = session.id();
    session.add_photo(photo(CaptureAngle::Front));
    session.record_attempt(CaptureAngle::Front, true);
    session.reset();

    assert_eq!(session.id(), id);
    assert_eq!(session.current_angle(), CaptureAngle::Front);
    assert!(session.photos().is_empty());
    assert!(session.all_stats().values().all(|s| s.attempts == 0));
}

#[test]
fn test_summary_serializes() {
    let mut session = CaptureSession::new();
    session.add_photo(photo(CaptureAngle::Front));
    let summary = session.summary();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["current_angle"], "rightProfile");
    assert_eq!(json["captured_angles"][0], "front");
    assert_eq!(json["is_complete"], false);
}

#[tokio::test]
async fn test_handle_serializes_concurrent_writers() {
    let handle = SessionHandle::new(CaptureSession::new());
    let mut tasks = Vec::new();
    for angle in CaptureAngle::ALL {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move { h.add_photo(photo(angle)).await }));
    }
    for task in tasks {
        assert_ok!(task.await);
    }

    let session = handle.snapshot().await;
    assert!(session.is_complete());
    assert_eq!(session.photos().len(), CaptureAngle::COUNT);
}

#[tokio::test]
async fn test_handle_publishes_retake_and_reset() {
    let handle = SessionHandle::new(CaptureSession::new());
    let mut events = handle.subscribe();

    handle.retake_angle(CaptureAngle::Vertex).await;
    handle.reset().await;

    assert_eq!(
        assert_ok!(events.recv().await),
        SessionEvent::AngleRetaken {
            angle: CaptureAngle::Vertex,
            photo_removed: false
        }
    );
    assert_eq!(assert_ok!(events.recv().await), SessionEvent::SessionReset);
}

#[test]
fn test_session_event_wire_format() {
    let event = SessionEvent::AngleAdvanced {
        from: CaptureAngle::Front,
        to: CaptureAngle::RightProfile,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert_eq!(json, r#"{"type":"angleAdvanced","from":"front","to":"rightProfile"}"#);
}

#[test]
fn test_retake_restarts_attempt_count() {
    let mut session = CaptureSession::new();
    session.record_attempt(CaptureAngle::LeftProfile, false);
    session.record_attempt(CaptureAngle::LeftProfile, true);
    session.add_photo(photo(CaptureAngle::LeftProfile));
    assert_eq!(session.stats(CaptureAngle::LeftProfile).attempts, 2);

    session.retake_angle(CaptureAngle::LeftProfile);
    session.record_attempt(CaptureAngle::LeftProfile, true);
    assert_eq!(session.stats(CaptureAngle::LeftProfile).attempts, 1);
}

#[tokio::test]
async fn test_photo_for_other_angle_publishes_no_advance() {
    let handle = SessionHandle::new(CaptureSession::new());
    for angle in CaptureAngle::ALL {
        handle.add_photo(photo(angle)).await;
    }
    handle.retake_angle(CaptureAngle::Front).await;
    let mut events = handle.subscribe();

    let outcome = handle.add_photo(photo(CaptureAngle::RightProfile)).await;
    assert_eq!(outcome.advanced, None);
    assert_eq!(handle.current_angle().await, CaptureAngle::Front);

    assert!(matches!(
        assert_ok!(events.recv().await),
        SessionEvent::PhotoAdded { replaced: true, .. }
    ));
    assert!(events.try_recv().is_err());
}
