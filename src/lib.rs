//! CrabPose: guided multi-angle head photo capture
//!
//! Scores live orientation and subject-detection readings against a fixed
//! five-angle sequence, gates on sustained stability, and drives a
//! countdown-then-capture state machine against an external camera.
//!
//! # Pipeline
//! - [`validation::OrientationValidator`] and [`validation::DetectionValidator`]
//!   score each sample against the current [`profile::AngleProfile`]
//! - [`validation::PoseAggregator`] combines them and applies the stability gate
//! - [`validation::PoseTracker`] owns the stability timer and staleness filtering
//! - [`capture::AutoCaptureOrchestrator`] turns a locked pose into one capture
//! - [`session::CaptureSession`] records photos and advances the sequence
//!
//! # Usage
//! ```rust,ignore
//! use crabpose::{AutoCaptureOrchestrator, CaptureSession, CrabPoseConfig, SessionHandle};
//!
//! let config = CrabPoseConfig::load_or_default();
//! let session = SessionHandle::new(CaptureSession::new());
//! let orchestrator = AutoCaptureOrchestrator::new(session.clone(), camera, config.countdown);
//! tokio::spawn(orchestrator.run(pose_rx));
//! ```
pub mod capture;
pub mod config;
pub mod errors;
pub mod invariant_ppt;
pub mod profile;
pub mod session;
pub mod timing;
pub mod types;
pub mod validation;

// Testing utilities - synthetic data and a mock camera for offline testing
pub mod testing;

// Re-exports for convenience
pub use capture::{AutoCaptureOrchestrator, CaptureEvent, CaptureTrigger, OrchestratorState};
pub use config::CrabPoseConfig;
pub use errors::{CaptureError, PoseError};
pub use profile::{AngleProfile, DetectionPolicy};
pub use session::{CaptureSession, CapturedPhoto, SessionEvent, SessionHandle};
pub use types::{CaptureAngle, DetectionSample, OrientationSample, PhotoPayload, ValidationStatus};
pub use validation::{FeedbackHint, PoseTracker, PoseValidation};

/// Initialize logging for the capture pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabpose=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        angles: CaptureAngle::ALL.to_vec(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Capture sequence, in order
    pub angles: Vec<CaptureAngle>,
}
