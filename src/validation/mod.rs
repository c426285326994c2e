/// Pose validation pipeline
///
/// Scores each orientation and detection sample against the target angle,
/// combines them, and gates promotion to `Locked` on sustained validity.
/// Every stage is synchronous and allocation-light so a sample is fully
/// processed well inside one sensor frame interval.
pub mod aggregate;
pub mod detection;
pub mod feedback;
pub mod orientation;
pub mod smoothing;
pub mod tracker;

pub use aggregate::{PoseAggregator, PoseValidation};
pub use detection::{DetectionValidation, DetectionValidator};
pub use feedback::FeedbackHint;
pub use orientation::{AxisValidation, OrientationValidation, OrientationValidator};
pub use smoothing::OrientationSmoother;
pub use tracker::{PoseTracker, StatusCue, TrackedPose};
