/// Auto-capture
///
/// Watches the aggregated pose, runs the countdown once the pose is locked,
/// and issues a single capture request to the camera collaborator. Results
/// are recorded on the shared [`SessionHandle`](crate::session::SessionHandle).
pub mod orchestrator;
pub mod trigger;

pub use orchestrator::{
    AbortReason, AutoCaptureOrchestrator, CaptureEvent, CountdownHandle, LockOutcome, OrchestratorState,
};
pub use trigger::CaptureTrigger;
