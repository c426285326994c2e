use crate::errors::CaptureError;
use crate::types::{CaptureAngle, PhotoPayload};
use std::future::Future;

/// The external camera: exposes and encodes one photo on request.
///
/// Implementations may declare `async fn capture` directly as long as the
/// returned future is `Send`.
pub trait CaptureTrigger: Send + Sync + 'static {
    fn capture(&self, angle: CaptureAngle) -> impl Future<Output = Result<PhotoPayload, CaptureError>> + Send;
}
