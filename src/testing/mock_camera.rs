//! In-process camera for tests and the simulator.

use crate::capture::CaptureTrigger;
use crate::errors::CaptureError;
use crate::types::{CaptureAngle, PhotoPayload};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Returns a small synthetic JPEG-tagged payload per request, or a
/// configured failure. Clones share the call log.
#[derive(Debug, Clone, Default)]
pub struct MockCamera {
    calls: Arc<AtomicUsize>,
    angles: Arc<Mutex<Vec<CaptureAngle>>>,
    failure: Option<String>,
    latency: Option<Duration>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every capture fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Simulated exposure and encode time per capture.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Angles requested so far, in order.
    pub fn captured_angles(&self) -> Vec<CaptureAngle> {
        self.angles.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl CaptureTrigger for MockCamera {
    fn capture(&self, angle: CaptureAngle) -> impl Future<Output = Result<PhotoPayload, CaptureError>> + Send {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.angles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(angle);
        let failure = self.failure.clone();
        let latency = self.latency;

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            match failure {
                Some(message) => Err(CaptureError::failed(angle, message)),
                None => {
                    // SOI marker, then angle and call index so payloads differ.
                    let data = vec![0xFF, 0xD8, angle.index() as u8, (call & 0xFF) as u8];
                    Ok(PhotoPayload::new(data, "jpeg"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls() {
        let camera = MockCamera::new();
        let shared = camera.clone();
        let payload = camera.capture(CaptureAngle::Vertex).await.unwrap();
        assert_eq!(payload.format, "jpeg");
        assert_eq!(shared.calls(), 1);
        assert_eq!(shared.captured_angles(), vec![CaptureAngle::Vertex]);
    }

    #[tokio::test]
    async fn test_failing_camera() {
        let camera = MockCamera::failing("lens cap on");
        let err = camera.capture(CaptureAngle::Front).await.unwrap_err();
        assert_eq!(err, CaptureError::failed(CaptureAngle::Front, "lens cap on"));
    }
}
