use crate::types::CaptureAngle;
use thiserror::Error;

/// Errors surfaced by the session and configuration layers.
///
/// The validation pipeline never returns these: missing or noisy signals
/// degrade the status instead.
#[derive(Debug, Error)]
pub enum PoseError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
}

/// Failure reported by the external camera collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    #[error("Capture failed for {angle}: {message}")]
    Failed { angle: CaptureAngle, message: String },
    #[error("Capture cancelled")]
    Cancelled,
}

impl CaptureError {
    pub fn failed(angle: CaptureAngle, message: impl Into<String>) -> Self {
        Self::Failed {
            angle,
            message: message.into(),
        }
    }
}
