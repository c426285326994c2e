use serde::{Deserialize, Serialize};

/// Guidance tag surfaced to the UI and audio/haptic collaborators.
///
/// Directions describe what the user should do, not where the subject is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackHint {
    TiltUp,
    TiltDown,
    TurnLeft,
    TurnRight,
    RotateClockwise,
    RotateCounterClockwise,
    /// A required head-tracking axis has no reading
    FaceNotTracked,
    NotDetected,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveCloser,
    MoveBack,
    HoldStill,
    Ready,
}

impl FeedbackHint {
    pub fn message(self) -> &'static str {
        match self {
            FeedbackHint::TiltUp => "Tilt up",
            FeedbackHint::TiltDown => "Tilt down",
            FeedbackHint::TurnLeft => "Turn left",
            FeedbackHint::TurnRight => "Turn right",
            FeedbackHint::RotateClockwise => "Rotate clockwise",
            FeedbackHint::RotateCounterClockwise => "Rotate counter-clockwise",
            FeedbackHint::FaceNotTracked => "Face the camera so your head can be tracked",
            FeedbackHint::NotDetected => "No subject detected",
            FeedbackHint::MoveLeft => "Move left",
            FeedbackHint::MoveRight => "Move right",
            FeedbackHint::MoveUp => "Move up",
            FeedbackHint::MoveDown => "Move down",
            FeedbackHint::MoveCloser => "Move closer",
            FeedbackHint::MoveBack => "Move back",
            FeedbackHint::HoldStill => "Hold still",
            FeedbackHint::Ready => "Perfect",
        }
    }

    /// True for hints that ask the user to change something.
    pub fn is_correction(self) -> bool {
        !matches!(self, FeedbackHint::HoldStill | FeedbackHint::Ready)
    }
}
