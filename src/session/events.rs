use crate::types::CaptureAngle;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session state changes published to persistence and UI observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    PhotoAdded {
        angle: CaptureAngle,
        photo_id: Uuid,
        replaced: bool,
    },
    AngleAdvanced {
        from: CaptureAngle,
        to: CaptureAngle,
    },
    SessionCompleted {
        session_id: Uuid,
    },
    AngleRetaken {
        angle: CaptureAngle,
        photo_removed: bool,
    },
    SessionReset,
    AttemptRecorded {
        angle: CaptureAngle,
        successful: bool,
        attempts: u32,
    },
}
