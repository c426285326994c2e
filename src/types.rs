use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The fixed capture sequence. Declaration order is sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureAngle {
    Front,
    RightProfile,
    LeftProfile,
    Vertex,
    Donor,
}

impl CaptureAngle {
    pub const ALL: [CaptureAngle; 5] = [
        CaptureAngle::Front,
        CaptureAngle::RightProfile,
        CaptureAngle::LeftProfile,
        CaptureAngle::Vertex,
        CaptureAngle::Donor,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn first() -> Self {
        Self::ALL[0]
    }

    pub fn last() -> Self {
        Self::ALL[Self::COUNT - 1]
    }

    /// Sequence position, 0..=4
    pub fn index(self) -> usize {
        match self {
            CaptureAngle::Front => 0,
            CaptureAngle::RightProfile => 1,
            CaptureAngle::LeftProfile => 2,
            CaptureAngle::Vertex => 3,
            CaptureAngle::Donor => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn title(self) -> &'static str {
        match self {
            CaptureAngle::Front => "Front",
            CaptureAngle::RightProfile => "Right profile",
            CaptureAngle::LeftProfile => "Left profile",
            CaptureAngle::Vertex => "Top of head",
            CaptureAngle::Donor => "Nape",
        }
    }
}

impl fmt::Display for CaptureAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One orientation reading, in degrees.
///
/// Pitch comes from device motion and is always present. Yaw and roll come
/// from head tracking and are `None` while the subject is not trackable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub pitch: f64,
    pub yaw: Option<f64>,
    pub roll: Option<f64>,
    /// Seconds on the session [`SampleClock`](crate::timing::SampleClock)
    pub timestamp: f64,
}

impl OrientationSample {
    pub fn new(pitch: f64, yaw: Option<f64>, roll: Option<f64>, timestamp: f64) -> Self {
        Self {
            pitch,
            yaw,
            roll,
            timestamp,
        }
    }

    /// Build a sample from radian readings.
    pub fn from_radians(pitch: f64, yaw: Option<f64>, roll: Option<f64>, timestamp: f64) -> Self {
        Self {
            pitch: pitch.to_degrees(),
            yaw: yaw.map(f64::to_degrees),
            roll: roll.map(f64::to_degrees),
            timestamp,
        }
    }
}

/// Normalized bounding region, origin top-left, all values in 0..1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Offset of the subject center from the frame center, normalized so the
/// frame edges sit at ±0.5.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CenterOffset {
    pub dx: f64,
    pub dy: f64,
}

impl CenterOffset {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn distance(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionSample {
    pub is_detected: bool,
    pub bounding_box: Option<BoundingBox>,
    pub center_offset: CenterOffset,
    /// Subject size relative to the frame, 0..1
    pub size_ratio: f64,
    pub timestamp: f64,
}

impl DetectionSample {
    pub fn detected(bounding_box: BoundingBox, timestamp: f64) -> Self {
        let (cx, cy) = bounding_box.center();
        Self {
            is_detected: true,
            bounding_box: Some(bounding_box),
            center_offset: CenterOffset::new(cx - 0.5, cy - 0.5),
            size_ratio: bounding_box.width.max(bounding_box.height),
            timestamp,
        }
    }

    pub fn not_detected(timestamp: f64) -> Self {
        Self {
            is_detected: false,
            bounding_box: None,
            center_offset: CenterOffset::default(),
            size_ratio: 0.0,
            timestamp,
        }
    }
}

/// Validation outcome, ordered by goodness: Invalid < Adjusting < Valid < Locked.
///
/// `Locked` is only ever produced by the aggregator once a `Valid` pose has
/// been held for the stability window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "progress", rename_all = "camelCase")]
pub enum ValidationStatus {
    Invalid,
    Adjusting(f64),
    Valid,
    Locked,
}

impl ValidationStatus {
    fn rank(&self) -> u8 {
        match self {
            ValidationStatus::Invalid => 0,
            ValidationStatus::Adjusting(_) => 1,
            ValidationStatus::Valid => 2,
            ValidationStatus::Locked => 3,
        }
    }

    pub fn progress(&self) -> f64 {
        match self {
            ValidationStatus::Invalid => 0.0,
            ValidationStatus::Adjusting(p) => *p,
            ValidationStatus::Valid | ValidationStatus::Locked => 1.0,
        }
    }

    pub fn is_valid_or_better(&self) -> bool {
        self.rank() >= 2
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, ValidationStatus::Locked)
    }

    /// Same status class, ignoring the Adjusting progress value.
    pub fn same_class(&self, other: &ValidationStatus) -> bool {
        self.rank() == other.rank()
    }
}

impl PartialOrd for ValidationStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ValidationStatus::Adjusting(a), ValidationStatus::Adjusting(b)) => a.partial_cmp(b),
            _ => Some(self.rank().cmp(&other.rank())),
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Invalid => write!(f, "invalid"),
            ValidationStatus::Adjusting(p) => write!(f, "adjusting ({:.0}%)", p * 100.0),
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::Locked => write!(f, "locked"),
        }
    }
}

/// Opaque encoded image returned by the camera collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoPayload {
    pub data: Bytes,
    /// Encoding label such as "jpeg" or "heic"
    pub format: String,
}

impl PhotoPayload {
    pub fn new(data: impl Into<Bytes>, format: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            format: format.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
