//! Testing utilities for CrabPose
//!
//! Synthetic sensor readings, scripted pose traces, and a mock camera for
//! exercising the pipeline offline.

pub mod mock_camera;
pub mod synthetic_data;

pub use mock_camera::MockCamera;
pub use synthetic_data::{
    centered_detection, synthetic_orientation, synthetic_pose, PoseTrace, TraceSample,
};
