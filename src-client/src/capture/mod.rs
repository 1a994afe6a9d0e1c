//! Attendance capture: camera sources, snapshot encoding and the session loop.

mod backend;
mod camera;
mod cancel;
mod error;
mod session;
mod snapshot;
mod types;
#[cfg(all(feature = "v4l2", target_os = "linux"))]
mod v4l2;

pub use backend::{AttendanceBackend, HttpBackend};
pub use camera::{
    CameraSource, CameraSpec, CameraStream, StillImageCamera, SyntheticCamera, UnavailableCamera,
};
pub use cancel::CancelToken;
pub use error::{CameraError, CaptureError, SnapshotError};
pub use session::{AttendanceCapture, StatusListener};
pub use snapshot::{
    encode_snapshot, guide_rect, GuideRect, Snapshot, SnapshotOptions, DEFAULT_GUIDE_RATIO,
    DEFAULT_JPEG_QUALITY,
};
pub use types::{
    CaptureReport, CaptureSettings, SessionId, DEFAULT_CAMERA_HEIGHT, DEFAULT_CAMERA_WIDTH,
    DEFAULT_FRAME_COUNT, DEFAULT_FRAME_INTERVAL,
};
#[cfg(all(feature = "v4l2", target_os = "linux"))]
pub use v4l2::V4l2Camera;
