//! Error types for capture operations.

use attendo_common::validation::ValidationError;
use thiserror::Error;

use crate::transport::ApiError;

/// Error type for camera access.
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    /// The device is missing, busy, or access was denied
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    /// A frame could not be read or decoded
    #[error("Frame capture failed: {0}")]
    Frame(String),
}

/// Error type for snapshot encoding.
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
}

/// Error type for an attendance capture attempt.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A session is already streaming on this component
    #[error("Capture already in progress")]
    AlreadyStreaming,
    /// Camera permission denied or no device
    #[error(transparent)]
    CameraUnavailable(#[from] CameraError),
    /// The backend refused to open a session
    #[error("Could not start attendance session: {0}")]
    SessionStart(#[source] ApiError),
    /// The backend opened a session with an unusable id
    #[error("Backend returned an unusable session: {0}")]
    InvalidSession(#[from] ValidationError),
    /// Completion failed; typically no face was recognized in the frames
    #[error("Attendance not recorded: {0}")]
    NotRecognized(#[source] ApiError),
    /// The invoker cancelled the capture
    #[error("Capture cancelled")]
    Cancelled,
    /// Any other backend failure (manual fallback)
    #[error(transparent)]
    Backend(#[from] ApiError),
}
