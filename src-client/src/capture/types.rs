//! Shared types for attendance capture.

use attendo_common::validation::{validate_session_id, ValidationError};
use serde::Serialize;
use std::time::Duration;

use super::snapshot::SnapshotOptions;

/// Backend-issued identifier correlating frame uploads with one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// Accept a backend-issued id as is. Only a blank id is refused.
    pub fn parse(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        validate_session_id(&id)?;
        Ok(SessionId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of frames streamed per attempt.
pub const DEFAULT_FRAME_COUNT: u32 = 20;

/// Delay between frames.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Target camera resolution.
pub const DEFAULT_CAMERA_WIDTH: u32 = 640;
pub const DEFAULT_CAMERA_HEIGHT: u32 = 480;

/// Parameters of one capture attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub camera_width: u32,
    pub camera_height: u32,
    pub frame_count: u32,
    pub frame_interval: Duration,
    pub snapshot: SnapshotOptions,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            camera_width: DEFAULT_CAMERA_WIDTH,
            camera_height: DEFAULT_CAMERA_HEIGHT,
            frame_count: DEFAULT_FRAME_COUNT,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            snapshot: SnapshotOptions::default(),
        }
    }
}

/// Frame accounting for the most recent attempt.
///
/// Failures never change how the loop completes; they are only counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    /// Frames acknowledged by the backend
    pub frames_sent: u32,
    /// Frames lost to grab, encode or upload failures
    pub frames_failed: u32,
}

impl CaptureReport {
    pub fn frames_attempted(&self) -> u32 {
        self.frames_sent + self.frames_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cadence() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.frame_count, 20);
        assert_eq!(settings.frame_interval, Duration::from_millis(100));
        assert_eq!((settings.camera_width, settings.camera_height), (640, 480));
    }

    #[test]
    fn test_session_id_is_opaque() {
        for id in ["abc-123", "abc+def/==", "sess 1"] {
            assert_eq!(SessionId::parse(id).unwrap().as_str(), id);
        }
        let long = "x".repeat(200);
        assert_eq!(SessionId::parse(long.clone()).unwrap().as_str(), long);
    }

    #[test]
    fn test_blank_session_id_rejected() {
        assert!(SessionId::parse("").is_err());
        assert!(SessionId::parse("   ").is_err());
    }
}
