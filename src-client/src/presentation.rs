//! User-facing status strings and outcome rendering.

use attendo_common::CaptureOutcome;
use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;

/// Status of the capture component, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CaptureStatus {
    #[default]
    Idle,
    StartingCamera,
    Capturing {
        frame: u32,
        total: u32,
    },
    Finalizing,
    Recorded,
    CameraDenied,
    SessionStartFailed,
    NotRecognized,
    Cancelled,
    ManualRecording,
    ManualRecorded,
    ManualFailed,
}

impl CaptureStatus {
    pub fn message(&self) -> &'static str {
        match self {
            CaptureStatus::Idle => "Ready",
            CaptureStatus::StartingCamera => "Starting camera...",
            CaptureStatus::Capturing { .. } => "Capturing...",
            CaptureStatus::Finalizing => "Verifying...",
            CaptureStatus::Recorded => "Attendance recorded",
            CaptureStatus::CameraDenied => "Camera permission denied or unavailable",
            CaptureStatus::SessionStartFailed => "Could not start attendance session",
            CaptureStatus::NotRecognized => "No face detected. You can use Manual Present.",
            CaptureStatus::Cancelled => "Capture cancelled",
            CaptureStatus::ManualRecording => "Recording manual attendance...",
            CaptureStatus::ManualRecorded => "Manual attendance recorded",
            CaptureStatus::ManualFailed => "Manual attendance failed",
        }
    }

    /// Whether a capture is still running in this state.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            CaptureStatus::StartingCamera
                | CaptureStatus::Capturing { .. }
                | CaptureStatus::Finalizing
                | CaptureStatus::ManualRecording
        )
    }

    /// Whether the user should be offered the manual fallback.
    pub fn suggests_manual(&self) -> bool {
        matches!(
            self,
            CaptureStatus::NotRecognized
                | CaptureStatus::CameraDenied
                | CaptureStatus::SessionStartFailed
        )
    }
}

impl std::fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Render a timestamp for display; unparseable values are shown verbatim.
pub fn format_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// One-line summary of a recorded attendance.
pub fn describe_outcome(outcome: &CaptureOutcome) -> String {
    format!(
        "Recorded for {} at {}. Emotion: {}",
        outcome.user_name,
        format_timestamp(&outcome.timestamp),
        outcome.emotion.as_deref().unwrap_or("unknown")
    )
}

/// Summary of a manual attendance, with every field exactly as the backend sent it.
pub fn describe_manual(outcome: &CaptureOutcome) -> String {
    let mut fields = Vec::new();
    if !outcome.user_name.is_empty() {
        fields.push(format!("userName: {}", outcome.user_name));
    }
    if let Some(emotion) = &outcome.emotion {
        fields.push(format!("emotion: {}", emotion));
    }
    if !outcome.timestamp.is_empty() {
        fields.push(format!("timestamp: {}", outcome.timestamp));
    }
    for (key, value) in &outcome.extra {
        match value {
            Value::String(text) => fields.push(format!("{}: {}", key, text)),
            other => fields.push(format!("{}: {}", key, other)),
        }
    }

    if fields.is_empty() {
        "Manual attendance recorded".to_string()
    } else {
        format!("Manual attendance recorded. {}", fields.join(", "))
    }
}
