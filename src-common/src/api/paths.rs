//! Endpoint paths, relative to the configured API base URL.

use crate::types::{ReportRange, UserId};

/// Authenticate with name and password.
pub const LOGIN: &str = "auth/login";

/// Fetch the identity behind the current bearer token.
pub const CURRENT_IDENTITY: &str = "auth/me";

/// User collection (list, create).
pub const USERS: &str = "users";

/// Open a capture session.
pub const ATTENDANCE_START: &str = "attendance/start";

/// Upload one frame into an open session.
pub const ATTENDANCE_FRAME: &str = "attendance/frame";

/// Finalize a session, or record a manual attendance.
pub const ATTENDANCE_COMPLETE: &str = "attendance/complete";

/// Path of a single user record.
pub fn user(id: &UserId) -> String {
    format!("{}/{}", USERS, id.as_str())
}

/// CSV export for a report range.
pub fn attendance_export(range: ReportRange) -> String {
    format!("attendance/export?range={}", range.as_str())
}

/// Aggregated statistics for a report range.
pub fn stats(range: ReportRange) -> String {
    format!("stats?range={}", range.as_str())
}
