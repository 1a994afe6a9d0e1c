//! Domain types exchanged with the attendance backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a user record.
///
/// Backends disagree on whether ids are numbers or strings, so both are
/// accepted and normalised to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct UserId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for UserId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => UserId(s),
            RawId::Number(n) => UserId(n.to_string()),
        }
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management
    Admin,
    /// Can view reports and exports
    Teacher,
    /// Can record their own attendance
    #[default]
    Student,
    /// Any role this client does not know about
    #[serde(other)]
    Other,
}

impl Role {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Other => "other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The currently authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

/// A user record as listed by the admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Fields for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
    pub role: Role,
}

/// Finalized result of an attendance attempt.
///
/// Manual records are shown as the backend sent them, so every field is
/// optional on the wire and unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    /// Recorded subject name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_name: String,
    /// Detected emotion label, if the backend inferred one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// Server timestamp of the record (RFC 3339)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Time window for reports and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportRange {
    Today,
    #[default]
    Week,
    Month,
    All,
}

impl ReportRange {
    /// Value used in the `range` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportRange::Today => "today",
            ReportRange::Week => "week",
            ReportRange::Month => "month",
            ReportRange::All => "all",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "today" | "day" => Some(ReportRange::Today),
            "week" => Some(ReportRange::Week),
            "month" => Some(ReportRange::Month),
            "all" => Some(ReportRange::All),
            _ => None,
        }
    }
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attendance count for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

/// One attendance event on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub timestamp: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

/// Aggregated statistics for a report range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    #[serde(default)]
    pub daily: Vec<DailyCount>,
    /// Emotion label -> number of records
    #[serde(default)]
    pub emotions: BTreeMap<String, u64>,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_numbers_and_strings() {
        let a: Identity = serde_json::from_str(r#"{"id": 7, "name": "Ann", "role": "admin"}"#).unwrap();
        let b: Identity =
            serde_json::from_str(r#"{"id": "u-7", "name": "Bob", "role": "teacher"}"#).unwrap();
        assert_eq!(a.id.as_str(), "7");
        assert_eq!(a.role, Role::Admin);
        assert_eq!(b.id.as_str(), "u-7");
        assert_eq!(b.role, Role::Teacher);
    }

    #[test]
    fn test_unknown_role_is_other() {
        let id: Identity =
            serde_json::from_str(r#"{"id": 1, "name": "Eve", "role": "auditor"}"#).unwrap();
        assert_eq!(id.role, Role::Other);
    }

    #[test]
    fn test_missing_role_defaults_to_student() {
        let id: Identity = serde_json::from_str(r#"{"id": 1, "name": "Sam"}"#).unwrap();
        assert_eq!(id.role, Role::Student);
    }

    #[test]
    fn test_capture_outcome_wire_names() {
        let json = r#"{"userName":"Alice","emotion":"happy","timestamp":"2024-01-01T00:00:00Z"}"#;
        let outcome: CaptureOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.user_name, "Alice");
        assert_eq!(outcome.emotion.as_deref(), Some("happy"));

        let without_emotion: CaptureOutcome =
            serde_json::from_str(r#"{"userName":"Bo","timestamp":"t"}"#).unwrap();
        assert!(without_emotion.emotion.is_none());
        assert!(!serde_json::to_string(&without_emotion)
            .unwrap()
            .contains("emotion"));
    }

    #[test]
    fn test_capture_outcome_keeps_unknown_fields() {
        let json = r#"{"userName":"Bob","status":"present","message":"Marked present manually"}"#;
        let outcome: CaptureOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.user_name, "Bob");
        assert!(outcome.timestamp.is_empty());
        assert_eq!(outcome.extra["status"], "present");
        assert_eq!(outcome.extra["message"], "Marked present manually");

        let back: serde_json::Value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(json).unwrap());
    }

    #[test]
    fn test_report_range_parse() {
        assert_eq!(ReportRange::parse("WEEK"), Some(ReportRange::Week));
        assert_eq!(ReportRange::parse("day"), Some(ReportRange::Today));
        assert_eq!(ReportRange::parse("year"), None);
        assert_eq!(ReportRange::Month.to_string(), "month");
    }

    #[test]
    fn test_stats_tolerates_missing_sections() {
        let stats: AttendanceStats =
            serde_json::from_str(r#"{"emotions": {"happy": 3, "sad": 1}}"#).unwrap();
        assert!(stats.daily.is_empty());
        assert_eq!(stats.emotions.get("happy"), Some(&3));
    }
}
