//! Attendance statistics and CSV export.

use attendo_common::api::{attendance_export, stats as stats_path};
use attendo_common::{AttendanceStats, ReportRange};
use std::fmt::Write as _;
use tracing::{debug, info};

use super::ViewError;
use crate::identity::IdentityContext;
use crate::presentation::format_timestamp;
use crate::transport::Payload;

/// A downloaded export, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedCsv {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedCsv {
    /// Name used when the backend does not suggest one.
    pub fn default_file_name(range: ReportRange) -> String {
        format!("attendance-{}.csv", range)
    }
}

pub struct ReportsView<'a> {
    identity: &'a IdentityContext,
}

impl<'a> ReportsView<'a> {
    pub fn new(identity: &'a IdentityContext) -> Self {
        Self { identity }
    }

    pub async fn stats(&self, range: ReportRange) -> Result<AttendanceStats, ViewError> {
        self.identity.require_login()?;
        let stats: AttendanceStats = self.identity.client().get_json(&stats_path(range)).await?;
        debug!(
            range = %range,
            days = stats.daily.len(),
            events = stats.timeline.len(),
            "Fetched statistics"
        );
        Ok(stats)
    }

    /// Download the attendance export for `range`.
    ///
    /// Plain-text bodies are accepted as CSV; JSON bodies are not.
    pub async fn export_csv(&self, range: ReportRange) -> Result<ExportedCsv, ViewError> {
        self.identity.require_login()?;
        let payload = self
            .identity
            .client()
            .get_payload(&attendance_export(range))
            .await?;

        let export = match payload {
            Payload::Csv { bytes, file_name } => ExportedCsv {
                file_name: file_name.unwrap_or_else(|| ExportedCsv::default_file_name(range)),
                bytes,
            },
            Payload::Text(text) => ExportedCsv {
                file_name: ExportedCsv::default_file_name(range),
                bytes: text.into_bytes(),
            },
            Payload::Json(_) => {
                return Err(ViewError::UnexpectedPayload(
                    "expected CSV export, got JSON".to_string(),
                ))
            }
        };
        info!(file = %export.file_name, bytes = export.bytes.len(), "Export downloaded");
        Ok(export)
    }
}

/// Render statistics as plain-text tables.
pub fn render_stats(stats: &AttendanceStats) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Daily attendance");
    if stats.daily.is_empty() {
        let _ = writeln!(out, "  (no records)");
    }
    for day in &stats.daily {
        let _ = writeln!(out, "  {:<12} {:>6}", day.date, day.count);
    }

    let _ = writeln!(out, "\nEmotions");
    if stats.emotions.is_empty() {
        let _ = writeln!(out, "  (no records)");
    }
    let total: u64 = stats.emotions.values().sum();
    for (emotion, count) in &stats.emotions {
        let percent = if total == 0 {
            0.0
        } else {
            *count as f64 * 100.0 / total as f64
        };
        let _ = writeln!(out, "  {:<12} {:>6} {:>5.1}%", emotion, count, percent);
    }

    let _ = writeln!(out, "\nTimeline");
    if stats.timeline.is_empty() {
        let _ = writeln!(out, "  (no records)");
    }
    for event in &stats.timeline {
        let _ = writeln!(
            out,
            "  {:<27} {:<20} {}",
            format_timestamp(&event.timestamp),
            event.user_name,
            event.emotion.as_deref().unwrap_or("-")
        );
    }

    out
}
