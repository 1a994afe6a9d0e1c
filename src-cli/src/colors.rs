//! Terminal color support for CLI output.
//!
//! Provides colorful output when running interactively, with automatic
//! detection to disable colors when output is piped or redirected.

use attendo_client::presentation::CaptureStatus;
use attendo_common::Role;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Pad a string to a minimum width (left-aligned), then apply a color function.
/// This correctly handles ANSI escape codes by padding before colorizing.
pub fn pad_left<F>(msg: &str, width: usize, color_fn: F) -> String
where
    F: FnOnce(&str) -> String,
{
    let padded = format!("{:<width$}", msg);
    color_fn(&padded)
}

/// Check if stdout is a terminal (interactive mode).
fn is_interactive() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is a terminal (interactive mode).
fn is_stderr_interactive() -> bool {
    std::io::stderr().is_terminal()
}

/// Style for error messages.
pub fn error(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{} {}", "error:".red().bold(), msg)
    } else {
        format!("error: {}", msg)
    }
}

/// Style for success messages.
pub fn success(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.green())
    } else {
        msg.to_string()
    }
}

/// Style for hints, written to stderr.
pub fn info(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{}", msg.cyan())
    } else {
        msg.to_string()
    }
}

/// Style for dim/secondary text, written to stderr.
pub fn dim(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{}", msg.dimmed())
    } else {
        msg.to_string()
    }
}

pub fn bold(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.bold())
    } else {
        msg.to_string()
    }
}

/// Style for table headers (bold + color).
pub fn header(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.bold().blue())
    } else {
        msg.to_string()
    }
}

pub fn path(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.underline())
    } else {
        msg.to_string()
    }
}

/// Style for numeric values (ids, frame counters).
pub fn number(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.cyan())
    } else {
        msg.to_string()
    }
}

pub fn role(role: Role) -> String {
    role_str(role.as_str())
}

/// Color a role name; also used on padded table cells.
pub fn role_str(role: &str) -> String {
    if !is_interactive() {
        return role.to_string();
    }

    match role.trim_end() {
        "admin" => format!("{}", role.magenta().bold()),
        "teacher" => format!("{}", role.yellow()),
        "student" => format!("{}", role.green()),
        _ => format!("{}", role.dimmed()),
    }
}

/// Capture progress line, written to stderr.
pub fn status(status: &CaptureStatus) -> String {
    let msg = status.message();
    if !is_stderr_interactive() {
        return msg.to_string();
    }

    match status {
        CaptureStatus::Capturing { .. } | CaptureStatus::StartingCamera => {
            format!("{}", msg.red().bold())
        }
        CaptureStatus::Finalizing | CaptureStatus::ManualRecording => format!("{}", msg.yellow()),
        _ => format!("{}", msg.dimmed()),
    }
}
