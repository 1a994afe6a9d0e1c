//! Attendance capture client.
//!
//! The core is [`capture::AttendanceCapture`]: acquire a camera, stream a
//! bounded sequence of snapshots to a backend session, finalize the session
//! into a recorded outcome. [`transport`], [`identity`] and [`views`] are the
//! collaborators around it.

pub mod capture;
pub mod config;
pub mod identity;
pub mod presentation;
pub mod transport;
pub mod views;

#[cfg(test)]
mod test_support;

pub use capture::{AttendanceCapture, CancelToken, CaptureError};
pub use identity::{IdentityContext, IdentityError, TokenStore};
pub use transport::{ApiClient, ApiError};
