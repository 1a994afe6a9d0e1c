//! HTTP transport to the attendance backend.

mod client;
mod error;

pub use client::{content_disposition_file_name, ApiClient, Payload};
pub use error::ApiError;
