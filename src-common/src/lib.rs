//! Attendo Common Library
//!
//! Wire types and the HTTP contract shared between the Attendo client library
//! and its command-line front end.

pub mod api;
pub mod logging;
pub mod types;
pub mod validation;

pub use types::*;
