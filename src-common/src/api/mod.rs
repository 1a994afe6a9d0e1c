//! HTTP contract between the client and the attendance backend.

mod paths;
mod requests;
mod responses;

pub use paths::*;
pub use requests::*;
pub use responses::*;
