//! Administrative and reporting views over the backend.

mod reports;
mod users;

use attendo_common::validation::ValidationError;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::transport::ApiError;

pub use reports::{render_stats, ExportedCsv, ReportsView};
pub use users::UsersView;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Unexpected response: {0}")]
    UnexpectedPayload(String),
}
