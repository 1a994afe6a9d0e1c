//! Exit codes for the CLI.
//!
//! These codes enable scripting integration by providing structured
//! feedback about operation results.

use attendo_client::capture::CaptureError;
use attendo_client::views::ViewError;
use attendo_client::{ApiError, IdentityError};

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,
    /// General/unspecified error
    GeneralError = 1,
    /// Invalid command-line arguments or input values
    InvalidArguments = 2,
    /// The backend could not be reached or answered with a server error
    BackendUnavailable = 3,
    /// No valid session, or the account lacks the required role
    NotAuthenticated = 4,
    /// The camera could not be opened
    CameraUnavailable = 5,
    /// The backend did not recognize anyone in the captured frames
    NotRecognized = 6,
    /// Interrupted by the user
    Cancelled = 7,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::BackendUnavailable => write!(f, "backend unavailable"),
            ExitCode::NotAuthenticated => write!(f, "not authenticated"),
            ExitCode::CameraUnavailable => write!(f, "camera unavailable"),
            ExitCode::NotRecognized => write!(f, "not recognized"),
            ExitCode::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<&ApiError> for ExitCode {
    fn from(e: &ApiError) -> Self {
        match e {
            _ if e.is_unauthorized() => ExitCode::NotAuthenticated,
            ApiError::Status { status, .. } if *status >= 500 => ExitCode::BackendUnavailable,
            ApiError::Status { status, .. } if *status == 400 || *status == 422 => {
                ExitCode::InvalidArguments
            }
            ApiError::Transport(_) => ExitCode::BackendUnavailable,
            ApiError::InvalidUrl(_) => ExitCode::InvalidArguments,
            _ => ExitCode::GeneralError,
        }
    }
}

impl From<&IdentityError> for ExitCode {
    fn from(e: &IdentityError) -> Self {
        match e {
            IdentityError::NotLoggedIn | IdentityError::Forbidden => ExitCode::NotAuthenticated,
            IdentityError::Api(api) => api.into(),
            IdentityError::Invalid(_) => ExitCode::InvalidArguments,
            IdentityError::Store(_) => ExitCode::GeneralError,
        }
    }
}

impl From<&ViewError> for ExitCode {
    fn from(e: &ViewError) -> Self {
        match e {
            ViewError::Identity(identity) => identity.into(),
            ViewError::Api(api) => api.into(),
            ViewError::Invalid(_) => ExitCode::InvalidArguments,
            ViewError::UnexpectedPayload(_) => ExitCode::GeneralError,
        }
    }
}

impl From<&CaptureError> for ExitCode {
    fn from(e: &CaptureError) -> Self {
        match e {
            CaptureError::CameraUnavailable(_) => ExitCode::CameraUnavailable,
            CaptureError::NotRecognized(api) if api.is_unauthorized() => {
                ExitCode::NotAuthenticated
            }
            CaptureError::NotRecognized(_) => ExitCode::NotRecognized,
            CaptureError::Cancelled => ExitCode::Cancelled,
            CaptureError::SessionStart(api) | CaptureError::Backend(api) => api.into(),
            CaptureError::InvalidSession(_) => ExitCode::BackendUnavailable,
            CaptureError::AlreadyStreaming => ExitCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendo_client::capture::CameraError;

    #[test]
    fn test_api_error_codes() {
        assert_eq!(
            ExitCode::from(&ApiError::from_status(401, "")),
            ExitCode::NotAuthenticated
        );
        assert_eq!(
            ExitCode::from(&ApiError::from_status(503, "")),
            ExitCode::BackendUnavailable
        );
        assert_eq!(
            ExitCode::from(&ApiError::from_status(422, "bad")),
            ExitCode::InvalidArguments
        );
        assert_eq!(
            ExitCode::from(&ApiError::Decode("x".into())),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_capture_error_codes() {
        let denied = CaptureError::CameraUnavailable(CameraError::Unavailable("busy".into()));
        assert_eq!(ExitCode::from(&denied), ExitCode::CameraUnavailable);

        let unknown = CaptureError::NotRecognized(ApiError::from_status(404, "No face"));
        assert_eq!(ExitCode::from(&unknown), ExitCode::NotRecognized);

        assert_eq!(ExitCode::from(&CaptureError::Cancelled), ExitCode::Cancelled);
        assert_eq!(ExitCode::Cancelled.as_i32(), 7);
    }

    #[test]
    fn test_identity_error_codes() {
        assert_eq!(
            ExitCode::from(&IdentityError::NotLoggedIn),
            ExitCode::NotAuthenticated
        );
        assert_eq!(
            ExitCode::from(&ViewError::Identity(IdentityError::Forbidden)),
            ExitCode::NotAuthenticated
        );
    }
}
