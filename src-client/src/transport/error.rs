//! Error type for backend requests.

use thiserror::Error;

/// Error type for backend requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status. `message` is the
    /// response body text, or the status reason when the body was empty.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The request never produced a response (DNS, connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),
    /// The configured base URL is unusable
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Build a status error from a response body, falling back to the
    /// canonical reason phrase when the body is blank.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(|reason| format!("{} {}", status, reason))
                .unwrap_or_else(|| format!("HTTP {}", status))
        } else {
            body.to_string()
        };
        ApiError::Status { status, message }
    }

    /// HTTP status, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_is_body_text() {
        let err = ApiError::from_status(422, "  No face recognized \n");
        assert_eq!(err.to_string(), "No face recognized");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_blank_body_uses_reason_phrase() {
        let err = ApiError::from_status(404, "");
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[test]
    fn test_unauthorized() {
        assert!(ApiError::from_status(401, "").is_unauthorized());
        assert!(!ApiError::from_status(500, "boom").is_unauthorized());
        assert!(!ApiError::Decode("x".into()).is_unauthorized());
    }
}
