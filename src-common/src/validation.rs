//! Input validation for values sent to the backend.

use once_cell::sync::Lazy;
use regex::Regex;

/// User names: letters, digits, spaces and common name punctuation, 1-64 chars.
static USER_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N} ._'@\-]{1,64}$").unwrap());

/// Deliberately loose; the backend owns the real rules.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]{1,64}@[^@\s]{1,255}\.[^@\s]{1,63}$").unwrap());

/// Maximum password length accepted by the client.
pub const MAX_PASSWORD_LEN: usize = 256;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// User name is empty, too long or contains unsupported characters
    InvalidUserName(String),
    /// E-mail address is not plausibly formed
    InvalidEmail(String),
    /// Session id returned by the backend is unusable
    InvalidSessionId(String),
    /// Base URL is not an absolute http(s) URL
    InvalidBaseUrl(String),
    /// Password is empty
    EmptyPassword,
    /// String field exceeds maximum length
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidUserName(name) => write!(f, "Invalid user name: {}", name),
            ValidationError::InvalidEmail(email) => write!(f, "Invalid e-mail address: {}", email),
            ValidationError::InvalidSessionId(id) => write!(f, "Invalid session id: {}", id),
            ValidationError::InvalidBaseUrl(url) => {
                write!(f, "Invalid server URL (expected http:// or https://): {}", url)
            }
            ValidationError::EmptyPassword => write!(f, "Password must not be empty"),
            ValidationError::StringTooLong { field, len, max } => {
                write!(f, "{} too long: {} chars (max {})", field, len, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a user name.
pub fn validate_user_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || !USER_NAME_PATTERN.is_match(name) {
        return Err(ValidationError::InvalidUserName(name.to_string()));
    }
    Ok(())
}

/// Validate an e-mail address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

/// Validate a password before it leaves the client.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    let len = password.chars().count();
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::StringTooLong {
            field: "password",
            len,
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Validate a backend-issued session id.
///
/// The id is opaque and only travels inside JSON bodies, so anything except
/// a blank value is forwarded as issued.
pub fn validate_session_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::InvalidSessionId(id.to_string()));
    }
    Ok(())
}

/// Validate the API base URL.
pub fn validate_base_url(url: &str) -> Result<(), ValidationError> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') && !host.contains(char::is_whitespace) => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidBaseUrl(url.to_string())),
    }
}
