//! Request bodies.

use serde::{Deserialize, Serialize};

use crate::validation::{validate_password, validate_user_name, ValidationError};

/// Body of `POST auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_name(&self.name)?;
        validate_password(&self.password)
    }
}

/// Body of `POST attendance/frame`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameUpload {
    pub session_id: String,
    /// JPEG still encoded as a `data:` URI
    pub image: String,
}

/// Body of `POST attendance/complete`.
///
/// A camera session is finalized by id; a manual record carries only the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompleteRequest {
    #[serde(rename_all = "camelCase")]
    Session { session_id: String },
    Manual { manual: bool },
}

impl CompleteRequest {
    pub fn session(id: impl Into<String>) -> Self {
        CompleteRequest::Session {
            session_id: id.into(),
        }
    }

    pub fn manual() -> Self {
        CompleteRequest::Manual { manual: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_request_bodies() {
        let session = serde_json::to_value(CompleteRequest::session("abc")).unwrap();
        assert_eq!(session, serde_json::json!({"sessionId": "abc"}));

        let manual = serde_json::to_value(CompleteRequest::manual()).unwrap();
        assert_eq!(manual, serde_json::json!({"manual": true}));
    }

    #[test]
    fn test_frame_upload_body() {
        let body = FrameUpload {
            session_id: "s1".to_string(),
            image: "data:image/jpeg;base64,AAAA".to_string(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["image"], "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            name: "alice".to_string(),
            password: "secret".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = LoginRequest {
            name: "alice".to_string(),
            password: String::new(),
        };
        assert!(empty.validate().is_err());
    }
}
