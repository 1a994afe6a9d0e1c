//! Response bodies.

use serde::{Deserialize, Serialize};

use crate::types::Identity;

/// Body returned by `POST auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Identity,
}

/// Body returned by `POST attendance/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response() {
        let json = r#"{"token":"t0k","user":{"id":3,"name":"Ada","role":"admin"}}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token, "t0k");
        assert_eq!(resp.user.name, "Ada");
    }

    #[test]
    fn test_session_started() {
        let resp: SessionStarted = serde_json::from_str(r#"{"sessionId":"abc-1"}"#).unwrap();
        assert_eq!(resp.session_id, "abc-1");
    }
}
