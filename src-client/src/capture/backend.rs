//! The backend seam used by the capture loop.

use async_trait::async_trait;
use attendo_common::api::{
    CompleteRequest, FrameUpload, SessionStarted, ATTENDANCE_COMPLETE, ATTENDANCE_FRAME,
    ATTENDANCE_START,
};
use attendo_common::CaptureOutcome;

use crate::transport::{ApiClient, ApiError};

/// Attendance endpoints the capture loop depends on.
#[async_trait]
pub trait AttendanceBackend: Send + Sync {
    /// Open a session; the raw id is validated by the caller.
    async fn start_session(&self) -> Result<String, ApiError>;

    /// Upload one encoded frame.
    async fn send_frame(&self, session_id: &str, image: &str) -> Result<(), ApiError>;

    /// Finalize a session, or record a manual attendance.
    async fn complete(&self, request: CompleteRequest) -> Result<CaptureOutcome, ApiError>;
}

/// [`AttendanceBackend`] over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: ApiClient,
}

impl HttpBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttendanceBackend for HttpBackend {
    async fn start_session(&self) -> Result<String, ApiError> {
        let started: SessionStarted = self
            .client
            .post_json(ATTENDANCE_START, &serde_json::json!({}))
            .await?;
        Ok(started.session_id)
    }

    async fn send_frame(&self, session_id: &str, image: &str) -> Result<(), ApiError> {
        let body = FrameUpload {
            session_id: session_id.to_string(),
            image: image.to_string(),
        };
        self.client.post(ATTENDANCE_FRAME, &body).await
    }

    async fn complete(&self, request: CompleteRequest) -> Result<CaptureOutcome, ApiError> {
        self.client.post_json(ATTENDANCE_COMPLETE, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_response, json_response, serve};
    use std::time::Duration;

    fn backend(base: &str) -> HttpBackend {
        let client = ApiClient::new(base, Duration::from_secs(5)).unwrap();
        client.set_token("tok");
        HttpBackend::new(client)
    }

    fn body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_camera_session_wire_contract() {
        let (base, server) = serve(vec![
            json_response("200 OK", r#"{"sessionId":"c2Vz+/=="}"#),
            json_response("200 OK", r#"{"ok":true}"#),
            json_response(
                "200 OK",
                r#"{"userName":"Alice","emotion":"happy","timestamp":"2024-01-01T00:00:00Z"}"#,
            ),
        ])
        .await;
        let backend = backend(&base);

        let id = backend.start_session().await.unwrap();
        assert_eq!(id, "c2Vz+/==");
        backend
            .send_frame(&id, "data:image/jpeg;base64,AAAA")
            .await
            .unwrap();
        let outcome = backend
            .complete(CompleteRequest::session(id.as_str()))
            .await
            .unwrap();
        assert_eq!(outcome.user_name, "Alice");
        assert_eq!(outcome.emotion.as_deref(), Some("happy"));

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/attendance/start "));
        assert_eq!(body(&requests[0]), serde_json::json!({}));

        assert!(requests[1].starts_with("POST /api/attendance/frame "));
        assert_eq!(
            body(&requests[1]),
            serde_json::json!({"sessionId": "c2Vz+/==", "image": "data:image/jpeg;base64,AAAA"})
        );

        assert!(requests[2].starts_with("POST /api/attendance/complete "));
        assert_eq!(body(&requests[2]), serde_json::json!({"sessionId": "c2Vz+/=="}));

        for request in &requests {
            assert!(request
                .to_ascii_lowercase()
                .contains("authorization: bearer tok"));
        }
    }

    #[tokio::test]
    async fn test_manual_completion_sends_only_flag() {
        let (base, server) = serve(vec![json_response(
            "200 OK",
            r#"{"userName":"Bob","status":"present","message":"Marked present manually"}"#,
        )])
        .await;

        let outcome = backend(&base)
            .complete(CompleteRequest::manual())
            .await
            .unwrap();
        assert_eq!(outcome.user_name, "Bob");
        assert_eq!(outcome.extra["status"], "present");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/attendance/complete "));
        assert_eq!(body(&requests[0]), serde_json::json!({"manual": true}));
    }

    #[tokio::test]
    async fn test_start_rejection_is_status_error() {
        let (base, _server) = serve(vec![http_response(
            "503 Service Unavailable",
            "text/plain",
            "",
            "Recognizer offline",
        )])
        .await;

        match backend(&base).start_session().await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Recognizer offline");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }
}
