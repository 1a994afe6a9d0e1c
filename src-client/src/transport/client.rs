//! HTTP client for the attendance backend.
//!
//! Every request carries the bearer credential when one is held. Clones share
//! the credential, so a logout through one handle is seen by all of them.

use attendo_common::validation::validate_base_url;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, trace};

use super::error::ApiError;

/// A response body classified by its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Csv {
        bytes: Vec<u8>,
        /// File name suggested by `Content-Disposition`, if any
        file_name: Option<String>,
    },
    Text(String),
}

/// Client for the attendance backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a client for `base_url` (with or without a trailing slash).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        validate_base_url(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("attendo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach `token` as the bearer credential on subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
    }

    pub fn clear_token(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        trace!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn non-success statuses into [`ApiError::Status`].
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Backend answered {}: {}", status, body.trim());
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    /// `GET` a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode_json(response).await
    }

    /// `POST` a JSON body and decode the JSON answer.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        decode_json(response).await
    }

    /// `POST` a JSON body, only checking the status of the answer.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, path).json(body))
            .await
            .map(|_| ())
    }

    /// `DELETE` a resource.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, path))
            .await
            .map(|_| ())
    }

    /// `GET` a resource whose body may be JSON, CSV or plain text.
    pub async fn get_payload(&self, path: &str) -> Result<Payload, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        classify_payload(&headers, bytes.to_vec())
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    // Empty bodies (204, bare 200) decode as JSON null so unit-like targets work.
    let slice: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(slice).map_err(|e| ApiError::Decode(e.to_string()))
}

fn classify_payload(headers: &HeaderMap, bytes: Vec<u8>) -> Result<Payload, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    let file_name = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(content_disposition_file_name);

    if content_type.contains("json") {
        let value = serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Payload::Json(value))
    } else if content_type.contains("csv")
        || content_type.contains("octet-stream")
        || file_name
            .as_deref()
            .is_some_and(|n| n.to_ascii_lowercase().ends_with(".csv"))
    {
        Ok(Payload::Csv { bytes, file_name })
    } else {
        Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// Only the plain `filename=` parameter is honoured; path components are
/// stripped so the result is safe to join onto a directory.
pub fn content_disposition_file_name(header: &str) -> Option<String> {
    let raw = header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?;
    let name = raw.trim_matches('"');
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
