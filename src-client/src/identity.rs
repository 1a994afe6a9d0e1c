//! Session identity: the persisted bearer token and the identity it resolves to.
//!
//! [`IdentityContext`] is created once by the caller and passed to whatever
//! needs it. It owns the [`ApiClient`] so the bearer credential it holds is
//! always the one the context believes in.

use attendo_common::api::{LoginRequest, LoginResponse, CURRENT_IDENTITY, LOGIN};
use attendo_common::validation::ValidationError;
use attendo_common::{Identity, Role};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::transport::{ApiClient, ApiError};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("This action requires an administrator account")]
    Forbidden,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Session store error: {0}")]
    Store(#[from] io::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// On-disk shape of the persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
}

/// Persists the bearer token between runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.json` in the platform data directory.
    pub fn default_location() -> Result<Self, IdentityError> {
        let dirs = ProjectDirs::from("", "", "attendo").ok_or_else(|| {
            IdentityError::Store(io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine data directory",
            ))
        })?;
        Ok(Self::new(dirs.data_local_dir().join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token. A missing or unreadable session counts as none.
    pub fn load(&self) -> Result<Option<String>, IdentityError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<StoredSession>(&contents) {
            Ok(session) if !session.token.trim().is_empty() => Ok(Some(session.token)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("Ignoring corrupt session file {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, token: &str) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&StoredSession {
            token: token.to_string(),
        })
        .map_err(io::Error::from)?;
        fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    /// Remove the stored token. Clearing an absent session is not an error.
    pub fn clear(&self) -> Result<(), IdentityError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The token holder and current identity.
pub struct IdentityContext {
    client: ApiClient,
    store: TokenStore,
    identity: Option<Identity>,
}

impl IdentityContext {
    /// An anonymous context. Call [`init`](Self::init) to resume a stored session.
    pub fn new(client: ApiClient, store: TokenStore) -> Self {
        Self {
            client,
            store,
            identity: None,
        }
    }

    /// Resume the persisted session, if any.
    ///
    /// Returns `Ok(None)` when no token is stored. When the backend does not
    /// confirm the token the token is forgotten (memory and disk), the context
    /// stays anonymous and the failure is returned.
    pub async fn init(&mut self) -> Result<Option<&Identity>, IdentityError> {
        let Some(token) = self.store.load()? else {
            debug!("No stored session");
            return Ok(None);
        };

        self.client.set_token(token);
        match self.client.get_json::<Identity>(CURRENT_IDENTITY).await {
            Ok(identity) => {
                debug!(user = %identity.name, role = %identity.role, "Session resumed");
                self.identity = Some(identity);
                Ok(self.identity.as_ref())
            }
            Err(e) => {
                warn!("Stored session rejected: {}", e);
                self.client.clear_token();
                self.identity = None;
                self.store.clear()?;
                Err(e.into())
            }
        }
    }

    /// Authenticate and persist the issued token.
    pub async fn login(&mut self, name: &str, password: &str) -> Result<&Identity, IdentityError> {
        let request = LoginRequest {
            name: name.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let response: LoginResponse = self.client.post_json(LOGIN, &request).await?;
        self.store.save(&response.token)?;
        self.client.set_token(response.token.as_str());

        info!(user = %response.user.name, role = %response.user.role, "Logged in");
        Ok(&*self.identity.insert(response.user))
    }

    /// Forget the token and identity.
    pub fn logout(&mut self) -> Result<(), IdentityError> {
        self.client.clear_token();
        if let Some(identity) = self.identity.take() {
            info!(user = %identity.name, "Logged out");
        }
        self.store.clear()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| identity.role == Role::Admin)
    }

    pub fn require_login(&self) -> Result<&Identity, IdentityError> {
        self.identity.as_ref().ok_or(IdentityError::NotLoggedIn)
    }

    pub fn require_admin(&self) -> Result<&Identity, IdentityError> {
        let identity = self.require_login()?;
        if identity.role == Role::Admin {
            Ok(identity)
        } else {
            Err(IdentityError::Forbidden)
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, serve_once};
    use std::time::Duration;

    fn context(base: &str, store: TokenStore) -> IdentityContext {
        IdentityContext::new(ApiClient::new(base, Duration::from_secs(5)).unwrap(), store)
    }

    #[test]
    fn test_token_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("data").join("session.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save("t0k").unwrap();
        assert_eq!(store.load().unwrap(), Some("t0k".to_string()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_session_counts_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();
        assert_eq!(TokenStore::new(&path).load().unwrap(), None);

        fs::write(&path, r#"{"token":"  "}"#).unwrap();
        assert_eq!(TokenStore::new(&path).load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_persists_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        let (base, server) = serve_once(json_response(
            "200 OK",
            r#"{"token":"abc","user":{"id":1,"name":"Ada","role":"admin"}}"#,
        ))
        .await;
        let mut ctx = context(&base, store.clone());

        let identity = ctx.login("Ada", "pw").await.unwrap();
        assert_eq!(identity.name, "Ada");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/auth/login "));
        assert!(request.contains(r#""name":"Ada""#));
        assert!(request.contains(r#""password":"pw""#));

        assert_eq!(ctx.client().token().as_deref(), Some("abc"));
        assert_eq!(store.load().unwrap(), Some("abc".to_string()));
        assert!(ctx.is_admin());
        assert!(ctx.require_admin().is_ok());
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_context_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        let (base, _server) = serve_once(crate::test_support::http_response(
            "401 Unauthorized",
            "text/plain",
            "",
            "Invalid credentials",
        ))
        .await;
        let mut ctx = context(&base, store.clone());

        let err = ctx.login("Ada", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(ctx.identity().is_none());
        assert!(!ctx.client().has_token());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_unsaved_login_holds_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let (base, _server) = serve_once(json_response(
            "200 OK",
            r#"{"token":"abc","user":{"id":1,"name":"Ada","role":"admin"}}"#,
        ))
        .await;
        let mut ctx = context(&base, TokenStore::new(blocker.join("session.json")));

        assert!(matches!(
            ctx.login("Ada", "pw").await,
            Err(IdentityError::Store(_))
        ));
        assert!(ctx.identity().is_none());
        assert!(!ctx.client().has_token());
    }

    #[tokio::test]
    async fn test_login_rejects_empty_password_without_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(
            "http://127.0.0.1:9/api",
            TokenStore::new(dir.path().join("session.json")),
        );
        assert!(matches!(
            ctx.login("Ada", "").await,
            Err(IdentityError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_init_resumes_stored_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        store.save("stored").unwrap();
        let (base, server) =
            serve_once(json_response("200 OK", r#"{"id":"7","name":"Sam","role":"student"}"#)).await;
        let mut ctx = context(&base, store);

        let identity = ctx.init().await.unwrap().cloned().unwrap();
        assert_eq!(identity.name, "Sam");
        assert_eq!(identity.role, Role::Student);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/auth/me "));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer stored"));
        assert!(matches!(ctx.require_admin(), Err(IdentityError::Forbidden)));
    }

    #[tokio::test]
    async fn test_init_failure_clears_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        store.save("expired").unwrap();
        let (base, _server) = serve_once(json_response("401 Unauthorized", "")).await;
        let mut ctx = context(&base, store.clone());

        assert!(matches!(ctx.init().await, Err(IdentityError::Api(_))));
        assert!(ctx.identity().is_none());
        assert!(!ctx.client().has_token());
        assert_eq!(store.load().unwrap(), None);
        assert!(matches!(ctx.require_login(), Err(IdentityError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_init_without_token_makes_no_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(
            "http://127.0.0.1:9/api",
            TokenStore::new(dir.path().join("session.json")),
        );
        assert!(ctx.init().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        let (base, _server) = serve_once(json_response(
            "200 OK",
            r#"{"token":"abc","user":{"id":1,"name":"Ada","role":"teacher"}}"#,
        ))
        .await;
        let mut ctx = context(&base, store.clone());
        ctx.login("Ada", "pw").await.unwrap();

        ctx.logout().unwrap();

        assert!(ctx.identity().is_none());
        assert!(!ctx.client().has_token());
        assert_eq!(store.load().unwrap(), None);
    }
}
