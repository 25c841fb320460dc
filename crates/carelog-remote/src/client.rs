//! Backend REST client
//!
//! Provides a typed HTTP client for the backend's REST surface: account
//! authentication, record CRUD, and the server-time reachability probe.
//! Handles app-key headers, JSON deserialization, and uniform error
//! classification.
//!
//! ## Error contract
//!
//! Any transport failure (DNS, TLS, timeout, refused connection) is
//! normalized to [`RemoteError::Network`]; any non-2xx response is
//! classified by status family (401 → `AuthFailed`, 404 → `NotFound`,
//! 5xx → `Server`, other 4xx → `Request`). The client never retries —
//! retry policy belongs to the sync engine.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use carelog_core::config::RemoteConfig;
use carelog_core::domain::newtypes::{AccountId, RecordId, SessionToken};
use carelog_core::domain::record::RemoteRecord;
use carelog_core::domain::session::Session;
use carelog_core::ports::remote_store::RemoteError;

// ============================================================================
// Backend response types
// ============================================================================

/// Error body shape shared by all backend failure responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    /// Backend-provided error message
    error: Option<String>,
}

/// Response from the signup, login, and session-validation endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    /// Backend-assigned account id
    object_id: String,
    /// Session credential (absent on `/users/me`)
    session_token: Option<String>,
}

impl UserResponse {
    fn account_id(&self) -> Result<AccountId, RemoteError> {
        AccountId::new(self.object_id.clone())
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    fn into_session(self) -> Result<Session, RemoteError> {
        let account_id = self.account_id()?;
        let token = self
            .session_token
            .ok_or_else(|| RemoteError::InvalidResponse("missing sessionToken".to_string()))
            .and_then(|t| {
                SessionToken::new(t).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
            })?;
        Ok(Session::new(account_id, token))
    }
}

/// Response from the record list endpoint
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<RemoteRecord>,
}

/// Response from the record create endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateResponse {
    /// Backend-assigned id of the new record
    pub object_id: String,
    /// Backend-stamped creation time
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Response from the record update endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateResponse {
    /// Backend-stamped time of the update
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// RestClient
// ============================================================================

/// HTTP client for the backend REST API
///
/// Wraps `reqwest::Client` with app-key headers, base URL construction,
/// and the uniform error classification described in the module docs.
pub struct RestClient {
    /// The underlying HTTP client
    http: Client,
    /// Base URL for API requests
    base_url: String,
    /// Application id header value
    app_id: String,
    /// Application key header value
    app_key: String,
}

impl RestClient {
    /// Creates a client from the backend section of the configuration
    pub fn new(config: &RemoteConfig) -> Self {
        Self::with_base_url(
            config.base_url.clone(),
            config.app_id.clone(),
            config.app_key.clone(),
        )
    }

    /// Creates a client with an explicit base URL (useful for testing)
    pub fn with_base_url(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            app_id: app_id.into(),
            app_key: app_key.into(),
        }
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder with the app-key headers
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .request(method, &url)
            .header("X-App-Id", &self.app_id)
            .header("X-App-Key", &self.app_key)
    }

    /// Creates an authenticated request builder carrying the session token
    fn authed(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        self.request(method, path)
            .header("X-Session-Token", session.token().as_str())
    }

    /// Sends a request, normalizing transport failures and classifying
    /// non-2xx responses
    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Self::classify(response).await
    }

    /// Maps a non-2xx response to the matching [`RemoteError`] variant
    async fn classify(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        Err(match status {
            StatusCode::UNAUTHORIZED => RemoteError::AuthFailed(message),
            StatusCode::NOT_FOUND => RemoteError::NotFound(message),
            s if s.is_server_error() => RemoteError::Server {
                status: s.as_u16(),
                message,
            },
            s => RemoteError::Request {
                status: s.as_u16(),
                message,
            },
        })
    }

    /// Decodes a 2xx response body
    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Creates a new account (`POST /users`)
    pub async fn sign_up(&self, username: &str, password: &str) -> Result<Session, RemoteError> {
        debug!(username, "signing up");
        let body = json!({ "username": username, "password": password });
        let response = self
            .send(self.request(Method::POST, "/users").json(&body))
            .await?;
        Self::json::<UserResponse>(response).await?.into_session()
    }

    /// Authenticates an existing account (`POST /login`)
    pub async fn log_in(&self, username: &str, password: &str) -> Result<Session, RemoteError> {
        debug!(username, "logging in");
        let body = json!({ "username": username, "password": password });
        let response = self
            .send(self.request(Method::POST, "/login").json(&body))
            .await?;
        Self::json::<UserResponse>(response).await?.into_session()
    }

    /// Validates a session (`GET /users/me`) and returns its account id
    pub async fn current_account(&self, session: &Session) -> Result<AccountId, RemoteError> {
        let response = self
            .send(self.authed(Method::GET, "/users/me", session))
            .await?;
        Self::json::<UserResponse>(response).await?.account_id()
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Lists all records of the session's account
    /// (`GET /records?where={"accountId":…}`)
    pub async fn list_records(&self, session: &Session) -> Result<Vec<RemoteRecord>, RemoteError> {
        let constraint = json!({ "accountId": session.account_id() }).to_string();
        let builder = self
            .authed(Method::GET, "/records", session)
            .query(&[("where", constraint.as_str())]);
        let response = self.send(builder).await?;
        Ok(Self::json::<ListResponse>(response).await?.results)
    }

    /// Creates a record (`POST /records`)
    pub(crate) async fn create_record(
        &self,
        session: &Session,
        body: &Map<String, Value>,
    ) -> Result<CreateResponse, RemoteError> {
        let response = self
            .send(self.authed(Method::POST, "/records", session).json(body))
            .await?;
        Self::json(response).await
    }

    /// Updates a record in place (`PUT /records/{id}`)
    pub(crate) async fn update_record(
        &self,
        session: &Session,
        record_id: &RecordId,
        body: &Map<String, Value>,
    ) -> Result<UpdateResponse, RemoteError> {
        let path = format!("/records/{}", record_id.as_str());
        let response = self
            .send(self.authed(Method::PUT, &path, session).json(body))
            .await?;
        Self::json(response).await
    }

    /// Deletes a record (`DELETE /records/{id}`)
    pub async fn delete_record(
        &self,
        session: &Session,
        record_id: &RecordId,
    ) -> Result<(), RemoteError> {
        let path = format!("/records/{}", record_id.as_str());
        self.send(self.authed(Method::DELETE, &path, session))
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reachability
    // ------------------------------------------------------------------

    /// Probes backend reachability via the server-time endpoint
    ///
    /// Any HTTP response — even an error status — proves the backend is
    /// reachable; only a transport failure means offline.
    pub async fn reachable(&self) -> bool {
        self.request(Method::GET, "/date").send().await.is_ok()
    }
}
