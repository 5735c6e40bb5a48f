//! API client for communicating with the catalog REST API.
//!
//! `ApiClient::execute` is the only path protected-area code uses to reach
//! the API. It refuses to send anything without a session, attaches the
//! bearer token, and turns every failure into a typed `RequestError`.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use super::request::{AuthenticatedRequest, RequestBody};
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::RequestError;
use crate::auth::CredentialStore;
use crate::models::LoginEnvelope;

/// Default base URL for API endpoints
pub const DEFAULT_API_BASE_URL: &str = "https://catalog-api.humicprototyping.net/api";

/// Login endpoint, relative to the API base URL
const LOGIN_PATH: &str = "/login";

/// Capacity of the authorization signal channel
const SIGNAL_CHANNEL_CAPACITY: usize = 16;

/// Emitted when the API rejects a session. Carries the token that was
/// sent, so a denial for an already-replaced session can be ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSignal {
    Denied { status: u16, token: String },
}

/// API client for the catalog back office.
/// Clone is cheap - the transport and credential store are shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialStore>,
    base_url: String,
    signals: broadcast::Sender<AuthSignal>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialStore>,
        base_url: impl Into<String>,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            transport,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signals,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Receive a signal every time a protected call comes back 401/403.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.signals.subscribe()
    }

    /// Send a request to a protected endpoint with the current session.
    ///
    /// Fails with `NoSession` before touching the network when nobody is
    /// logged in. Never retries.
    pub async fn execute(&self, request: AuthenticatedRequest) -> Result<Value, RequestError> {
        let token = self.credentials.token().ok_or_else(|| {
            warn!(url = %request.url, "Refusing to send request without a session");
            RequestError::NoSession
        })?;

        let headers = Self::merge_headers(request.headers, &token)?;
        let http = HttpRequest {
            method: request.method,
            url: self.resolve_url(&request.url),
            headers,
            body: request.body,
        };

        let result = self.dispatch(http).await;
        if let Err(ref e) = result {
            if let Some(status) = e.status().filter(|_| e.is_auth_failure()) {
                // Err only means nobody is subscribed
                let _ = self.signals.send(AuthSignal::Denied { status, token });
            }
        }
        result
    }

    /// `execute`, then deserialize the JSON body into `T`.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        request: AuthenticatedRequest,
    ) -> Result<T, RequestError> {
        let value = self.execute(request).await?;
        serde_json::from_value(value).map_err(|e| RequestError::Decode(e.to_string()))
    }

    /// Exchange credentials for a token.
    ///
    /// This is the one call that does not need a session, since it creates one.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginEnvelope, RequestError> {
        let http = HttpRequest {
            method: Method::POST,
            url: self.resolve_url(LOGIN_PATH),
            headers: Self::accept_json(),
            body: Some(RequestBody::Json(json!({
                "email": email,
                "password": password,
            }))),
        };

        let value = self.dispatch(http).await?;
        serde_json::from_value(value).map_err(|e| RequestError::Decode(e.to_string()))
    }

    /// Unauthenticated GET for the public catalog.
    pub async fn get_public<T: DeserializeOwned>(&self, url: &str) -> Result<T, RequestError> {
        let http = HttpRequest {
            method: Method::GET,
            url: self.resolve_url(url),
            headers: Self::accept_json(),
            body: None,
        };
        let value = self.dispatch(http).await?;
        serde_json::from_value(value).map_err(|e| RequestError::Decode(e.to_string()))
    }

    /// Join a relative path onto the base URL; absolute URLs pass through.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    fn accept_json() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Caller headers win, except Authorization which is always ours.
    fn merge_headers(mut headers: HeaderMap, token: &str) -> Result<HeaderMap, RequestError> {
        if !headers.contains_key(header::ACCEPT) {
            headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        }
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| RequestError::NoSession)?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<Value, RequestError> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(method = %method, url = %url, "Sending API request");

        let response = self.transport.send(request).await.map_err(|e| {
            error!(method = %method, url = %url, error = %e, "API request failed to send");
            RequestError::Network(e.to_string())
        })?;

        Self::check_response(&method, &url, response)
    }

    /// Turn a completed exchange into JSON or a typed error.
    fn check_response(
        method: &Method,
        url: &str,
        response: HttpResponse,
    ) -> Result<Value, RequestError> {
        if !response.is_success() {
            error!(
                method = %method,
                url = url,
                status = response.status,
                body = %RequestError::truncate_body(&response.body),
                "API error"
            );
            return Err(RequestError::Api {
                status: response.status,
                body: response.body,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response.body).map_err(|e| {
            warn!(url = url, error = %e, "Response body is not JSON");
            RequestError::Decode(format!("{} ({})", e, RequestError::truncate_body(&response.body)))
        })
    }
}
