//! Session lifecycle: login, logout, and forced logout when the API stops
//! accepting the token.
//!
//! ```text
//! AnonymousIdle -> Authenticating -> Authenticated
//!                                 \-> AnonymousIdle (with error)
//! Authenticated -> LoggingOut -> AnonymousIdle
//! ```

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::session::{PersistenceMode, Session};
use super::storage::StorageError;
use crate::api::{ApiClient, AuthSignal, RequestError};
use crate::models::profile::DEFAULT_ROLE;
use crate::models::{AdminProfile, LoginEnvelope};
use crate::routing::{Navigator, RouteGate};

/// Shown when the API rejects a login without saying why
const DEFAULT_REJECTED_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    AnonymousIdle { error: Option<String> },
    Authenticating,
    Authenticated(Session),
    LoggingOut,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// User-visible message from the last failed login.
    pub fn error(&self) -> Option<&str> {
        match self {
            SessionState::AnonymousIdle { error } => error.as_deref(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Email and password required")]
    MissingCredentials,

    #[error("A login is already in progress")]
    InProgress,

    #[error("Login rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected login response: {0}")]
    Unexpected(String),

    #[error("Failed to store session: {0}")]
    Storage(#[from] StorageError),
}

impl LoginError {
    fn from_request(e: RequestError) -> Self {
        match e {
            RequestError::Api { status, body } => {
                let message = serde_json::from_str::<LoginEnvelope>(&body)
                    .ok()
                    .and_then(|env| env.message)
                    .filter(|m| !m.is_empty());
                match (message, status) {
                    (Some(message), _) => LoginError::Rejected(message),
                    (None, 401 | 403 | 422) => {
                        LoginError::Rejected(DEFAULT_REJECTED_MESSAGE.to_string())
                    }
                    (None, status) => LoginError::Unexpected(format!("server error ({})", status)),
                }
            }
            RequestError::Network(detail) => LoginError::Network(detail),
            RequestError::Decode(detail) => LoginError::Unexpected(detail),
            RequestError::NoSession => LoginError::Unexpected(e.to_string()),
        }
    }

    /// The single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            LoginError::MissingCredentials => "Email and password required".to_string(),
            LoginError::InProgress => "A login is already in progress".to_string(),
            LoginError::Rejected(message) => message.clone(),
            LoginError::Network(_) => {
                "Unable to reach the server. Check your connection.".to_string()
            }
            LoginError::Unexpected(detail) => format!("Login failed: {}", detail),
            LoginError::Storage(e) => format!("Login failed: {}", e),
        }
    }
}

/// Orchestrates login and logout over the credential store.
pub struct SessionController {
    api: ApiClient,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    landing_path: String,
    state: Mutex<SessionState>,
}

impl SessionController {
    /// Starts `Authenticated` when the credential store already holds a
    /// live session, `AnonymousIdle` otherwise.
    pub fn new(api: ApiClient, navigator: Arc<dyn Navigator>, gate: &RouteGate) -> Self {
        let state = match api.credentials().read() {
            Some(session) => SessionState::Authenticated(session),
            None => SessionState::AnonymousIdle { error: None },
        };
        Self {
            api,
            navigator,
            login_path: gate.login_path().to_string(),
            landing_path: gate.landing_path().to_string(),
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_state().is_authenticated()
    }

    /// Email to pre-fill on the login form.
    pub fn remembered_email(&self) -> Option<String> {
        self.api.credentials().remembered_email()
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, LoginError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            let err = LoginError::MissingCredentials;
            self.settle_after_failure(&err);
            return Err(err);
        }

        {
            let mut state = self.lock_state();
            if matches!(*state, SessionState::Authenticating) {
                return Err(LoginError::InProgress);
            }
            *state = SessionState::Authenticating;
        }

        info!(email = email, remember = remember, "Logging in");
        match self.authenticate(email, password, remember).await {
            Ok(session) => {
                self.set_state(SessionState::Authenticated(session.clone()));
                info!(email = email, "Login successful");
                self.navigator.navigate(&self.landing_path);
                Ok(session)
            }
            Err(e) => {
                error!(email = email, error = %e, "Login failed");
                self.settle_after_failure(&e);
                Err(e)
            }
        }
    }

    /// A failed login never touches the store, so a session that was
    /// already there stays authoritative.
    fn settle_after_failure(&self, err: &LoginError) {
        let state = match self.api.credentials().read() {
            Some(session) => SessionState::Authenticated(session),
            None => SessionState::AnonymousIdle {
                error: Some(err.user_message()),
            },
        };
        self.set_state(state);
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, LoginError> {
        let envelope = self
            .api
            .login(email, password)
            .await
            .map_err(LoginError::from_request)?;

        let token = envelope.issued_token().ok_or_else(|| {
            LoginError::Rejected(
                envelope
                    .message
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_REJECTED_MESSAGE.to_string()),
            )
        })?;

        let mut profile = envelope.admin.clone().unwrap_or_else(|| AdminProfile {
            name: String::new(),
            email: String::new(),
            role: DEFAULT_ROLE.to_string(),
            image: None,
        });
        if profile.email.is_empty() {
            profile.email = email.to_string();
        }

        let session = self.api.credentials().save(
            token,
            profile,
            PersistenceMode::from_remember(remember),
        )?;
        Ok(session)
    }

    /// Clear every credential tier and return to the login page.
    ///
    /// Purely local: the API is not asked to revoke the token.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.set_state(SessionState::LoggingOut);
        let result = self.api.credentials().clear();
        if let Err(ref e) = result {
            error!(error = %e, "Failed to clear credentials");
        }
        self.set_state(SessionState::AnonymousIdle { error: None });
        info!("Logged out");
        self.navigator.navigate(&self.login_path);
        result
    }

    /// React to the API rejecting a session. Returns whether a forced
    /// logout happened.
    ///
    /// Only the session that was actually rejected is logged out; a denial
    /// for a token that has since been replaced is ignored.
    pub fn handle_signal(&self, signal: AuthSignal) -> bool {
        let AuthSignal::Denied { status, token } = signal;
        if !self.is_authenticated() {
            return false;
        }
        if self.api.credentials().token().as_deref() != Some(token.as_str()) {
            debug!(status = status, "Ignoring denial for a replaced session");
            return false;
        }
        warn!(status = status, "API rejected the session, forcing logout");
        if let Err(e) = self.logout() {
            warn!(error = %e, "Forced logout left credentials behind");
        }
        true
    }

    /// Log out automatically whenever a protected call comes back 401/403.
    pub fn spawn_forced_logout(self: &Arc<Self>) -> JoinHandle<()> {
        let mut signals = self.api.subscribe();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(signal) => {
                        controller.handle_signal(signal);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Missed authorization signals");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn set_state(&self, state: SessionState) {
        *self.lock_state() = state;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::transport::{MockTransport, TransportError};
    use crate::api::{AuthenticatedRequest, HttpResponse};
    use crate::auth::{CredentialStore, MemoryStorage, TOKEN_COOKIE};
    use crate::routing::{GateDecision, Router};

    struct Harness {
        controller: Arc<SessionController>,
        router: Arc<Router>,
        store: Arc<CredentialStore>,
        api: ApiClient,
    }

    fn memory_store() -> Arc<CredentialStore> {
        Arc::new(CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        ))
    }

    fn harness(transport: MockTransport) -> Harness {
        harness_with(memory_store(), transport)
    }

    fn harness_with(store: Arc<CredentialStore>, transport: MockTransport) -> Harness {
        let api = ApiClient::new(
            Arc::new(transport),
            store.clone(),
            "https://catalog-api.example.net/api",
        );
        let gate = RouteGate::default();
        let router = Arc::new(Router::new(gate.clone(), store.clone()));
        let controller = Arc::new(SessionController::new(api.clone(), router.clone(), &gate));
        Harness {
            controller,
            router,
            store,
            api,
        }
    }

    fn login_reply(status: u16, body: &'static str) -> MockTransport {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(move |_| Ok(HttpResponse::new(status, body)));
        transport
    }

    fn profile() -> AdminProfile {
        AdminProfile {
            name: "A".to_string(),
            email: "admin@example.com".to_string(),
            role: "Administrator".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_wrong_password_stays_anonymous() {
        let h = harness(login_reply(
            200,
            r#"{"success":false,"message":"Invalid credentials"}"#,
        ));

        let err = h
            .controller
            .login("admin@example.com", "wrongpass", false)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(
            h.controller.state(),
            SessionState::AnonymousIdle {
                error: Some("Invalid credentials".to_string())
            }
        );
        assert!(h.store.read().is_none());
        assert!(!h.store.cookies().contains(TOKEN_COOKIE));
    }

    #[tokio::test]
    async fn test_rejected_with_401_uses_api_message() {
        let h = harness(login_reply(401, r#"{"success":false,"message":"Invalid credentials"}"#));

        let err = h
            .controller
            .login("admin@example.com", "wrongpass", false)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(h.controller.state().error(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_rejected_without_message_uses_default() {
        let h = harness(login_reply(401, ""));

        let err = h
            .controller
            .login("admin@example.com", "wrongpass", false)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_remembered_login_persists_durably() {
        let h = harness(login_reply(
            200,
            r#"{"success":true,"token":"abc123","admin":{"name":"A","email":"admin@example.com"}}"#,
        ));

        let session = h
            .controller
            .login("admin@example.com", "rightpass", true)
            .await
            .unwrap();

        assert_eq!(session.token, "abc123");
        assert_eq!(session.persistence_mode, PersistenceMode::Durable);
        assert_eq!(session.issued_to, profile());

        let stored = h.store.read().unwrap();
        assert_eq!(stored.token, "abc123");
        assert_eq!(stored.persistence_mode, PersistenceMode::Durable);
        assert_eq!(
            h.store.remembered_email().as_deref(),
            Some("admin@example.com")
        );
        assert!(h.controller.is_authenticated());

        // Lands on the dashboard, and the gate lets it through
        assert_eq!(h.router.current().as_deref(), Some("/admin/dashboard"));
        assert_eq!(
            h.router.gate().check("/admin/dashboard", h.store.cookies()),
            GateDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_network_failure_keeps_remembered_email() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError("connection refused".to_string())));
        let h = harness(transport);

        // Left behind by an earlier remembered login
        h.store
            .save("old", profile(), PersistenceMode::Durable)
            .unwrap();

        let err = h
            .controller
            .login("admin@example.com", "rightpass", false)
            .await
            .unwrap_err();

        assert!(matches!(err, LoginError::Network(_)));
        assert_eq!(
            err.user_message(),
            "Unable to reach the server. Check your connection."
        );
        assert_eq!(
            h.controller.remembered_email().as_deref(),
            Some("admin@example.com")
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_never_hit_api() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let h = harness(transport);

        let err = h.controller.login("  ", "secret", false).await.unwrap_err();
        assert!(matches!(err, LoginError::MissingCredentials));
        assert_eq!(
            h.controller.state().error(),
            Some("Email and password required")
        );
    }

    #[tokio::test]
    async fn test_concurrent_login_rejected() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let h = harness(transport);

        h.controller.set_state(SessionState::Authenticating);
        let err = h
            .controller
            .login("admin@example.com", "rightpass", false)
            .await
            .unwrap_err();

        assert!(matches!(err, LoginError::InProgress));
        assert_eq!(h.controller.state(), SessionState::Authenticating);
    }

    #[test]
    fn test_cold_start_reflects_store() {
        let store = Arc::new(CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        ));
        store
            .save("abc123", profile(), PersistenceMode::Durable)
            .unwrap();

        let api = ApiClient::new(
            Arc::new(MockTransport::new()),
            store.clone(),
            "https://catalog-api.example.net/api",
        );
        let gate = RouteGate::default();
        let router = Arc::new(Router::new(gate.clone(), store));
        let controller = SessionController::new(api, router, &gate);

        assert!(controller.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_redirects() {
        let h = harness(login_reply(
            200,
            r#"{"success":true,"token":"abc123","admin":{"name":"A","email":"admin@example.com"}}"#,
        ));
        h.controller
            .login("admin@example.com", "rightpass", true)
            .await
            .unwrap();

        h.controller.logout().unwrap();

        assert_eq!(
            h.controller.state(),
            SessionState::AnonymousIdle { error: None }
        );
        assert!(h.store.read().is_none());
        assert_eq!(h.store.remembered_email(), None);
        assert!(!h.store.cookies().contains(TOKEN_COOKIE));
        assert_eq!(h.router.current().as_deref(), Some("/login"));
        assert_eq!(
            h.router.gate().check("/admin/dashboard", h.store.cookies()),
            GateDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_signal_ignored_when_anonymous() {
        let h = harness(MockTransport::new());
        assert!(!h.controller.handle_signal(AuthSignal::Denied {
            status: 401,
            token: "abc123".to_string()
        }));
        assert!(h.router.current().is_none());
    }

    #[tokio::test]
    async fn test_revoked_token_forces_logout() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(401, r#"{"message":"Unauthenticated."}"#)));
        let h = harness(transport);

        h.store
            .save("revoked", profile(), PersistenceMode::Durable)
            .unwrap();
        h.controller
            .set_state(SessionState::Authenticated(h.store.read().unwrap()));

        let listener = h.controller.spawn_forced_logout();

        let err = h
            .api
            .execute(AuthenticatedRequest::get("/admin/partners"))
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());

        // Give the listener a chance to run
        for _ in 0..50 {
            if !h.controller.is_authenticated() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!h.controller.is_authenticated());
        assert!(h.store.read().is_none());
        assert_eq!(h.router.current().as_deref(), Some("/login"));
        listener.abort();
    }

    #[tokio::test]
    async fn test_denial_for_replaced_session_keeps_new_one() {
        let store = memory_store();
        store.save("old", profile(), PersistenceMode::Durable).unwrap();

        let relogin = store.clone();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.headers
                    .get(reqwest::header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer old")
            })
            .times(1)
            .returning(move |_| {
                // A fresh login lands while this request is in flight
                relogin
                    .save("fresh", profile(), PersistenceMode::Durable)
                    .unwrap();
                Ok(HttpResponse::new(401, r#"{"message":"Unauthenticated."}"#))
            });
        let h = harness_with(store, transport);
        let mut signals = h.api.subscribe();

        let err = h
            .api
            .execute(AuthenticatedRequest::get("/admin/profile"))
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());

        let signal = signals.try_recv().unwrap();
        assert!(!h.controller.handle_signal(signal));
        assert_eq!(h.store.token().as_deref(), Some("fresh"));
        assert!(h.controller.is_authenticated());
        assert!(h.router.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_relogin_keeps_existing_session() {
        let store = memory_store();
        store.save("abc123", profile(), PersistenceMode::Durable).unwrap();
        let h = harness_with(store, login_reply(401, r#"{"message":"Invalid credentials"}"#));
        assert!(h.controller.is_authenticated());

        let err = h
            .controller
            .login("admin@example.com", "wrongpass", true)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
        match h.controller.state() {
            SessionState::Authenticated(session) => assert_eq!(session.token, "abc123"),
            other => panic!("expected the old session to stay, got {:?}", other),
        }
        assert_eq!(
            h.router.gate().check("/admin/dashboard", h.store.cookies()),
            GateDecision::Allow
        );
    }
}
