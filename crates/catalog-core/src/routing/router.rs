use std::sync::{Arc, Mutex};

use tracing::info;

use super::gate::{GateDecision, RouteGate};
use crate::auth::CredentialStore;

/// Redirect hops followed before giving up on a navigation
const MAX_REDIRECTS: usize = 3;

/// Something that can move the user to another location.
pub trait Navigator: Send + Sync {
    /// Navigate to `path` and return the location actually reached.
    fn navigate(&self, path: &str) -> String;
}

/// Visited locations, most recent last.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(path.to_string());
    }

    pub fn current(&self) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.last().cloned()
    }

    pub fn entries(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clone()
    }
}

/// Runs the route gate on every navigation.
pub struct Router {
    gate: RouteGate,
    credentials: Arc<CredentialStore>,
    history: History,
}

impl Router {
    pub fn new(gate: RouteGate, credentials: Arc<CredentialStore>) -> Self {
        Self {
            gate,
            credentials,
            history: History::new(),
        }
    }

    pub fn gate(&self) -> &RouteGate {
        &self.gate
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current(&self) -> Option<String> {
        self.history.current()
    }

    /// Where a navigation to `path` would end up, without recording it.
    pub fn resolve(&self, path: &str) -> String {
        let mut location = path.to_string();
        for _ in 0..MAX_REDIRECTS {
            match self.gate.check(&location, self.credentials.cookies()) {
                GateDecision::Allow => return location,
                GateDecision::Redirect(to) => {
                    info!(from = %location, to = %to, "Navigation redirected");
                    location = to;
                }
            }
        }
        location
    }
}

impl Navigator for Router {
    fn navigate(&self, path: &str) -> String {
        let location = self.resolve(path);
        self.history.push(&location);
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStorage, PersistenceMode};
    use crate::models::AdminProfile;

    fn router() -> Router {
        let store = CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        );
        Router::new(RouteGate::default(), Arc::new(store))
    }

    fn login(router: &Router) {
        router
            .credentials
            .save(
                "abc123",
                AdminProfile {
                    name: "A".to_string(),
                    email: "admin@example.com".to_string(),
                    role: "Administrator".to_string(),
                    image: None,
                },
                PersistenceMode::Ephemeral,
            )
            .unwrap();
    }

    #[test]
    fn test_anonymous_navigation_to_admin_lands_on_login() {
        let router = router();
        assert_eq!(router.navigate("/admin/partners"), "/login");
        assert_eq!(router.current().as_deref(), Some("/login"));
    }

    #[test]
    fn test_authenticated_navigation() {
        let router = router();
        login(&router);

        assert_eq!(router.navigate("/admin/partners"), "/admin/partners");
        assert_eq!(router.navigate("/login"), "/admin/dashboard");
        assert_eq!(router.navigate("/catalog"), "/catalog");
        assert_eq!(
            router.history().entries(),
            vec!["/admin/partners", "/admin/dashboard", "/catalog"]
        );
    }

    #[test]
    fn test_resolve_does_not_record() {
        let router = router();
        assert_eq!(router.resolve("/admin"), "/login");
        assert!(router.current().is_none());
    }
}
