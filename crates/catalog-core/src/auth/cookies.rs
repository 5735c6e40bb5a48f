//! Cookie jar read synchronously by the route gate.
//!
//! Session cookies (no expiry) are held in memory and vanish with the
//! process. Persistent cookies are written to the durable storage tier and
//! read back with their expiry enforced.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::storage::{StorageBackend, StorageError};

/// Key prefix for persistent cookies inside the durable backend.
const COOKIE_KEY_PREFIX: &str = "cookie:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Cookie {
    pub fn session(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires_at: None,
        }
    }

    pub fn persistent(
        name: impl Into<String>,
        value: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() >= at).unwrap_or(false)
    }
}

pub struct CookieJar {
    session: Mutex<HashMap<String, Cookie>>,
    persistent: Arc<dyn StorageBackend>,
}

impl CookieJar {
    pub fn new(persistent: Arc<dyn StorageBackend>) -> Self {
        Self {
            session: Mutex::new(HashMap::new()),
            persistent,
        }
    }

    /// Value of a live cookie, if any.
    pub fn get(&self, name: &str) -> Option<String> {
        {
            let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cookie) = session.get(name) {
                return Some(cookie.value.clone());
            }
        }

        let raw = self.persistent.get(&Self::key(name))?;
        let cookie: Cookie = match serde_json::from_str(&raw) {
            Ok(cookie) => cookie,
            Err(e) => {
                debug!(name = name, error = %e, "Ignoring unreadable cookie");
                return None;
            }
        };
        if cookie.is_expired() {
            debug!(name = name, "Cookie expired");
            return None;
        }
        Some(cookie.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Store a cookie, replacing any cookie of the same name in either tier.
    pub fn set(&self, cookie: Cookie) -> Result<(), StorageError> {
        self.remove(&cookie.name)?;
        if cookie.expires_at.is_some() {
            let raw = serde_json::to_string(&cookie)?;
            self.persistent.set(&Self::key(&cookie.name), &raw)
        } else {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            session.insert(cookie.name.clone(), cookie);
            Ok(())
        }
    }

    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            session.remove(name);
        }
        self.persistent.remove(&Self::key(name))
    }

    fn key(name: &str) -> String {
        format!("{}{}", COOKIE_KEY_PREFIX, name)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::auth::storage::MemoryStorage;

    fn jar() -> (CookieJar, Arc<MemoryStorage>) {
        let durable = Arc::new(MemoryStorage::new());
        (CookieJar::new(durable.clone()), durable)
    }

    #[test]
    fn test_session_cookie_not_persisted() {
        let (jar, durable) = jar();
        jar.set(Cookie::session("token", "abc123")).unwrap();

        assert_eq!(jar.get("token").as_deref(), Some("abc123"));
        assert_eq!(durable.get("cookie:token"), None);

        // A fresh jar over the same durable tier does not see it
        let reloaded = CookieJar::new(durable);
        assert!(!reloaded.contains("token"));
    }

    #[test]
    fn test_persistent_cookie_survives_reload() {
        let (jar, durable) = jar();
        let expires = Utc::now() + Duration::days(7);
        jar.set(Cookie::persistent("token", "abc123", expires)).unwrap();

        let reloaded = CookieJar::new(durable);
        assert_eq!(reloaded.get("token").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_expired_cookie_reads_as_absent() {
        let (jar, _) = jar();
        let expired = Utc::now() - Duration::minutes(1);
        jar.set(Cookie::persistent("token", "stale", expired)).unwrap();

        assert!(!jar.contains("token"));
    }

    #[test]
    fn test_set_replaces_cookie_in_other_tier() {
        let (jar, durable) = jar();
        let expires = Utc::now() + Duration::days(7);
        jar.set(Cookie::persistent("token", "durable", expires)).unwrap();
        jar.set(Cookie::session("token", "ephemeral")).unwrap();

        assert_eq!(jar.get("token").as_deref(), Some("ephemeral"));
        assert_eq!(durable.get("cookie:token"), None);
    }

    #[test]
    fn test_remove_clears_both_tiers() {
        let (jar, _) = jar();
        jar.set(Cookie::session("token", "abc123")).unwrap();
        jar.remove("token").unwrap();
        jar.remove("token").unwrap();

        assert!(!jar.contains("token"));
    }
}
