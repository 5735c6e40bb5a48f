use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use super::cookies::{Cookie, CookieJar};
use super::session::{PersistenceMode, Session, DEFAULT_REMEMBER_DAYS};
use super::storage::{StorageBackend, StorageError};
use crate::models::AdminProfile;

/// Storage key for the serialized session
const SESSION_KEY: &str = "session";

/// Storage key for the login identifier pre-filled on the next login
const REMEMBERED_EMAIL_KEY: &str = "remembered_email";

/// Name of the navigation-visible cookie mirroring the token
pub const TOKEN_COOKIE: &str = "token";

/// Single source of truth for the current session.
///
/// The session is written to exactly one tier (ephemeral or durable) and
/// mirrored into the `token` cookie so the route gate can see it. Every
/// write goes through `save` or `clear`, which keep the two in lock-step.
pub struct CredentialStore {
    ephemeral: Arc<dyn StorageBackend>,
    durable: Arc<dyn StorageBackend>,
    cookies: CookieJar,
    remember_for: Duration,
}

impl CredentialStore {
    pub fn new(ephemeral: Arc<dyn StorageBackend>, durable: Arc<dyn StorageBackend>) -> Self {
        Self {
            cookies: CookieJar::new(durable.clone()),
            ephemeral,
            durable,
            remember_for: Duration::days(DEFAULT_REMEMBER_DAYS),
        }
    }

    /// Override how long a remembered session lives.
    pub fn with_remember_for(mut self, remember_for: Duration) -> Self {
        self.remember_for = remember_for;
        self
    }

    /// Persist a new session, replacing any existing one.
    pub fn save(
        &self,
        token: &str,
        profile: AdminProfile,
        mode: PersistenceMode,
    ) -> Result<Session, StorageError> {
        self.remove_session()?;

        let session = Session::new(token.to_string(), profile, mode, self.remember_for);
        let raw = serde_json::to_string(&session)?;

        match mode {
            PersistenceMode::Durable => {
                self.durable.set(SESSION_KEY, &raw)?;
                if let Some(expires_at) = session.expires_at {
                    self.cookies
                        .set(Cookie::persistent(TOKEN_COOKIE, token, expires_at))?;
                }
                self.durable
                    .set(REMEMBERED_EMAIL_KEY, &session.issued_to.email)?;
            }
            PersistenceMode::Ephemeral => {
                self.ephemeral.set(SESSION_KEY, &raw)?;
                self.cookies.set(Cookie::session(TOKEN_COOKIE, token))?;
                self.durable.remove(REMEMBERED_EMAIL_KEY)?;
            }
        }

        info!(email = %session.issued_to.email, mode = ?mode, "Session saved");
        Ok(session)
    }

    /// Current session, if present and not expired.
    pub fn read(&self) -> Option<Session> {
        Self::read_tier(self.ephemeral.as_ref()).or_else(|| Self::read_tier(self.durable.as_ref()))
    }

    /// Bearer token of the current session.
    pub fn token(&self) -> Option<String> {
        self.read().map(|s| s.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Identifier remembered from the last durable login.
    pub fn remembered_email(&self) -> Option<String> {
        self.durable.get(REMEMBERED_EMAIL_KEY)
    }

    /// Navigation-visible view of the session.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Remove the session and remembered identifier from every tier.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.remove_session()?;
        self.durable.remove(REMEMBERED_EMAIL_KEY)?;
        debug!("Credential store cleared");
        Ok(())
    }

    fn remove_session(&self) -> Result<(), StorageError> {
        self.ephemeral.remove(SESSION_KEY)?;
        self.durable.remove(SESSION_KEY)?;
        self.cookies.remove(TOKEN_COOKIE)
    }

    fn read_tier(tier: &dyn StorageBackend) -> Option<Session> {
        let raw = tier.get(SESSION_KEY)?;
        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session");
                return None;
            }
        };
        if session.is_expired() || session.token.is_empty() {
            debug!("Stored session expired");
            return None;
        }
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{FileStorage, MemoryStorage};

    fn profile() -> AdminProfile {
        AdminProfile {
            name: "A".to_string(),
            email: "admin@example.com".to_string(),
            role: "Administrator".to_string(),
            image: None,
        }
    }

    fn file_store(path: std::path::PathBuf) -> CredentialStore {
        CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(FileStorage::new(path)),
        )
    }

    #[test]
    fn test_durable_session_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let store = file_store(path.clone());
        store
            .save("abc123", profile(), PersistenceMode::Durable)
            .unwrap();

        // Fresh ephemeral tier, same durable file
        let reloaded = file_store(path);
        let session = reloaded.read().expect("session after reload");
        assert_eq!(session.token, "abc123");
        assert_eq!(session.issued_to, profile());
        assert_eq!(session.persistence_mode, PersistenceMode::Durable);
        assert_eq!(
            reloaded.remembered_email().as_deref(),
            Some("admin@example.com")
        );
        assert!(reloaded.cookies().contains(TOKEN_COOKIE));
    }

    #[test]
    fn test_ephemeral_session_round_trip_without_remembered_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let store = file_store(path.clone());
        store
            .save("abc123", profile(), PersistenceMode::Ephemeral)
            .unwrap();

        let session = store.read().expect("session in same context");
        assert_eq!(session.token, "abc123");
        assert_eq!(session.issued_to, profile());
        assert_eq!(store.remembered_email(), None);

        // Gone once the context ends
        let reloaded = file_store(path);
        assert!(reloaded.read().is_none());
        assert!(!reloaded.cookies().contains(TOKEN_COOKIE));
    }

    #[test]
    fn test_ephemeral_login_forgets_remembered_email() {
        let store = CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        );
        store
            .save("first", profile(), PersistenceMode::Durable)
            .unwrap();
        assert!(store.remembered_email().is_some());

        store
            .save("second", profile(), PersistenceMode::Ephemeral)
            .unwrap();
        assert_eq!(store.remembered_email(), None);
        assert_eq!(store.token().as_deref(), Some("second"));
    }

    #[test]
    fn test_new_session_replaces_old_one() {
        let store = CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        );
        store
            .save("ephemeral-token", profile(), PersistenceMode::Ephemeral)
            .unwrap();
        store
            .save("durable-token", profile(), PersistenceMode::Durable)
            .unwrap();

        let session = store.read().unwrap();
        assert_eq!(session.token, "durable-token");
        assert_eq!(
            store.cookies().get(TOKEN_COOKIE).as_deref(),
            Some("durable-token")
        );
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        );
        store
            .save("abc123", profile(), PersistenceMode::Durable)
            .unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert!(store.read().is_none());
        assert_eq!(store.token(), None);
        assert_eq!(store.remembered_email(), None);
        assert!(!store.cookies().contains(TOKEN_COOKIE));
    }

    #[test]
    fn test_expired_session_reads_as_none() {
        let store = CredentialStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
        .with_remember_for(Duration::seconds(-1));
        store
            .save("abc123", profile(), PersistenceMode::Durable)
            .unwrap();

        assert!(store.read().is_none());
        assert!(!store.is_authenticated());
        assert!(!store.cookies().contains(TOKEN_COOKIE));
    }

    #[test]
    fn test_corrupt_session_reads_as_none() {
        let durable = Arc::new(MemoryStorage::new());
        durable.set(SESSION_KEY, "not json").unwrap();
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()), durable);

        assert!(store.read().is_none());
    }
}
