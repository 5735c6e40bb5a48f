//! Authentication module for managing client-side sessions.
//!
//! This module provides:
//! - `CredentialStore`: the single source of truth for the current session
//! - `Session`: token plus cached admin profile with an optional expiry
//! - `StorageBackend`: ephemeral, file and keychain persistence tiers
//! - `CookieJar`: the navigation-visible token marker read by the route gate
//! - `SessionController`: login, logout and forced logout orchestration
//!
//! Remembered sessions are persisted to disk and expire after 7 days.

pub mod controller;
pub mod cookies;
pub mod credentials;
pub mod session;
pub mod storage;

pub use controller::{LoginError, SessionController, SessionState};
pub use cookies::{Cookie, CookieJar};
pub use credentials::{CredentialStore, TOKEN_COOKIE};
pub use session::{PersistenceMode, Session, DEFAULT_REMEMBER_DAYS};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, StorageBackend, StorageError};
