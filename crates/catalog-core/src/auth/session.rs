use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AdminProfile;

/// Default lifetime of a remembered (durable) session.
pub const DEFAULT_REMEMBER_DAYS: i64 = 7;

/// Where a session is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// Cleared when the browsing context (process) ends.
    Ephemeral,
    /// Survives restarts until `expires_at`.
    Durable,
}

impl PersistenceMode {
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            PersistenceMode::Durable
        } else {
            PersistenceMode::Ephemeral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub issued_to: AdminProfile,
    pub persistence_mode: PersistenceMode,
    pub created_at: DateTime<Utc>,
    /// Only durable sessions carry an explicit expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        token: String,
        issued_to: AdminProfile,
        persistence_mode: PersistenceMode,
        remember_for: Duration,
    ) -> Self {
        let created_at = Utc::now();
        let expires_at = match persistence_mode {
            PersistenceMode::Durable => Some(created_at + remember_for),
            PersistenceMode::Ephemeral => None,
        };
        Self {
            token,
            issued_to,
            persistence_mode,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() >= at).unwrap_or(false)
    }

    /// Get days remaining until expiry (for display)
    pub fn days_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .map(|at| (at - Utc::now()).num_days().max(0))
    }
}
