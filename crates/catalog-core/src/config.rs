//! Application configuration management.
//!
//! Configuration is stored at `~/.config/catalog-admin/config.json`. Every
//! field is optional; accessors fall back to the production defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::auth::DEFAULT_REMEMBER_DAYS;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "catalog-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Durable storage file name inside the cache directory
const STORAGE_FILE: &str = "storage.json";

/// Default origin for uploaded assets (thumbnails, logos)
pub const DEFAULT_ASSET_BASE_URL: &str = "https://catalog-api.humicprototyping.net";

/// Where remembered sessions are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurableStore {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub asset_base_url: Option<String>,
    pub remember_days: Option<i64>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub durable_store: DurableStore,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// File backing the durable storage tier.
    pub fn storage_path(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(STORAGE_FILE))
    }

    pub fn api_base_url(&self) -> &str {
        non_empty(&self.api_base_url).unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn asset_base_url(&self) -> &str {
        non_empty(&self.asset_base_url).unwrap_or(DEFAULT_ASSET_BASE_URL)
    }

    /// Lifetime of a remembered session.
    pub fn remember_for(&self) -> chrono::Duration {
        chrono::Duration::days(
            self.remember_days
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_REMEMBER_DAYS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Apply `CATALOG_API_URL` / `CATALOG_ASSET_URL` overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CATALOG_API_URL") {
            self.api_base_url = Some(url);
        }
        if let Ok(url) = std::env::var("CATALOG_ASSET_URL") {
            self.asset_base_url = Some(url);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
