use serde::{Deserialize, Serialize};

use crate::utils::initials;

/// Role shown when the API omits one.
pub const DEFAULT_ROLE: &str = "Administrator";

/// Minimal account profile cached alongside the session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl AdminProfile {
    /// Avatar placeholder when no image has been uploaded
    pub fn initials(&self) -> String {
        initials(&self.name, "AD")
    }

    pub fn has_image(&self) -> bool {
        self.image.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
    }
}
