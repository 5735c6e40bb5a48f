use serde::Deserialize;

use super::AdminProfile;

/// `{ "data": ... }` wrapper used by collection and detail endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Some API revisions return the account as `admin`, others as `data`.
    #[serde(default, alias = "data", alias = "user")]
    pub admin: Option<AdminProfile>,
}

impl LoginEnvelope {
    /// Token of a successful login, if the API actually issued one.
    pub fn issued_token(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
