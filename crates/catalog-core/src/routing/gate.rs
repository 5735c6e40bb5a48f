use tracing::debug;

use crate::auth::{CookieJar, TOKEN_COOKIE};

pub const DEFAULT_ADMIN_PREFIX: &str = "/admin";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/admin/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    Login,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

/// Middleware-style check run before a destination renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGate {
    admin_prefix: String,
    login_path: String,
    landing_path: String,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_PREFIX, DEFAULT_LOGIN_PATH, DEFAULT_LANDING_PATH)
    }
}

impl RouteGate {
    pub fn new(
        admin_prefix: impl Into<String>,
        login_path: impl Into<String>,
        landing_path: impl Into<String>,
    ) -> Self {
        Self {
            admin_prefix: normalize(&admin_prefix.into()),
            login_path: normalize(&login_path.into()),
            landing_path: normalize(&landing_path.into()),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize(path);
        if path == self.login_path {
            RouteClass::Login
        } else if path == self.admin_prefix
            || path.starts_with(&format!("{}/", self.admin_prefix))
        {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }

    /// Pure decision table.
    pub fn decide(&self, path: &str, has_token: bool) -> GateDecision {
        match (self.classify(path), has_token) {
            (RouteClass::Protected, false) => GateDecision::Redirect(self.login_path.clone()),
            (RouteClass::Login, true) => GateDecision::Redirect(self.landing_path.clone()),
            _ => GateDecision::Allow,
        }
    }

    /// Decide from the token cookie. Never calls the API.
    pub fn check(&self, path: &str, cookies: &CookieJar) -> GateDecision {
        let decision = self.decide(path, cookies.contains(TOKEN_COOKIE));
        debug!(path = path, decision = ?decision, "Route gate");
        decision
    }
}

/// Strip query and fragment, ensure a leading slash, drop trailing slashes.
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
