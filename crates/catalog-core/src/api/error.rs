use thiserror::Error;

/// Failure of a call through the authenticated request executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("No active session - please log in")]
    NoSession,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl RequestError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API rejected the session itself (401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Message suitable for an alert or inline error.
    pub fn user_message(&self) -> String {
        match self {
            RequestError::NoSession => "You are not logged in.".to_string(),
            RequestError::Network(_) => {
                "Unable to reach the server. Check your connection.".to_string()
            }
            RequestError::Api { status: 401, .. } | RequestError::Api { status: 403, .. } => {
                "Your session has expired. Please log in again.".to_string()
            }
            RequestError::Api { status: 422, body } => {
                format!("The server rejected the request: {}", Self::truncate_body(body))
            }
            RequestError::Api { status, .. } => format!("Server error ({})", status),
            RequestError::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body() {
        assert_eq!(RequestError::truncate_body("short"), "short");

        let long = "x".repeat(600);
        let truncated = RequestError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.ends_with("(truncated, 600 total bytes)"));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let long = "é".repeat(400);
        let truncated = RequestError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_auth_failure_classification() {
        let unauthorized = RequestError::Api { status: 401, body: String::new() };
        let forbidden = RequestError::Api { status: 403, body: String::new() };
        let server = RequestError::Api { status: 500, body: "Server error".to_string() };

        assert!(unauthorized.is_auth_failure());
        assert!(forbidden.is_auth_failure());
        assert!(!server.is_auth_failure());
        assert!(!RequestError::NoSession.is_auth_failure());
        assert_eq!(server.status(), Some(500));
        assert_eq!(server.user_message(), "Server error (500)");
    }
}
