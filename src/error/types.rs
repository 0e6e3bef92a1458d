//! Error type definitions
//!
//! Defines the main error types used throughout the client. The variants mirror
//! the failure modes of the session/dispatch/normalization pipeline: every error
//! names the operation, step, or field that failed.

use thiserror::Error;

/// Main error type for the instant-domains client
#[derive(Error, Debug)]
pub enum Error {
    /// Warmup could not establish a ready session
    #[error("session initialization failed at {step}: {reason}")]
    SessionInitialization {
        /// Warmup step that failed (e.g. "landing-page", "token-check")
        step: String,
        /// What went wrong, naming missing tokens where applicable
        reason: String,
    },

    /// Session repeatedly invalidated after a re-warmup attempt
    #[error("authentication failed: {reason}")]
    Authentication {
        /// What the server signalled on the second invalidation
        reason: String,
    },

    /// Network or timeout failure exhausting the retry budget
    #[error("transport failed after {attempts} attempt(s): {last_cause}")]
    Transport {
        /// Attempts made before giving up
        attempts: u32,
        /// Last underlying cause
        last_cause: String,
    },

    /// Non-auth HTTP error, surfaced with status and body for diagnosis
    #[error("request failed with status {status}: {body}")]
    Request {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated by the caller)
        body: String,
    },

    /// A structurally required field could not be extracted
    #[error("parse failed for field `{field}` (selector `{selector}`): {reason}")]
    Parse {
        /// Logical field name from the declared shape
        field: String,
        /// Selector, JSON pointer, or XML path that failed
        selector: String,
        /// What went wrong
        reason: String,
    },

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/HTTP client errors
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a session initialization error for a failed warmup step
    pub fn session_initialization(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SessionInitialization {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Create a session initialization error naming the missing tokens
    pub fn missing_tokens(missing: &[String]) -> Self {
        Self::SessionInitialization {
            step: "token-check".to_string(),
            reason: format!("missing required tokens [{}]", missing.join(", ")),
        }
    }

    /// Create an authentication error
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Create a transport error with attempt count and last cause
    pub fn transport(attempts: u32, last_cause: impl Into<String>) -> Self {
        Self::Transport {
            attempts,
            last_cause: last_cause.into(),
        }
    }

    /// Create a request error from status and body
    pub fn request(status: u16, body: impl Into<String>) -> Self {
        Self::Request {
            status,
            body: body.into(),
        }
    }

    /// Create a parse error naming the field and the selector that failed
    pub fn parse(
        field: impl Into<String>,
        selector: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            field: field.into(),
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test config error");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "configuration error: test config error");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_session_initialization_error_names_tokens() {
        let err = Error::missing_tokens(&["csrf".to_string(), "session_id".to_string()]);
        assert!(matches!(err, Error::SessionInitialization { .. }));
        assert!(err.to_string().contains("csrf"));
        assert!(err.to_string().contains("session_id"));
    }

    #[test]
    fn test_session_initialization_error_names_step() {
        let err = Error::session_initialization("landing-page", "redirect depth 5 exceeded");
        assert!(err.to_string().contains("landing-page"));
        assert!(err.to_string().contains("redirect depth"));
    }

    #[test]
    fn test_authentication_error() {
        let err = Error::authentication("session invalidated twice");
        assert!(matches!(err, Error::Authentication { .. }));
        assert!(err.to_string().contains("authentication failed"));
    }

    #[test]
    fn test_transport_error_carries_attempts() {
        let err = Error::transport(3, "connection refused");
        assert!(matches!(err, Error::Transport { attempts: 3, .. }));
        assert!(err.to_string().contains("3 attempt(s)"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_request_error_carries_status_and_body() {
        let err = Error::request(404, "not found");
        assert!(matches!(err, Error::Request { status: 404, .. }));
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_error_names_field_and_selector() {
        let err = Error::parse("price", "div.price > span", "expected one match, found 0");
        assert!(matches!(err, Error::Parse { .. }));
        let msg = err.to_string();
        assert!(msg.contains("price"));
        assert!(msg.contains("div.price > span"));
    }
}
