use thiserror::Error;

use crate::auth::{StorageError, SESSION_EXPIRED_NOTICE};
use crate::validation::ValidationErrors;

/// Shown for failures the user can only retry.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No authentication token found")]
    MissingCredential,

    #[error("Authentication expired")]
    AuthExpired,

    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Map a non-success status. 401 always means the session is gone.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::AuthExpired,
            code => ApiError::Http {
                status: code,
                body: Self::truncate_body(body),
            },
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }

    /// Text to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuthExpired => SESSION_EXPIRED_NOTICE.to_string(),
            ApiError::MissingCredential => "Please sign in first.".to_string(),
            ApiError::Validation(errors) => errors.to_string(),
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => "Network error occurred. Please try again.".to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_auth_expired());
        match ApiError::from_status(StatusCode::NOT_FOUND, "missing") {
            ApiError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(ApiError::AuthExpired.user_message(), SESSION_EXPIRED_NOTICE);
        let http = ApiError::Http {
            status: 500,
            body: String::new(),
        };
        assert_eq!(http.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(http.to_string(), "HTTP error! status: 500");
    }
}
