use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("{0}")]
    Rejected(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FastAPI-style error body: `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Pull the `detail` string out of an error body when the backend
    /// provides one, otherwise keep the raw (truncated) body.
    fn extract_detail(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.detail,
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::extract_detail(body);
        match status.as_u16() {
            400 | 409 | 422 => ApiError::Rejected(detail),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// Whether this error means the current session token is invalid.
    /// Only 401/403 invalidate a session; everything else is transient.
    pub fn invalidates_session(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::AccessDenied(_))
    }

    /// Message suitable for inline display, with a caller-provided
    /// fallback when the failure has no user-readable detail.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected(detail) | ApiError::AccessDenied(detail) => {
                if detail.is_empty() {
                    fallback.to_string()
                } else {
                    detail.clone()
                }
            }
            ApiError::NetworkError(_) | ApiError::ServerError(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_extracts_detail() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Email already registered"}"#,
        );
        match err {
            ApiError::Rejected(detail) => assert_eq!(detail, "Email already registered"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalidates_session_only_for_auth_rejection() {
        assert!(ApiError::Unauthorized.invalidates_session());
        assert!(ApiError::AccessDenied("no".into()).invalidates_session());
        assert!(!ApiError::RateLimited.invalidates_session());
        assert!(!ApiError::ServerError("boom".into()).invalidates_session());
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert_eq!(err.user_message("Login failed"), "Login failed");

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail": "Bad slug"}"#);
        assert_eq!(err.user_message("Login failed"), "Bad slug");
    }
}
