//! Common types for the offline cache layer.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Invalid cacheable pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Essential asset failed to install: {path}: {reason}")]
    InstallFailed { path: String, reason: String },
}

/// Why a network attempt produced no response at all. HTTP error statuses
/// are not fetch errors; they come back as ordinary responses.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Network attempt timed out")]
    Timeout,
}

/// An outgoing request as seen by the controller.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    /// Page navigations get the offline page on total failure;
    /// subresource requests get a bare 503.
    pub navigate: bool,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            navigate: false,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            navigate: false,
        }
    }

    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            navigate: true,
        }
    }

    /// Path component of the URL, used for route classification.
    pub fn path(&self) -> &str {
        let without_query = self.url.split('?').next().unwrap_or(&self.url);
        match without_query.find("://") {
            Some(idx) => {
                let rest = &without_query[idx + 3..];
                match rest.find('/') {
                    Some(slash) => &rest[slash..],
                    None => "/",
                }
            }
            None => without_query,
        }
    }

    /// URL scheme, lowercased ("https", "chrome-extension", ...).
    pub fn scheme(&self) -> Option<String> {
        self.url
            .find("://")
            .map(|idx| self.url[..idx].to_ascii_lowercase())
    }
}

/// A response flowing back to the requester. Always well-formed: every
/// controller code path produces one of these for intercepted requests.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: StatusCode, content_type: Option<String>, body: Bytes) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Structured offline error payload: `{error, message, offline: true}`.
    pub fn offline_json(error: &str, message: &str) -> Self {
        let body = serde_json::json!({
            "error": error,
            "message": message,
            "offline": true,
        });
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body.to_string()),
        }
    }

    /// Bare 503 used for failed non-navigation static requests.
    pub fn offline_plain() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            content_type: Some("text/plain".to_string()),
            body: Bytes::from_static(b"Offline"),
        }
    }
}

/// The network seam. Production wraps the shared HTTP client; tests
/// script responses and count calls.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_extraction() {
        let req = FetchRequest::get("https://api.dgolf.se/api/destinations?lang=sv");
        assert_eq!(req.path(), "/api/destinations");

        let req = FetchRequest::get("https://api.dgolf.se");
        assert_eq!(req.path(), "/");

        let req = FetchRequest::get("/offline.html");
        assert_eq!(req.path(), "/offline.html");
    }

    #[test]
    fn test_request_scheme() {
        let req = FetchRequest::get("chrome-extension://abcdef/script.js");
        assert_eq!(req.scheme().as_deref(), Some("chrome-extension"));

        let req = FetchRequest::get("/relative");
        assert_eq!(req.scheme(), None);
    }

    #[test]
    fn test_offline_json_shape() {
        let resp = FetchResponse::offline_json("Network unavailable", "Try again");
        assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
        let value: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(value["offline"], true);
        assert_eq!(value["error"], "Network unavailable");
    }
}
