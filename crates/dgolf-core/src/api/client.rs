//! API client for communicating with the DGolf REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests: auth, catalog reads, inquiries, testimonials and uploads.
//! The client also implements the offline controller's `Fetch` seam, so
//! intercepted GET reads share its connection pool and bearer token.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::cache::{Fetch, FetchError, FetchRequest, FetchResponse};
use crate::config::AppConfig;
use crate::models::{
    Article, Destination, Inquiry, InquiryCreate, StoredFile, Testimonial, TokenResponse, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Serialize)]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
    full_name: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// API client for the DGolf backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the token cell is shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: AppConfig,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Set the bearer token used by all clones of this client.
    pub fn set_token(&self, token: &str) {
        *self.token.write().expect("token lock poisoned") = Some(token.to_string());
    }

    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn url(&self, path: &str) -> String {
        self.config.url_for(path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::InvalidResponse(format!("Invalid token header: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if a response is successful. Returns Ok(Some) for success,
    /// Ok(None) for rate limit (should retry), Err otherwise.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn execute_with_retry<T, F>(&self, url: &str, send: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = send().send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .map_err(|e| ApiError::InvalidResponse(format!("{url}: {e}")));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let headers = self.auth_headers()?;
        self.execute_with_retry(&url, || self.client.get(&url).headers(headers.clone()))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let headers = self.auth_headers()?;
        let json = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("request body: {e}")))?;
        self.execute_with_retry(&url, || {
            self.client.post(&url).headers(headers.clone()).json(&json)
        })
        .await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    // ===== Auth =====

    /// Create an account. The backend issues a token immediately, so a
    /// successful registration is also a login.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<TokenResponse, ApiError> {
        self.post(
            "/api/auth/register",
            &RegisterBody {
                email,
                password,
                full_name,
            },
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        self.post("/api/auth/login", &LoginBody { email, password })
            .await
    }

    /// Resolve the user behind the current bearer token ("whoami").
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("/api/auth/me").await
    }

    // ===== Catalog =====

    pub async fn fetch_destinations(&self) -> Result<Vec<Destination>, ApiError> {
        self.get("/api/destinations").await
    }

    pub async fn fetch_destination(&self, id: &str) -> Result<Destination, ApiError> {
        self.get(&format!("/api/destinations/{id}")).await
    }

    pub async fn fetch_articles(&self) -> Result<Vec<Article>, ApiError> {
        self.get("/api/articles").await
    }

    pub async fn fetch_article(&self, id: &str) -> Result<Article, ApiError> {
        self.get(&format!("/api/articles/{id}")).await
    }

    pub async fn fetch_testimonials(&self) -> Result<Vec<Testimonial>, ApiError> {
        self.get("/api/testimonials").await
    }

    // ===== Inquiries =====

    pub async fn create_inquiry(&self, inquiry: &InquiryCreate) -> Result<Inquiry, ApiError> {
        self.post("/api/inquiries", inquiry).await
    }

    /// Back-office listing; requires an admin token.
    pub async fn fetch_inquiries(&self) -> Result<Vec<Inquiry>, ApiError> {
        self.get("/api/inquiries").await
    }

    // ===== Files =====

    pub async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredFile, ApiError> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| ApiError::InvalidResponse(format!("invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = self.url("/api/files/upload");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await?;

        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("{url}: {e}")))
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    pub async fn list_files(&self) -> Result<Vec<StoredFile>, ApiError> {
        self.get("/api/files/list").await
    }

    pub async fn download_file(&self, file_key: &str) -> Result<bytes::Bytes, ApiError> {
        let url = self.url(&format!("/api/files/{}/download", encode_path_segment(file_key)));
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.bytes().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    pub async fn delete_file(&self, file_key: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/files/{}", encode_path_segment(file_key)))
            .await
    }
}

/// Percent-encode a value used as a single path segment. File keys
/// contain slashes, which must not split the route.
fn encode_path_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[async_trait]
impl Fetch for ApiClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        Ok(FetchResponse::new(status, content_type, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_segment_keeps_route_intact() {
        assert_eq!(
            encode_path_segment("destinations/20250101_ab12.jpg"),
            "destinations%2F20250101_ab12.jpg"
        );
        assert_eq!(encode_path_segment("plain-name.png"), "plain-name.png");
    }
}
