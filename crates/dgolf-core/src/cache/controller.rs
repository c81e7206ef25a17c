//! The offline cache controller.
//!
//! Intercepts GET traffic and decides, per request, whether to serve from
//! the store, fetch from the network, or both with a fallback order. Every
//! failure inside `route` is recovered locally: intercepted requests always
//! produce a well-formed response, never a propagated error.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::policy::{CacheConfig, RouteClass, RoutePolicy};
use super::store::CacheStore;
use super::types::{CacheError, Fetch, FetchError, FetchRequest, FetchResponse};

/// Bound on every network attempt inside `route` and `install`, so a hung
/// connection is detected as a network failure instead of pending forever.
const NETWORK_TIMEOUT_SECS: u64 = 10;

/// Concurrency limit when installing optional assets.
const MAX_CONCURRENT_INSTALLS: usize = 4;

/// Result of routing one request.
#[derive(Debug)]
pub enum RouteOutcome {
    /// Not intercepted (non-GET or extension scheme); the caller performs
    /// the request itself and sees its errors directly.
    Bypass,
    /// The controller produced a response: network, cache or fallback.
    Response(FetchResponse),
}

pub struct OfflineController {
    store: CacheStore,
    fetcher: Arc<dyn Fetch>,
    policy: RoutePolicy,
    config: CacheConfig,
    /// Origin used to resolve root-relative asset paths.
    origin: String,
}

impl OfflineController {
    pub fn new(
        cache_root: std::path::PathBuf,
        origin: String,
        config: CacheConfig,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self, CacheError> {
        let policy = RoutePolicy::compile(&config)?;
        let store = CacheStore::open(cache_root, &config.version)?;
        Ok(Self {
            store,
            fetcher,
            policy,
            config,
            origin,
        })
    }

    pub fn version(&self) -> &str {
        self.store.version()
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.origin, path)
        }
    }

    async fn fetch_with_timeout(
        &self,
        request: &FetchRequest,
    ) -> Result<FetchResponse, FetchError> {
        match tokio::time::timeout(
            Duration::from_secs(NETWORK_TIMEOUT_SECS),
            self.fetcher.fetch(request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    /// Populate the store with the configured asset lists. Every essential
    /// asset must cache successfully or the install fails as a whole;
    /// optional assets are best-effort.
    pub async fn install(&self) -> Result<(), CacheError> {
        info!(version = %self.version(), "Installing cache");

        for path in &self.config.essential_assets {
            self.install_asset(path).await.map_err(|reason| {
                CacheError::InstallFailed {
                    path: path.clone(),
                    reason,
                }
            })?;
        }

        stream::iter(&self.config.optional_assets)
            .for_each_concurrent(MAX_CONCURRENT_INSTALLS, |path| async move {
                if let Err(reason) = self.install_asset(path).await {
                    warn!(path = %path, reason = %reason, "Skipping optional asset");
                }
            })
            .await;

        self.store.mark_ready()?;
        Ok(())
    }

    async fn install_asset(&self, path: &str) -> Result<(), String> {
        let request = FetchRequest::get(self.asset_url(path));
        let response = self
            .fetch_with_timeout(&request)
            .await
            .map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }
        self.store
            .put(&request.method, &request.url, &response)
            .map_err(|e| e.to_string())
    }

    /// Delete every stale version store. Called on activation, after which
    /// the registration claims all clients for this controller.
    pub async fn activate(&self) -> Result<Vec<String>, CacheError> {
        let purged = self.store.purge_stale()?;
        info!(version = %self.version(), purged = purged.len(), "Cache activated");
        Ok(purged)
    }

    /// Classify and handle one request.
    pub async fn route(&self, request: &FetchRequest) -> RouteOutcome {
        match self.policy.classify(request) {
            RouteClass::Bypass => RouteOutcome::Bypass,
            RouteClass::ApiCacheable => {
                RouteOutcome::Response(self.network_first(request).await)
            }
            RouteClass::ApiPassthrough => {
                RouteOutcome::Response(self.passthrough(request).await)
            }
            RouteClass::Static => RouteOutcome::Response(self.cache_first(request).await),
        }
    }

    /// Network-first with cache fallback for whitelisted API reads.
    async fn network_first(&self, request: &FetchRequest) -> FetchResponse {
        match self.fetch_with_timeout(request).await {
            Ok(response) => {
                if response.status == StatusCode::OK {
                    if let Err(e) = self.store.put(&request.method, &request.url, &response) {
                        warn!(url = %request.url, error = %e, "Write-through failed");
                    }
                }
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Network failed, trying cache");
                match self.store.get(&request.method, &request.url) {
                    Ok(Some(cached)) => cached,
                    _ => FetchResponse::offline_json(
                        "Data unavailable offline",
                        "This content requires an internet connection",
                    ),
                }
            }
        }
    }

    /// Plain fetch for non-cacheable API routes; never touches the store.
    async fn passthrough(&self, request: &FetchRequest) -> FetchResponse {
        match self.fetch_with_timeout(request).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %request.url, error = %e, "API request failed offline");
                FetchResponse::offline_json(
                    "Network unavailable",
                    "Please check your connection and try again",
                )
            }
        }
    }

    /// Cache-first for static assets and navigations.
    async fn cache_first(&self, request: &FetchRequest) -> FetchResponse {
        match self.store.get(&request.method, &request.url) {
            Ok(Some(cached)) => {
                debug!(url = %request.url, "Serving from cache");
                return cached;
            }
            Ok(None) => {}
            Err(e) => {
                // Treat an unreadable entry as a miss and go to the network
                warn!(url = %request.url, error = %e, "Cache read failed");
            }
        }

        match self.fetch_with_timeout(request).await {
            Ok(response) => {
                if response.status == StatusCode::OK {
                    if let Err(e) = self.store.put(&request.method, &request.url, &response) {
                        warn!(url = %request.url, error = %e, "Write-through failed");
                    }
                }
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Network failed for static request");
                if request.navigate {
                    let offline_url = self.asset_url(&self.config.offline_path);
                    if let Ok(Some(page)) = self.store.get(&request.method, &offline_url) {
                        return page;
                    }
                }
                FetchResponse::offline_plain()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::Method;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted fetcher: URL -> response or failure, counting calls per URL.
    struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Result<FetchResponse, FetchError>>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn respond(&self, url: &str, response: FetchResponse) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), Ok(response));
        }

        fn fail(&self, url: &str) {
            self.responses.lock().unwrap().insert(
                url.to_string(),
                Err(FetchError::Unreachable("connection refused".into())),
            );
        }

        fn go_offline(&self) {
            let mut responses = self.responses.lock().unwrap();
            for value in responses.values_mut() {
                *value = Err(FetchError::Unreachable("offline".into()));
            }
        }

        fn calls_for(&self, url: &str) -> usize {
            *self.calls.lock().unwrap().get(url).unwrap_or(&0)
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(request.url.clone())
                .or_insert(0) += 1;
            match self.responses.lock().unwrap().get(&request.url) {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(e)) => Err(e.clone()),
                None => Err(FetchError::Unreachable("unscripted url".into())),
            }
        }
    }

    const ORIGIN: &str = "https://www.dgolf.se";

    fn controller(
        dir: &TempDir,
        fetcher: Arc<ScriptedFetcher>,
        config: CacheConfig,
    ) -> OfflineController {
        OfflineController::new(
            dir.path().to_path_buf(),
            ORIGIN.to_string(),
            config,
            fetcher,
        )
        .unwrap()
    }

    fn expect_response(outcome: RouteOutcome) -> FetchResponse {
        match outcome {
            RouteOutcome::Response(response) => response,
            RouteOutcome::Bypass => panic!("expected an intercepted response"),
        }
    }

    #[tokio::test]
    async fn test_install_survives_optional_failure() {
        // Essential list succeeds, one optional asset 404s.
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(
            &format!("{ORIGIN}/"),
            FetchResponse::ok("text/html", "<html>home</html>"),
        );
        fetcher.respond(
            &format!("{ORIGIN}/offline.html"),
            FetchResponse::ok("text/html", "<html>offline</html>"),
        );
        fetcher.respond(
            &format!("{ORIGIN}/logo.png"),
            FetchResponse::new(StatusCode::NOT_FOUND, None, "missing".into()),
        );

        let config = CacheConfig {
            essential_assets: vec!["/".into(), "/offline.html".into()],
            optional_assets: vec!["/logo.png".into()],
            ..CacheConfig::default()
        };
        let controller = controller(&dir, fetcher, config);

        controller.install().await.unwrap();

        let store = controller.store();
        assert!(store.contains(&Method::GET, &format!("{ORIGIN}/")));
        assert!(store.contains(&Method::GET, &format!("{ORIGIN}/offline.html")));
        assert!(!store.contains(&Method::GET, &format!("{ORIGIN}/logo.png")));
    }

    #[tokio::test]
    async fn test_install_fails_on_essential_failure() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(
            &format!("{ORIGIN}/"),
            FetchResponse::ok("text/html", "<html>home</html>"),
        );
        fetcher.fail(&format!("{ORIGIN}/offline.html"));

        let config = CacheConfig {
            essential_assets: vec!["/".into(), "/offline.html".into()],
            optional_assets: vec![],
            ..CacheConfig::default()
        };
        let controller = controller(&dir, fetcher, config);

        match controller.install().await {
            Err(CacheError::InstallFailed { path, .. }) => {
                assert_eq!(path, "/offline.html");
            }
            other => panic!("expected install failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cache_first_never_refetches() {
        // Once cached, a static asset never reaches the network again.
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let url = format!("{ORIGIN}/static/css/main.css");
        fetcher.respond(&url, FetchResponse::ok("text/css", "body{}"));

        let controller = controller(&dir, fetcher.clone(), CacheConfig::default());
        let request = FetchRequest::get(&url);

        for _ in 0..3 {
            let response = expect_response(controller.route(&request).await);
            assert_eq!(response.status, StatusCode::OK);
        }

        assert_eq!(fetcher.calls_for(&url), 1);
    }

    #[tokio::test]
    async fn test_network_first_serves_cache_when_offline() {
        // A cacheable API read cached online is replayed offline.
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let url = format!("{ORIGIN}/api/destinations");
        let body = r#"[{"id":"d-1","name":"Costa del Sol"}]"#;
        fetcher.respond(&url, FetchResponse::ok("application/json", body));

        let controller = controller(&dir, fetcher.clone(), CacheConfig::default());
        let request = FetchRequest::get(&url);

        let online = expect_response(controller.route(&request).await);
        assert_eq!(&online.body[..], body.as_bytes());

        fetcher.go_offline();

        let offline = expect_response(controller.route(&request).await);
        assert_eq!(offline.status, StatusCode::OK);
        assert_eq!(&offline.body[..], body.as_bytes());
    }

    #[tokio::test]
    async fn test_network_first_offline_miss_is_structured_503() {
        // Network down, nothing cached -> 503 with offline: true.
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let url = format!("{ORIGIN}/api/articles");
        fetcher.fail(&url);

        let controller = controller(&dir, fetcher, CacheConfig::default());
        let response = expect_response(controller.route(&FetchRequest::get(&url)).await);

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        let value: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(value["offline"], true);
    }

    #[tokio::test]
    async fn test_passthrough_routes_never_cached() {
        // Non-whitelisted API GETs succeed without populating the store.
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let url = format!("{ORIGIN}/api/destinations/d-1");
        fetcher.respond(&url, FetchResponse::ok("application/json", r#"{"id":"d-1"}"#));

        let controller = controller(&dir, fetcher.clone(), CacheConfig::default());
        let request = FetchRequest::get(&url);

        for _ in 0..2 {
            let response = expect_response(controller.route(&request).await);
            assert_eq!(response.status, StatusCode::OK);
        }

        assert!(!controller.store().contains(&Method::GET, &url));
        assert_eq!(fetcher.calls_for(&url), 2);
    }

    #[tokio::test]
    async fn test_post_is_bypassed() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let controller = controller(&dir, fetcher.clone(), CacheConfig::default());

        let request = FetchRequest::post(format!("{ORIGIN}/api/inquiries"));
        assert!(matches!(
            controller.route(&request).await,
            RouteOutcome::Bypass
        ));
        assert_eq!(fetcher.calls_for(&format!("{ORIGIN}/api/inquiries")), 0);
    }

    #[tokio::test]
    async fn test_failed_navigation_serves_offline_page() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(
            &format!("{ORIGIN}/"),
            FetchResponse::ok("text/html", "<html>home</html>"),
        );
        fetcher.respond(
            &format!("{ORIGIN}/offline.html"),
            FetchResponse::ok("text/html", "<html>offline</html>"),
        );

        let controller = controller(&dir, fetcher.clone(), CacheConfig::default());
        controller.install().await.unwrap();
        fetcher.go_offline();

        let request = FetchRequest::navigation(format!("{ORIGIN}/articles"));
        let response = expect_response(controller.route(&request).await);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"<html>offline</html>");
    }

    #[tokio::test]
    async fn test_failed_subresource_gets_bare_503() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let controller = controller(&dir, fetcher, CacheConfig::default());

        let request = FetchRequest::get(format!("{ORIGIN}/static/js/vendor.js"));
        let response = expect_response(controller.route(&request).await);
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(&response.body[..], b"Offline");
    }

    #[tokio::test]
    async fn test_non_200_is_returned_but_not_cached() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new());
        let url = format!("{ORIGIN}/api/destinations");
        fetcher.respond(
            &url,
            FetchResponse::new(StatusCode::BAD_GATEWAY, None, "bad gateway".into()),
        );

        let controller = controller(&dir, fetcher, CacheConfig::default());
        let response = expect_response(controller.route(&FetchRequest::get(&url)).await);

        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert!(!controller.store().contains(&Method::GET, &url));
    }
}
