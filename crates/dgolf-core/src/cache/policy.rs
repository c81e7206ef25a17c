//! Request classification and the versioned cache configuration.
//!
//! Policy differences between deployed versions are expressed as data in
//! `CacheConfig` rather than as parallel controller implementations: bumping
//! the version string and editing the lists is the whole upgrade story.

use regex::Regex;
use reqwest::Method;

use super::types::FetchRequest;

/// Cache store name for the current deploy. Bumping this is the only
/// invalidation mechanism; activation purges every other store.
pub const CACHE_VERSION: &str = "dgolf-v2.0.0";

/// Offline fallback page served for failed navigations.
pub const OFFLINE_PATH: &str = "/offline.html";

/// URL schemes the controller never intercepts.
const BYPASS_SCHEMES: &[&str] = &["chrome-extension", "moz-extension", "safari-web-extension"];

/// How `route` should treat a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Not intercepted: non-GET methods and browser-extension URLs.
    Bypass,
    /// GET to a whitelisted API route: network-first with cache fallback.
    ApiCacheable,
    /// GET to any other API route: plain fetch, structured error on failure.
    ApiPassthrough,
    /// Static asset or page navigation: cache-first.
    Static,
}

/// The versioned configuration bundle injected into the controller.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Version string naming the cache store.
    pub version: String,
    /// Assets whose install failure aborts the whole install.
    pub essential_assets: Vec<String>,
    /// Assets installed best-effort; failures are logged and skipped.
    pub optional_assets: Vec<String>,
    /// Patterns selecting which API GET routes are cached.
    pub cacheable_api_patterns: Vec<String>,
    /// Root-relative path of the offline fallback page.
    pub offline_path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            essential_assets: vec!["/".to_string(), OFFLINE_PATH.to_string()],
            optional_assets: vec![
                "/destinations".to_string(),
                "/about".to_string(),
                "/contact".to_string(),
                "/static/css/main.css".to_string(),
                "/static/js/main.js".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
            ],
            cacheable_api_patterns: vec![
                r"^/api/destinations$".to_string(),
                r"^/api/articles$".to_string(),
                r"^/api/i18n/translations".to_string(),
            ],
            offline_path: OFFLINE_PATH.to_string(),
        }
    }
}

/// Compiled classification rules.
pub struct RoutePolicy {
    cacheable: Vec<Regex>,
}

impl RoutePolicy {
    /// Compile the config's patterns. Invalid patterns are a programming
    /// error in the shipped config, reported rather than skipped.
    pub fn compile(config: &CacheConfig) -> Result<Self, regex::Error> {
        let cacheable = config
            .cacheable_api_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { cacheable })
    }

    pub fn classify(&self, request: &FetchRequest) -> RouteClass {
        if request.method != Method::GET {
            return RouteClass::Bypass;
        }
        if let Some(scheme) = request.scheme() {
            if BYPASS_SCHEMES.contains(&scheme.as_str()) {
                return RouteClass::Bypass;
            }
        }

        let path = request.path();
        if path.starts_with("/api/") {
            if self.cacheable.iter().any(|re| re.is_match(path)) {
                RouteClass::ApiCacheable
            } else {
                RouteClass::ApiPassthrough
            }
        } else {
            RouteClass::Static
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RoutePolicy {
        RoutePolicy::compile(&CacheConfig::default()).unwrap()
    }

    #[test]
    fn test_non_get_bypasses() {
        let policy = policy();
        let req = FetchRequest::post("https://api.dgolf.se/api/inquiries");
        assert_eq!(policy.classify(&req), RouteClass::Bypass);
    }

    #[test]
    fn test_extension_scheme_bypasses() {
        let policy = policy();
        let req = FetchRequest::get("chrome-extension://abc/content.js");
        assert_eq!(policy.classify(&req), RouteClass::Bypass);
    }

    #[test]
    fn test_cacheable_api_routes() {
        let policy = policy();
        for url in [
            "https://api.dgolf.se/api/destinations",
            "https://api.dgolf.se/api/articles",
            "https://api.dgolf.se/api/i18n/translations?lang=sv",
        ] {
            assert_eq!(
                policy.classify(&FetchRequest::get(url)),
                RouteClass::ApiCacheable,
                "{url}"
            );
        }
    }

    #[test]
    fn test_non_whitelisted_api_is_passthrough() {
        let policy = policy();
        for url in [
            "https://api.dgolf.se/api/auth/me",
            "https://api.dgolf.se/api/destinations/d-1",
            "https://api.dgolf.se/api/inquiries",
        ] {
            assert_eq!(
                policy.classify(&FetchRequest::get(url)),
                RouteClass::ApiPassthrough,
                "{url}"
            );
        }
    }

    #[test]
    fn test_pages_and_assets_are_static() {
        let policy = policy();
        for url in [
            "https://www.dgolf.se/",
            "https://www.dgolf.se/destinations",
            "https://www.dgolf.se/static/css/main.css",
            "https://www.dgolf.se/icons/icon-192x192.png",
        ] {
            assert_eq!(
                policy.classify(&FetchRequest::get(url)),
                RouteClass::Static,
                "{url}"
            );
        }
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let config = CacheConfig {
            cacheable_api_patterns: vec!["(".to_string()],
            ..CacheConfig::default()
        };
        assert!(RoutePolicy::compile(&config).is_err());
    }
}
