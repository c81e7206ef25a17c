//! Versioned on-disk response store.
//!
//! One store is "current" at a time; its name is a literal version string
//! and its contents live under `<root>/<version>/`. Entries map a request
//! identity (method + URL, GET only in practice) to the most recently
//! observed successful response. There is no per-entry eviction: the whole
//! store is replaced wholesale when the version string changes, and
//! `purge_stale` removes every sibling version on activation.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::types::{CacheError, FetchResponse};

/// Metadata stored beside each cached body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMetadata {
    url: String,
    method: String,
    status: u16,
    content_type: Option<String>,
    cached_at: DateTime<Utc>,
}

pub struct CacheStore {
    root: PathBuf,
    version: String,
}

impl CacheStore {
    /// Open (creating if needed) the store directory for `version`.
    pub fn open(root: PathBuf, version: &str) -> Result<Self, CacheError> {
        let store = Self {
            root,
            version: version.to_string(),
        };
        std::fs::create_dir_all(store.dir())?;
        Ok(store)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn dir(&self) -> PathBuf {
        self.root.join(&self.version)
    }

    /// Filename-safe identity for a request: hash of `METHOD URL`.
    fn entry_key(method: &Method, url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(method.as_str());
        hasher.update(b" ");
        hasher.update(url);
        let hash = hasher.finalize();
        format!("{hash:x}")
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir().join(format!("{key}.meta.json"))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir().join(format!("{key}.bin"))
    }

    /// Write-through of a successful response. The body is written first so
    /// a crash between the two writes leaves no metadata pointing at nothing.
    pub fn put(&self, method: &Method, url: &str, response: &FetchResponse) -> Result<(), CacheError> {
        let key = Self::entry_key(method, url);
        let metadata = EntryMetadata {
            url: url.to_string(),
            method: method.to_string(),
            status: response.status.as_u16(),
            content_type: response.content_type.clone(),
            cached_at: Utc::now(),
        };
        std::fs::write(self.body_path(&key), &response.body)?;
        std::fs::write(self.meta_path(&key), serde_json::to_vec_pretty(&metadata)?)?;
        debug!(url = url, store = %self.version, "Cached response");
        Ok(())
    }

    /// Look up the cached response for a request identity.
    pub fn get(&self, method: &Method, url: &str) -> Result<Option<FetchResponse>, CacheError> {
        let key = Self::entry_key(method, url);
        let meta_path = self.meta_path(&key);
        if !meta_path.exists() {
            return Ok(None);
        }

        let metadata: EntryMetadata = serde_json::from_str(&std::fs::read_to_string(&meta_path)?)?;
        let body = std::fs::read(self.body_path(&key))?;
        let status =
            StatusCode::from_u16(metadata.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        Ok(Some(FetchResponse::new(
            status,
            metadata.content_type,
            Bytes::from(body),
        )))
    }

    pub fn contains(&self, method: &Method, url: &str) -> bool {
        let key = Self::entry_key(method, url);
        self.meta_path(&key).exists()
    }

    /// Mark this version as fully installed. A later process start can
    /// skip re-installing the same version and activate straight away,
    /// which keeps a warm cache usable when launching offline.
    pub fn mark_ready(&self) -> Result<(), CacheError> {
        std::fs::write(self.dir().join(".ready"), self.version.as_bytes())?;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.dir().join(".ready").exists()
    }

    /// All version stores currently present under the cache root.
    pub fn list_versions(&self) -> Result<Vec<String>, CacheError> {
        let mut versions = Vec::new();
        if !self.root.exists() {
            return Ok(versions);
        }
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Ok(name) = entry.file_name().into_string() {
                    versions.push(name);
                }
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Delete every version store whose name differs from the current one.
    /// Returns the names that were removed.
    pub fn purge_stale(&self) -> Result<Vec<String>, CacheError> {
        let mut purged = Vec::new();
        for name in self.list_versions()? {
            if name != self.version {
                let path = self.root.join(&name);
                match std::fs::remove_dir_all(&path) {
                    Ok(()) => {
                        debug!(store = %name, "Deleted stale cache");
                        purged.push(name);
                    }
                    Err(e) => {
                        // Leave it for the next activation rather than failing
                        warn!(store = %name, error = %e, "Failed to delete stale cache");
                    }
                }
            }
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir, version: &str) -> CacheStore {
        CacheStore::open(dir.path().to_path_buf(), version).unwrap()
    }

    #[test]
    fn test_put_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "dgolf-v2.0.0");
        let response = FetchResponse::ok("application/json", r#"[{"id":"d-1"}]"#);

        let url = "https://api.dgolf.se/api/destinations";
        store.put(&Method::GET, url, &response).unwrap();

        let cached = store.get(&Method::GET, url).unwrap().unwrap();
        assert_eq!(cached.status, StatusCode::OK);
        assert_eq!(cached.content_type.as_deref(), Some("application/json"));
        assert_eq!(&cached.body[..], br#"[{"id":"d-1"}]"#);
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "dgolf-v2.0.0");
        assert!(store
            .get(&Method::GET, "https://api.dgolf.se/api/articles")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_method_is_part_of_identity() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "dgolf-v2.0.0");
        let url = "https://api.dgolf.se/api/destinations";
        store
            .put(&Method::GET, url, &FetchResponse::ok("application/json", "[]"))
            .unwrap();

        assert!(store.contains(&Method::GET, url));
        assert!(!store.contains(&Method::POST, url));
    }

    #[test]
    fn test_purge_stale_keeps_only_current() {
        let dir = TempDir::new().unwrap();
        let old = open_store(&dir, "dgolf-v1.0.0");
        old.put(
            &Method::GET,
            "https://api.dgolf.se/",
            &FetchResponse::ok("text/html", "<html>"),
        )
        .unwrap();

        let current = open_store(&dir, "dgolf-v2.0.0");
        let purged = current.purge_stale().unwrap();

        assert_eq!(purged, vec!["dgolf-v1.0.0".to_string()]);
        assert_eq!(
            current.list_versions().unwrap(),
            vec!["dgolf-v2.0.0".to_string()]
        );
    }

    #[test]
    fn test_ready_marker_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "dgolf-v2.0.0");
        assert!(!store.is_ready());
        store.mark_ready().unwrap();
        assert!(store.is_ready());

        // A different version has its own marker.
        let other = open_store(&dir, "dgolf-v3.0.0");
        assert!(!other.is_ready());
    }

    #[test]
    fn test_purge_stale_noop_when_alone() {
        let dir = TempDir::new().unwrap();
        let current = open_store(&dir, "dgolf-v2.0.0");
        assert!(current.purge_stale().unwrap().is_empty());
    }
}
