use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// View mode file name in the cache directory. Deliberately separate from
/// the session file: clearing one can never corrupt the other.
const VIEW_MODE_FILE: &str = "view_mode.json";

/// Which composition the UI presents. Demo modes let a visitor preview the
/// client or admin experience without an account; they carry no credential
/// and grant nothing server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Guest,
    DemoClient,
    DemoAdmin,
    Authenticated,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Guest
    }
}

impl ViewMode {
    /// Whether the UI should present the admin composition.
    pub fn shows_admin(&self, user_is_admin: bool) -> bool {
        match self {
            ViewMode::DemoAdmin => true,
            ViewMode::Authenticated => user_is_admin,
            _ => false,
        }
    }

    /// Whether the UI should present the client dashboard composition.
    pub fn shows_client(&self) -> bool {
        matches!(self, ViewMode::DemoClient | ViewMode::Authenticated)
    }
}

/// Durable storage for the view mode, in its own namespace.
pub struct ViewModeStore {
    cache_dir: PathBuf,
}

impl ViewModeStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn load(&self) -> ViewMode {
        let path = self.path();
        if !path.exists() {
            return ViewMode::default();
        }
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, mode: ViewMode) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string(&mode)?)
            .context("Failed to write view mode file")?;
        Ok(())
    }

    /// Reset to `Guest`, removing the file.
    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.cache_dir.join(VIEW_MODE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_to_guest() {
        let dir = TempDir::new().unwrap();
        let store = ViewModeStore::new(dir.path().to_path_buf());
        assert_eq!(store.load(), ViewMode::Guest);
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = ViewModeStore::new(dir.path().to_path_buf());

        store.save(ViewMode::DemoAdmin).unwrap();
        assert_eq!(store.load(), ViewMode::DemoAdmin);

        store.clear().unwrap();
        assert_eq!(store.load(), ViewMode::Guest);
    }

    #[test]
    fn test_shows_admin_rules() {
        assert!(ViewMode::DemoAdmin.shows_admin(false));
        assert!(ViewMode::Authenticated.shows_admin(true));
        assert!(!ViewMode::Authenticated.shows_admin(false));
        assert!(!ViewMode::Guest.shows_admin(true));
    }
}
