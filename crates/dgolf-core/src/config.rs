//! Application configuration management.
//!
//! Configuration is resolved once at startup and injected into the
//! collaborators that need it; nothing reads the process environment at
//! arbitrary call sites. The file lives at `~/.config/dgolf/config.json`
//! and individual values can be overridden by environment variables
//! (`DGOLF_API_URL`).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "dgolf";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default backend deployment
const DEFAULT_API_URL: &str = "https://api.dgolf.se";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub last_email: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            last_email: None,
        }
    }
}

impl AppConfig {
    /// Load the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = {
            let path = Self::config_path()?;
            if path.exists() {
                let contents = std::fs::read_to_string(&path)?;
                serde_json::from_str(&contents)?
            } else {
                Self::default()
            }
        };

        if let Ok(url) = std::env::var("DGOLF_API_URL") {
            if !url.is_empty() {
                info!(url = %url, "Overriding API base URL from environment");
                config.api_base_url = url;
            }
        }

        // Joining paths later assumes no trailing slash
        while config.api_base_url.ends_with('/') {
            config.api_base_url.pop();
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve a root-relative path against the configured backend.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.api_base_url, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_relative_paths() {
        let config = AppConfig {
            api_base_url: "https://api.dgolf.se".to_string(),
            last_email: None,
        };
        assert_eq!(
            config.url_for("/api/destinations"),
            "https://api.dgolf.se/api/destinations"
        );
        assert_eq!(
            config.url_for("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }
}
