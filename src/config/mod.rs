//! Runtime settings
//!
//! Settings come from an optional TOML file, then the environment. Every field
//! has a default so a bare install talks to Keka with file-based storage.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::auth::AuthConfig;

/// Environment variables checked (in order) for the key-value store URL.
const KV_URL_VARS: [&str; 2] = ["KV_URL", "REDIS_URL"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tenant host serving the attendance API
    pub api_base: String,
    /// OAuth client configuration
    pub auth: AuthConfig,
    /// Local credential file (used alone, or as fallback behind the key-value store)
    pub token_file: PathBuf,
    /// Redis-protocol URL; `None` selects file persistence
    pub kv_url: Option<String>,
    /// Business timezone for the weekday check
    pub timezone: Tz,
    /// Bind address for `serve`
    pub listen: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "https://alchemy.keka.com".to_string(),
            auth: AuthConfig::default(),
            token_file: PathBuf::from("keka_tokens.json"),
            kv_url: None,
            timezone: chrono_tz::Asia::Kolkata,
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl Settings {
    /// Default config file path
    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "keka-clock", "keka-clock")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Load settings from `path` (must exist) or the default location (optional),
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override `kv_url` from the first non-empty KV variable.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = KV_URL_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|v| !v.trim().is_empty())
        {
            self.kv_url = Some(url);
        }
    }
}
