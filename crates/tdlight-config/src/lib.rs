//! Client settings for the TD-light portal tools.
//! Reads tdlight.toml from the current directory or the path in the TDLIGHT_CONFIG env var.
//!
//! A missing file is not an error: every field has a default, so a bare
//! install talks to a backend on `http://127.0.0.1:5001`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "TDLIGHT_CONFIG";
pub const BACKEND_URL_ENV: &str = "TDLIGHT_BACKEND_URL";
pub const DEFAULT_CONFIG_FILE: &str = "tdlight.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub classification: ClassificationSettings,
    #[serde(default)]
    pub import: ImportSettings,
    #[serde(default)]
    pub auto_classify: AutoClassifySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Applies to plain requests only; progress streams stay open until the job ends.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url()        -> String { "http://127.0.0.1:5001".to_string() }
fn default_connect_timeout() -> u64 { 10 }
fn default_request_timeout() -> u64 { 60 }

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

fn default_search_limit() -> u32 { 200 }

impl Default for SearchSettings {
    fn default() -> Self {
        Self { limit: default_search_limit() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSettings {
    #[serde(default = "default_results_limit")]
    pub results_limit: u32,
    /// Pause between the final progress event and the results fetch.
    #[serde(default = "default_results_delay_ms")]
    pub results_delay_ms: u64,
}

fn default_results_limit()    -> u32 { 500 }
fn default_results_delay_ms() -> u64 { 1000 }

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            results_limit: default_results_limit(),
            results_delay_ms: default_results_delay_ms(),
        }
    }
}

impl ClassificationSettings {
    pub fn results_delay(&self) -> Duration {
        Duration::from_millis(self.results_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Used when the backend config names no database.
    #[serde(default = "default_db_name")]
    pub default_db: String,
    #[serde(default = "default_nside")]
    pub nside: u32,
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default = "default_vgroups")]
    pub vgroups: u32,
}

fn default_db_name() -> String { "gaiadr2_lc".to_string() }
fn default_nside()   -> u32 { 64 }
fn default_threads() -> u32 { 16 }
fn default_vgroups() -> u32 { 32 }

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            default_db: default_db_name(),
            nside: default_nside(),
            threads: default_threads(),
            vgroups: default_vgroups(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoClassifySettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_batch_size() -> u32 { 5000 }

impl Default for AutoClassifySettings {
    fn default() -> Self {
        Self { batch_size: default_batch_size() }
    }
}

impl Settings {
    /// Load settings from tdlight.toml.
    /// Checks TDLIGHT_CONFIG env var first, then current directory, then applies
    /// TDLIGHT_BACKEND_URL on top.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut settings = if Path::new(&path).exists() {
            Self::load_from(&path)?
        } else {
            info!(path = %path, "No config file found, using defaults");
            Self::default()
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay environment values. `lookup` is `std::env::var` in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
            debug!(url = %url, "Backend URL overridden from environment");
            self.backend.base_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url must be an http(s) URL, got {:?}",
                self.backend.base_url
            )));
        }
        if self.search.limit == 0 {
            return Err(ConfigError::Invalid("search.limit must be positive".into()));
        }
        if self.auto_classify.batch_size == 0 {
            return Err(ConfigError::Invalid("auto_classify.batch_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
