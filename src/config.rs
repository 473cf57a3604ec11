//! Configuration file support for tunelens
//!
//! Reads from .tunelens/config.toml, found by walking up from the current
//! directory. `TUNELENS_API_URL` overrides the backend URL.

use crate::endpoints::TimeoutClass;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_URL_ENV: &str = "TUNELENS_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Feedback timing for the page
    #[serde(default)]
    pub ui: UiConfig,

    /// Local dashboard server
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Backend URL and per-class timeouts, in seconds
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_get_timeout")]
    pub get_timeout_secs: u64,

    /// Training runs server-side and can take minutes
    #[serde(default = "default_post_timeout")]
    pub post_timeout_secs: u64,

    #[serde(default = "default_predict_timeout")]
    pub predict_timeout_secs: u64,

    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UiConfig {
    /// How long a clamped-input warning stays visible
    #[serde(default = "default_warning_ms")]
    pub warning_ms: u64,

    /// How long the health banner stays visible
    #[serde(default = "default_banner_ms")]
    pub banner_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_get_timeout() -> u64 {
    30
}

fn default_post_timeout() -> u64 {
    180
}

fn default_predict_timeout() -> u64 {
    10
}

fn default_health_timeout() -> u64 {
    5
}

fn default_warning_ms() -> u64 {
    2000
}

fn default_banner_ms() -> u64 {
    10_000
}

fn default_port() -> u16 {
    3030
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            get_timeout_secs: default_get_timeout(),
            post_timeout_secs: default_post_timeout(),
            predict_timeout_secs: default_predict_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            warning_ms: default_warning_ms(),
            banner_ms: default_banner_ms(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Timeout budget for one call of the given class
    pub fn timeout(&self, class: TimeoutClass) -> Duration {
        let secs = match class {
            TimeoutClass::Health => self.health_timeout_secs,
            TimeoutClass::Read => self.get_timeout_secs,
            TimeoutClass::Inference => self.predict_timeout_secs,
            TimeoutClass::Training => self.post_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

impl UiConfig {
    pub fn warning_ttl(&self) -> Duration {
        Duration::from_millis(self.warning_ms)
    }

    pub fn banner_ttl(&self) -> Duration {
        Duration::from_millis(self.banner_ms)
    }
}

impl Config {
    /// Load config from .tunelens/config.toml, then apply the env override.
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api.base_url = url.trim().to_string();
            }
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".tunelens").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}
