use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_ENV: &str = "TMDB_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No API key configured")]
    MissingApiKey,
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::MissingApiKey => format!(
                "No catalog API key found. Set {} or add api_key to config.toml",
                API_KEY_ENV
            ),
            other => other.to_string(),
        }
    }
}

/// Runtime settings, read from `config.toml` with env and CLI overrides on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub poster_base_url: String,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
    pub connectivity_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.themoviedb.org/3".to_string(),
            api_key: None,
            poster_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
            page_size: 20,
            debounce_ms: 400,
            poll_interval_ms: 1500,
            connectivity_interval_ms: 5000,
            request_timeout_secs: 10,
        }
    }
}

/// Platform directories for config, cached logs and the session file.
pub fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
    directories::ProjectDirs::from("com", "movie-rater", "movie-rater")
        .ok_or(ConfigError::NoHomeDirectory)
}

impl Config {
    /// Load from an explicit path, or from the platform config dir when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => project_dirs()?.config_dir().join("config.toml"),
        };

        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            Self::from_toml(&text).map_err(|source| ConfigError::Parse { path, source })?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.apply_api_key(Some(key));
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Blank keys are ignored so an empty env var does not wipe the file value.
    pub fn apply_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connectivity_interval(&self) -> Duration {
        Duration::from_millis(self.connectivity_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
