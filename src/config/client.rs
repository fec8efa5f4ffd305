use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TmsError};

/// Base URL used when neither config nor environment provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Client configuration from `~/.config/tms/config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root of the REST API, including any version prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where exported documents are saved. Default: current directory.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Location of the persisted credential. Default: `<config dir>/token`.
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    /// Per-request timeout. No timeout when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            download_dir: None,
            token_path: None,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Load config from a YAML file. Returns default if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|e| TmsError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the global config and apply `TMS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default_path = super::dirs_global().join("config.yml");
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    ///
    /// Recognised keys: `TMS_API_BASE_URL`, `TMS_TOKEN_PATH`,
    /// `TMS_DOWNLOAD_DIR`, `TMS_REQUEST_TIMEOUT_SECS`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("TMS_API_BASE_URL") {
            self.base_url = url;
        }
        if let Some(path) = get("TMS_TOKEN_PATH") {
            self.token_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = get("TMS_DOWNLOAD_DIR") {
            self.download_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = get("TMS_REQUEST_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(e) => tracing::warn!("ignoring TMS_REQUEST_TIMEOUT_SECS={secs}: {e}"),
            }
        }
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| super::dirs_global().join(crate::session::TOKEN_KEY))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
