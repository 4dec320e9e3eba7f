//! Client configuration
//!
//! Loaded from `<config_dir>/simstream/config.toml` unless a path is given.
//! Every field has a default so a partial file is valid.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, StreamError};
use crate::protocol::{StreamMode, ViewMode, Viewport};

const DEFAULT_ENDPOINT: &str = "ws://localhost:1234";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// WebSocket URL of the simulation server
    pub endpoint: String,
    pub mode: ViewMode,
    /// Join as a read-only spectator
    pub broadcast: bool,
    pub viewport: Viewport,
    /// Watchdog budget sent to the server on every run-mode change
    pub timeout_ms: Option<u64>,
    /// Page offered to the user after an abnormal close
    pub reload_url: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            mode: ViewMode::default(),
            broadcast: false,
            viewport: Viewport::default(),
            timeout_ms: None,
            reload_url: None,
        }
    }
}

impl StreamConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("simstream").join("config.toml"))
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StreamError::Config(format!("failed to read {:?}: {}", path, e)))?;
        let config = toml::from_str::<Self>(&content)
            .map_err(|e| StreamError::Config(format!("failed to parse {:?}: {}", path, e)))?;
        info!("Loaded stream config from {:?}", path);
        Ok(config)
    }

    /// Load an explicit path, or the default location when it exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No stream config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validated endpoint, always ending with `/`
    pub fn endpoint_url(&self) -> Result<Url> {
        let invalid = |reason: String| StreamError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };
        let mut url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(invalid(format!(
                "unsupported scheme '{}' (expected ws or wss)",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn stream_mode(&self) -> StreamMode {
        StreamMode {
            view: self.mode,
            broadcast: self.broadcast,
            viewport: self.viewport,
        }
    }

    /// Page to offer after an abnormal close, if one is configured
    pub fn reload_url(&self) -> Option<&str> {
        self.reload_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}
