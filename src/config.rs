//! Client configuration
//!
//! Layered, lowest to highest precedence: built-in defaults, the YAML config
//! file, then `POUCH_HOST` and command-line flags.

use crate::client::Endpoint;
use crate::error::{PouchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default daemon address
pub const DEFAULT_HOST: &str = "unix:///var/run/pouchd.sock";

/// Default bound on one request/response exchange
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Daemon address: `unix://<path>`, `tcp://<host:port>` or an http(s) URL
    pub host: String,
    /// Transport timeout in seconds
    pub timeout_secs: u64,
    /// Enable debug logging
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
        }
    }
}

/// Values given on the command line (or through the environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub timeout_secs: Option<u64>,
    pub debug: bool,
}

impl ClientConfig {
    /// `<config dir>/pouch/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pouch").join("config.yaml"))
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PouchError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse_str(&content)
    }

    /// Parse config from YAML text. Missing keys keep their defaults.
    pub fn parse_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load the config file. An explicit path must exist; the default
    /// location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("loading config from {}", path.display());
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!("loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of this config
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
        self.debug |= overrides.debug;
        self
    }

    /// Check the final config is usable
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(PouchError::Config("timeout must be at least 1 second".to_string()));
        }
        Endpoint::parse(&self.host)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
