//! Daemon configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file at all) is a valid configuration. Command line flags override
//! whatever the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fs::Ownership;
use crate::refresh::RefreshConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON secret listing to serve
    pub source_path: Option<PathBuf>,
    /// Seconds between refresh cycles
    pub refresh_interval_secs: u64,
    /// Seconds a single fetch may take before the cycle is abandoned
    pub fetch_timeout_secs: u64,
    /// Seconds the kernel may cache attributes and lookups
    pub attr_ttl_secs: u64,
    /// Owner for secrets that do not name a numeric one
    pub default_uid: u32,
    /// Group for secrets that do not name a numeric one
    pub default_gid: u32,
    /// Default log filter, overridden by RUST_LOG
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: None,
            refresh_interval_secs: 30,
            fetch_timeout_secs: 10,
            attr_ttl_secs: 1,
            default_uid: 0,
            default_gid: 0,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            // a zero period would spin the refresh loop
            interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs.max(1)),
        }
    }

    pub fn ownership(&self) -> Ownership {
        Ownership::new(self.default_uid, self.default_gid)
    }

    pub fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.attr_ttl_secs)
    }
}
