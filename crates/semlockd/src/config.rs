//! Daemon configuration.
//!
//! Settings are layered in increasing precedence: built-in defaults, an
//! optional TOML file, then overrides from the environment and the command
//! line (both resolved by clap before they reach this module).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use semlock_protocol::{DEFAULT_HOST, DEFAULT_PORT};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::heartbeat::HeartbeatConfig;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("heartbeat interval must be greater than zero")]
    ZeroInterval,

    #[error("liveness deadline must be greater than zero")]
    ZeroDeadline,

    #[error("liveness deadline ({deadline}s) must not be shorter than the heartbeat interval ({interval}s)")]
    DeadlineShorterThanInterval { deadline: u64, interval: u64 },
}

/// Contents of `semlockd.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub heartbeat_interval_secs: Option<u64>,
    pub liveness_deadline_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` for malformed TOML or unknown keys
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values from the environment and command line; `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub heartbeat_interval_secs: Option<u64>,
    pub liveness_deadline_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub host: String,
    pub port: u16,
    pub heartbeat: HeartbeatConfig,

    /// Directory for the daily log file; console only when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            heartbeat: HeartbeatConfig::default(),
            log_dir: None,
        }
    }
}

impl DaemonConfig {
    /// Resolves the configuration.
    ///
    /// An explicit `config_path` must exist. Without one, the default path
    /// is used if a file is there.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is unreadable or invalid, or if
    /// the resulting heartbeat timing is inconsistent.
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => Some(FileConfig::from_path(path)?),
            None => match default_config_path() {
                Some(path) if path.is_file() => Some(FileConfig::from_path(&path)?),
                _ => None,
            },
        };

        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file);
        }
        config.apply_overrides(overrides);
        config.validate()?;

        debug!(?config, "Configuration resolved");
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(secs) = file.heartbeat_interval_secs {
            self.heartbeat.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.liveness_deadline_secs {
            self.heartbeat.deadline = Duration::from_secs(secs);
        }
        if file.log_dir.is_some() {
            self.log_dir = file.log_dir;
        }
    }

    fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(secs) = overrides.heartbeat_interval_secs {
            self.heartbeat.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.liveness_deadline_secs {
            self.heartbeat.deadline = Duration::from_secs(secs);
        }
        if overrides.log_dir.is_some() {
            self.log_dir = overrides.log_dir;
        }
    }

    /// Checks the heartbeat timing.
    ///
    /// # Errors
    ///
    /// - `ConfigError::ZeroInterval` / `ConfigError::ZeroDeadline` for zero values
    /// - `ConfigError::DeadlineShorterThanInterval` if the deadline could
    ///   expire between two sweeps
    pub fn validate(&self) -> Result<(), ConfigError> {
        let HeartbeatConfig { interval, deadline } = self.heartbeat;
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if deadline.is_zero() {
            return Err(ConfigError::ZeroDeadline);
        }
        if deadline < interval {
            return Err(ConfigError::DeadlineShorterThanInterval {
                deadline: deadline.as_secs(),
                interval: interval.as_secs(),
            });
        }
        Ok(())
    }

    /// Address to bind, as `host:port`. IPv6 literals are bracketed.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// `<config_dir>/semlock/semlockd.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("semlock").join("semlockd.toml"))
}
