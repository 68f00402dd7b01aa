//! Controller configuration.
//!
//! Configuration is loaded from a TOML file (for example `tc.toml`):
//!
//! ```toml
//! backend = "direct"
//! interface = "eth0"
//! timeout_secs = 30
//! use_sudo = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which backend the controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote traffic-control sidecar over HTTP.
    Rest,
    /// `nsenter` + `tc` on this host.
    Direct,
}

impl BackendKind {
    /// Backend name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Rest => "rest",
            BackendKind::Direct => "direct",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rest" => Ok(BackendKind::Rest),
            "direct" => Ok(BackendKind::Direct),
            other => Err(ConfigError::Invalid(format!(
                "unknown backend {other:?} (expected rest or direct)"
            ))),
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend selection (default: rest).
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Sidecar host (default: 127.0.0.1).
    #[serde(default = "default_host")]
    pub host: String,
    /// Sidecar port (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interface shaped when a target does not name one (default: eth0).
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Per-call deadline in seconds (default: none).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Prefix direct-backend commands with `sudo -n` (default: true).
    #[serde(default = "default_use_sudo")]
    pub use_sudo: bool,
    /// `nsenter` binary (default: nsenter).
    #[serde(default = "default_nsenter_path")]
    pub nsenter_path: PathBuf,
    /// `tc` binary as seen inside the target namespace (default: tc).
    #[serde(default = "default_tc_path")]
    pub tc_path: PathBuf,
}

// Default value functions
fn default_backend() -> BackendKind {
    BackendKind::Rest
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_interface() -> String {
    tc_types::DEFAULT_INTERFACE.to_string()
}

fn default_use_sudo() -> bool {
    true
}

fn default_nsenter_path() -> PathBuf {
    PathBuf::from("nsenter")
}

fn default_tc_path() -> PathBuf {
    PathBuf::from("tc")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            host: default_host(),
            port: default_port(),
            interface: default_interface(),
            timeout_secs: None,
            use_sudo: default_use_sudo(),
            nsenter_path: default_nsenter_path(),
            tc_path: default_tc_path(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no backend can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interface.trim().is_empty() {
            return Err(ConfigError::Invalid("interface must not be empty".into()));
        }
        if self.backend == BackendKind::Rest && self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Per-call deadline, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Base URL of the sidecar.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value was rejected.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
