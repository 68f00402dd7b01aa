//! Configuration loading for tc-sidecar.
//!
//! Configuration is loaded from a TOML file (default: `sidecar.toml`):
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0:8080"
//!
//! [controller]
//! interface = "eth0"
//! timeout_secs = 30
//! use_sudo = false
//! ```
//!
//! The sidecar always drives the direct backend; `backend`, `host` and `port`
//! under `[controller]` are ignored.

use serde::Deserialize;
use std::path::Path;
use tc_core::{BackendKind, Config as ControllerConfig, ConfigError};

/// Root configuration for tc-sidecar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Controller configuration.
    #[serde(default)]
    pub controller: ControllerConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP server (default: 0.0.0.0:8080).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
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
        config.direct_controller().validate()?;
        Ok(config)
    }

    /// Controller settings with the direct backend forced on.
    pub fn direct_controller(&self) -> ControllerConfig {
        ControllerConfig {
            backend: BackendKind::Direct,
            ..self.controller.clone()
        }
    }
}
