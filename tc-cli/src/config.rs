//! Configuration resolution for waku-tc.
//!
//! Precedence: command-line flags, then `--config`, then
//! `<config dir>/waku-tc/tc.toml`, then built-in defaults.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tc_core::{BackendKind, Config};

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub backend: Option<BackendKind>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub interface: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Load the configuration file (if any) and apply `overrides`.
pub fn resolve(explicit: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => Config::from_file(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        },
    };

    if let Some(backend) = overrides.backend {
        config.backend = backend;
    }
    if let Some(host) = overrides.host {
        config.host = host;
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(interface) = overrides.interface {
        config.interface = interface;
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        config.timeout_secs = Some(timeout_secs);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// `<config dir>/waku-tc/tc.toml` for this platform.
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "waku", "waku-tc").map(|dirs| dirs.config_dir().join("tc.toml"))
}
