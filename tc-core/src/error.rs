//! Error types for traffic-control operations.

use std::time::Duration;

use tc_types::ImpairmentError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the controller and its backends.
///
/// Nothing is retried; every variant reaches the caller on the first failure.
#[derive(Debug, Error)]
pub enum TcError {
    /// The target has no running process to enter.
    #[error("target {target} is not running: {reason}")]
    NotRunning {
        /// Node identifier.
        target: String,
        /// What the runtime reported.
        reason: String,
    },

    /// The sidecar could not be reached, answered non-2xx, or sent an undecodable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// A privileged command exited non-zero.
    #[error("command failed: `{command}` exit={exit_code}, stderr={stderr}")]
    Command {
        /// Full command line.
        command: String,
        /// Exit code (-1 when killed by a signal).
        exit_code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The call did not finish within its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation name.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// The impairment failed validation.
    #[error("invalid impairment: {0}")]
    Impairment(#[from] ImpairmentError),

    /// The backend cannot perform this operation.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        /// Operation name.
        operation: &'static str,
        /// Backend name.
        backend: &'static str,
    },

    /// Docker API error other than a missing container.
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// Spawning a process failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for TcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            TcError::Transport(format!("connection failed: {e}"))
        } else if e.is_decode() {
            TcError::Transport(format!("undecodable response: {e}"))
        } else {
            TcError::Transport(e.to_string())
        }
    }
}

impl TcError {
    /// Returns true for [`TcError::NotRunning`].
    pub fn is_not_running(&self) -> bool {
        matches!(self, TcError::NotRunning { .. })
    }

    /// Returns true for [`TcError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, TcError::Timeout { .. })
    }
}

/// Result type alias for traffic-control operations.
pub type Result<T> = std::result::Result<T, TcError>;
