//! Privileged process execution.
//!
//! The direct backend never spawns processes itself; it goes through a
//! [`PrivilegedExecutor`] so escalation (`sudo`, running as root, a remote shell)
//! stays an injected capability and can be replaced in tests.

mod mock;
mod sudo;

pub use mock::MockExecutor;
pub use sudo::SudoExecutor;

use async_trait::async_trait;

use crate::error::{Result, TcError};
use crate::qdisc::command_line;

/// Result of running a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code (0 = success, -1 = killed by signal).
    pub exit_code: i32,
}

impl ExecOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code,
            ..Default::default()
        }
    }

    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a non-zero exit into [`TcError::Command`].
    pub fn into_result(self, program: &str, args: &[String]) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(TcError::Command {
            command: command_line(program, args),
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
        })
    }
}

/// Runs commands with the privileges needed to enter namespaces and change qdiscs.
///
/// Implementations return the raw output and do NOT fail on non-zero exit;
/// only a failure to run at all is an error.
#[async_trait]
pub trait PrivilegedExecutor: Send + Sync {
    /// Run `program` with `args` and wait for it to exit.
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput>;
}
