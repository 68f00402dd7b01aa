//! Local execution through `sudo -n`.

use async_trait::async_trait;
use std::process::Stdio;

use super::{ExecOutput, PrivilegedExecutor};
use crate::error::Result;
use crate::qdisc::command_line;

/// Runs commands on this host, optionally through non-interactive `sudo`.
///
/// `sudo -n` fails immediately instead of prompting when passwordless sudo is not
/// configured; that failure comes back as a non-zero [`ExecOutput`].
#[derive(Debug, Clone)]
pub struct SudoExecutor {
    use_sudo: bool,
}

impl SudoExecutor {
    /// Executor that prefixes every command with `sudo -n`.
    pub fn new() -> Self {
        Self { use_sudo: true }
    }

    /// Executor that runs commands as the current user (already root).
    pub fn without_sudo() -> Self {
        Self { use_sudo: false }
    }

    /// Executor honouring the `use_sudo` setting.
    pub fn with_sudo(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    /// The program and arguments actually spawned.
    pub fn invocation(&self, program: &str, args: &[String]) -> (String, Vec<String>) {
        if self.use_sudo {
            let mut full = vec!["-n".to_string(), program.to_string()];
            full.extend(args.iter().cloned());
            ("sudo".to_string(), full)
        } else {
            (program.to_string(), args.to_vec())
        }
    }
}

impl Default for SudoExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrivilegedExecutor for SudoExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput> {
        let (program, args) = self.invocation(program, args);
        tracing::debug!(command = %command_line(&program, &args), "running command");

        let output = tokio::process::Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let output = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if !output.success() {
            tracing::debug!(
                stderr = %output.stderr.trim(),
                exit_code = output.exit_code,
                "command returned non-zero status"
            );
        }

        Ok(output)
    }
}
