//! Probe harness: a Docker Compose topology for measuring real impairments.
//!
//! Manages the lifecycle of a small topology (two idle containers on one
//! bridge network) and provides methods for running probes inside containers
//! and for shaping them with the direct backend.

use bollard::container::{LogOutput, StopContainerOptions};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use futures_util::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tc_core::{DirectBackend, DockerPidResolver, SudoExecutor, TcError, ToolPaths, TrafficController};
use thiserror::Error;

/// Errors that can occur during harness operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Docker API error.
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// Command execution failed inside container.
    #[error("exec failed in {container}: exit={exit_code}, stderr={stderr}")]
    ExecFailed {
        /// Container name.
        container: String,
        /// Exit code from command.
        exit_code: i64,
        /// Standard error output.
        stderr: String,
    },

    /// Docker Compose CLI error.
    #[error("compose error: {0}")]
    Compose(String),

    /// The container has no address on the topology network.
    #[error("no network address for {0}")]
    NoAddress(String),

    /// Traffic-control error.
    #[error("tc error: {0}")]
    Tc(#[from] TcError),

    /// General I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of executing a command inside a container.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code (0 = success).
    pub exit_code: i64,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Outcome of a `ping` run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PingReport {
    /// Echo requests sent.
    pub sent: usize,
    /// `(sequence, rtt_ms)` for every reply, in arrival order.
    pub replies: Vec<(usize, f64)>,
    /// Sequence number of the first request: 0 for busybox, 1 for iputils.
    pub first_seq: usize,
}

impl PingReport {
    /// Parse busybox or iputils `ping` output for a run of `sent` requests.
    pub fn parse(output: &str, sent: usize) -> Self {
        let replies = output
            .lines()
            .filter_map(|line| {
                let seq = field(line, "seq=")?.parse::<usize>().ok()?;
                let rtt = field(line, "time=")?.parse::<f64>().ok()?;
                Some((seq, rtt))
            })
            .collect();
        // iputils prints `icmp_seq=` and starts at 1; busybox prints `seq=` and starts at 0.
        let first_seq = usize::from(output.contains("icmp_seq="));
        Self {
            sent,
            replies,
            first_seq,
        }
    }

    /// Replies received (duplicates included).
    pub fn received(&self) -> usize {
        self.replies.len()
    }

    /// Per-request loss indicators in sequence order (`true` = no reply).
    ///
    /// Index 0 is the first request, whatever number the tool gave it.
    pub fn lost(&self) -> Vec<bool> {
        let mut lost = vec![true; self.sent];
        for (seq, _) in &self.replies {
            if let Some(slot) = seq.checked_sub(self.first_seq).and_then(|i| lost.get_mut(i)) {
                *slot = false;
            }
        }
        lost
    }

    /// Mean round-trip time in milliseconds, if any reply arrived.
    pub fn mean_rtt_ms(&self) -> Option<f64> {
        if self.replies.is_empty() {
            return None;
        }
        Some(self.replies.iter().map(|(_, rtt)| rtt).sum::<f64>() / self.replies.len() as f64)
    }
}

/// Value following `key` up to the next space, e.g. `seq=` in `seq=3 ttl=64`.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = &line[start..];
    Some(rest.split_whitespace().next().unwrap_or(rest))
}

/// Docker topology for impairment probes.
///
/// Manages a Docker Compose topology with unique project name for test isolation.
/// Provides methods for:
/// - Starting/stopping the topology
/// - Executing probes inside containers
/// - Building a direct-backend controller against the topology's containers
pub struct ProbeHarness {
    /// Unique project name for Docker Compose isolation.
    project_name: String,
    /// Path to the compose file.
    compose_file: PathBuf,
    /// bollard Docker client.
    docker: Docker,
}

impl ProbeHarness {
    /// Create a new harness with a unique project name.
    ///
    /// The compose_file path should be absolute or relative to cwd.
    pub fn new(compose_file: PathBuf) -> Result<Self, HarnessError> {
        let docker = Docker::connect_with_local_defaults()?;
        let project_name = format!("tc-{}", uuid::Uuid::new_v4().as_simple());

        Ok(Self {
            project_name,
            compose_file,
            docker,
        })
    }

    /// Harness for the topology shipped with this crate.
    pub fn default_topology() -> Result<Self, HarnessError> {
        Self::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("docker-compose.tc.yml"))
    }

    /// Get the unique project name.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start the topology and wait for it to be healthy.
    pub async fn setup(&self) -> Result<(), HarnessError> {
        self.compose(&["up", "-d", "--wait"]).await
    }

    /// Tear down the topology, removing containers and volumes.
    pub async fn teardown(&self) -> Result<(), HarnessError> {
        self.compose(&["down", "-v", "--remove-orphans"]).await
    }

    async fn compose(&self, args: &[&str]) -> Result<(), HarnessError> {
        let compose_file = self.compose_file.to_string_lossy().into_owned();
        let output = tokio::process::Command::new("docker")
            .args(["compose", "-f", &compose_file, "-p", &self.project_name])
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::Compose(format!(
                "docker compose {} failed: {}",
                args.join(" "),
                stderr
            )));
        }

        Ok(())
    }

    // ========================================================================
    // Traffic control
    // ========================================================================

    /// Controller that shapes this topology's containers directly.
    ///
    /// Needs `nsenter` and `tc` on the host and root (or passwordless sudo).
    pub fn controller(&self, use_sudo: bool) -> TrafficController {
        let backend = DirectBackend::new(
            Arc::new(SudoExecutor::with_sudo(use_sudo)),
            Arc::new(DockerPidResolver::new(self.docker.clone())),
            ToolPaths::default(),
        );
        TrafficController::new(Arc::new(backend))
    }

    // ========================================================================
    // Container exec
    // ========================================================================

    /// Execute a command inside a container and return the result.
    pub async fn exec_in_container(
        &self,
        service: &str,
        cmd: Vec<&str>,
    ) -> Result<ExecResult, HarnessError> {
        let container_name = self.container_name(service);

        let exec_options = CreateExecOptions {
            cmd: Some(cmd.iter().map(|s| s.to_string()).collect()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self
            .docker
            .create_exec(&container_name, exec_options)
            .await?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        if let StartExecResults::Attached { mut output, .. } =
            self.docker.start_exec(&exec.id, None).await?
        {
            while let Some(Ok(msg)) = output.next().await {
                match msg {
                    LogOutput::StdOut { message } => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    LogOutput::StdErr { message } => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    _ => {}
                }
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        let exit_code = inspect.exit_code.unwrap_or(-1);

        Ok(ExecResult {
            stdout,
            stderr,
            exit_code,
        })
    }

    /// Ping `target_ip` from `service`. Lost replies are not an error.
    pub async fn ping(
        &self,
        service: &str,
        target_ip: &str,
        count: usize,
        interval_secs: f64,
    ) -> Result<PingReport, HarnessError> {
        let count_arg = count.to_string();
        let interval_arg = interval_secs.to_string();
        let result = self
            .exec_in_container(
                service,
                vec!["ping", "-c", &count_arg, "-i", &interval_arg, "-W", "2", target_ip],
            )
            .await?;

        // ping exits 1 when some replies are missing; only "no output" is fatal.
        if !result.success() && !result.stdout.contains("bytes from") && result.exit_code != 1 {
            return Err(HarnessError::ExecFailed {
                container: service.to_string(),
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(PingReport::parse(&result.stdout, count))
    }

    // ========================================================================
    // Container lifecycle
    // ========================================================================

    /// Address of `service` on its first network.
    pub async fn container_ip(&self, service: &str) -> Result<String, HarnessError> {
        let name = self.container_name(service);
        let inspect = self.docker.inspect_container(&name, None).await?;

        inspect
            .network_settings
            .and_then(|settings| settings.networks)
            .and_then(|networks| {
                networks
                    .into_values()
                    .filter_map(|endpoint| endpoint.ip_address)
                    .find(|ip| !ip.is_empty())
            })
            .ok_or(HarnessError::NoAddress(name))
    }

    /// Stop a container (its pid goes away, the name stays).
    pub async fn stop_container(&self, service: &str) -> Result<(), HarnessError> {
        let name = self.container_name(service);
        self.docker
            .stop_container(&name, Some(StopContainerOptions { t: 2 }))
            .await?;
        Ok(())
    }

    /// Build the full container name from project name and service.
    ///
    /// Docker Compose naming: `<project>-<service>-1`
    pub fn container_name(&self, service: &str) -> String {
        format!("{}-{}-1", self.project_name, service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUSYBOX: &str = "PING 172.18.0.3 (172.18.0.3): 56 data bytes
64 bytes from 172.18.0.3: seq=0 ttl=64 time=500.412 ms
64 bytes from 172.18.0.3: seq=2 ttl=64 time=501.087 ms
64 bytes from 172.18.0.3: seq=3 ttl=64 time=499.950 ms

--- 172.18.0.3 ping statistics ---
4 packets transmitted, 3 packets received, 25% packet loss
";

    const IPUTILS: &str = "PING 172.18.0.3 (172.18.0.3) 56(84) bytes of data.
64 bytes from 172.18.0.3: icmp_seq=1 ttl=64 time=0.061 ms
64 bytes from 172.18.0.3: icmp_seq=3 ttl=64 time=0.058 ms
";

    #[test]
    fn parses_busybox_ping() {
        let report = PingReport::parse(BUSYBOX, 4);
        assert_eq!(report.received(), 3);
        assert_eq!(report.lost(), vec![false, true, false, false]);
        let mean = report.mean_rtt_ms().unwrap();
        assert!((mean - 500.483).abs() < 0.01);
    }

    #[test]
    fn parses_iputils_ping() {
        let report = PingReport::parse(IPUTILS, 3);
        assert_eq!(report.lost(), vec![false, true, false]);
    }

    #[test]
    fn no_replies() {
        let report = PingReport::parse("PING 10.0.0.1 (10.0.0.1): 56 data bytes\n", 5);
        assert_eq!(report.received(), 0);
        assert!(report.mean_rtt_ms().is_none());
        assert_eq!(report.lost(), vec![true; 5]);
    }

    #[test]
    fn busybox_first_request_lost() {
        let output = "PING 172.18.0.3 (172.18.0.3): 56 data bytes
64 bytes from 172.18.0.3: seq=1 ttl=64 time=0.072 ms
64 bytes from 172.18.0.3: seq=2 ttl=64 time=0.069 ms
64 bytes from 172.18.0.3: seq=3 ttl=64 time=0.070 ms
";
        let report = PingReport::parse(output, 4);
        assert_eq!(report.first_seq, 0);
        assert_eq!(report.lost(), vec![true, false, false, false]);
    }

    #[test]
    fn iputils_first_request_lost() {
        let output = "64 bytes from 172.18.0.3: icmp_seq=2 ttl=64 time=0.061 ms\n";
        let report = PingReport::parse(output, 2);
        assert_eq!(report.first_seq, 1);
        assert_eq!(report.lost(), vec![true, false]);
    }

    #[test]
    fn harness_unique_project_names() {
        let h1 = ProbeHarness::new(PathBuf::from("test.yml")).unwrap();
        let h2 = ProbeHarness::new(PathBuf::from("test.yml")).unwrap();

        assert_ne!(h1.project_name(), h2.project_name());
        assert!(h1.project_name().starts_with("tc-"));
        assert_eq!(h1.container_name("node1"), format!("{}-node1-1", h1.project_name()));
    }
}
