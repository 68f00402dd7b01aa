//! Direct backend: `nsenter` + `tc` on the container host.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tc_types::{Impairment, Rate};

use super::{Outcome, TcBackend};
use crate::error::Result;
use crate::executor::{ExecOutput, PrivilegedExecutor};
use crate::pid::PidResolver;
use crate::qdisc::{command_line, NothingToClear, QdiscConfig};

/// Binaries the direct backend invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// `nsenter`, resolved on the host.
    pub nsenter: PathBuf,
    /// `tc`, resolved inside the entered namespace.
    pub tc: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            nsenter: PathBuf::from("nsenter"),
            tc: PathBuf::from("tc"),
        }
    }
}

/// Shapes traffic by entering the target's network namespace.
///
/// Each call resolves the pid afresh, clears the root discipline, then installs
/// the new one. There is no rollback: if the install fails the interface is left
/// cleared.
#[derive(Clone)]
pub struct DirectBackend {
    executor: Arc<dyn PrivilegedExecutor>,
    resolver: Arc<dyn PidResolver>,
    tools: ToolPaths,
}

impl std::fmt::Debug for DirectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectBackend")
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl DirectBackend {
    /// Create a backend from its injected capabilities.
    pub fn new(
        executor: Arc<dyn PrivilegedExecutor>,
        resolver: Arc<dyn PidResolver>,
        tools: ToolPaths,
    ) -> Self {
        Self {
            executor,
            resolver,
            tools,
        }
    }

    /// Remove the root discipline. Already-clear interfaces succeed.
    pub async fn clear(&self, node: &str, interface: &str) -> Result<Outcome> {
        self.apply(node, interface, &Impairment::Clear).await
    }

    /// Install `netem delay`.
    pub async fn add_latency(
        &self,
        node: &str,
        interface: &str,
        delay_ms: u32,
        jitter_ms: Option<u32>,
    ) -> Result<Outcome> {
        self.apply(node, interface, &Impairment::latency(delay_ms, jitter_ms))
            .await
    }

    /// Install independent `netem loss`.
    pub async fn add_packet_loss(&self, node: &str, interface: &str, percent: f64) -> Result<Outcome> {
        self.apply(node, interface, &Impairment::packet_loss(percent)?)
            .await
    }

    /// Install correlated `netem loss`.
    pub async fn add_packet_loss_correlated(
        &self,
        node: &str,
        interface: &str,
        percent: f64,
        correlation_percent: f64,
    ) -> Result<Outcome> {
        let impairment = Impairment::correlated_packet_loss(percent, correlation_percent)?;
        self.apply(node, interface, &impairment).await
    }

    /// Install a `tbf` rate limit.
    pub async fn add_bandwidth(&self, node: &str, interface: &str, rate: &Rate) -> Result<Outcome> {
        let impairment = Impairment::Bandwidth { rate: rate.clone() };
        self.apply(node, interface, &impairment).await
    }

    fn nsenter_args(&self, pid: u32, tc_args: Vec<String>) -> Vec<String> {
        let mut args = vec![
            "-t".to_string(),
            pid.to_string(),
            "-n".into(),
            self.tools.tc.to_string_lossy().into_owned(),
        ];
        args.extend(tc_args);
        args
    }

    async fn run_tc(&self, pid: u32, tc_args: Vec<String>) -> Result<(String, ExecOutput)> {
        let program = self.tools.nsenter.to_string_lossy().into_owned();
        let args = self.nsenter_args(pid, tc_args);
        let line = command_line(&program, &args);
        tracing::debug!(command = %line, "issuing tc command");

        let output = self
            .executor
            .run(&program, &args)
            .await?
            .into_result(&program, &args)?;
        Ok((line, output))
    }

    async fn clear_root(&self, pid: u32, qdisc: &QdiscConfig) -> Result<String> {
        let program = self.tools.nsenter.to_string_lossy().into_owned();
        let args = self.nsenter_args(pid, qdisc.to_tc_del_args());
        let line = command_line(&program, &args);
        tracing::debug!(command = %line, "issuing tc command");

        let output = self.executor.run(&program, &args).await?;
        if output.success() {
            return Ok(line);
        }

        match NothingToClear::classify(&output.stderr) {
            Some(reason) => {
                tracing::debug!(
                    interface = %qdisc.interface,
                    ?reason,
                    "nothing to clear"
                );
                Ok(line)
            }
            None => output.into_result(&program, &args).map(|_| line),
        }
    }
}

#[async_trait]
impl TcBackend for DirectBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn apply(&self, node: &str, interface: &str, impairment: &Impairment) -> Result<Outcome> {
        impairment.validate()?;
        let pid = self.resolver.resolve_pid(node).await?;
        let qdisc = QdiscConfig::new(interface);

        let mut commands = vec![self.clear_root(pid, &qdisc).await?];

        if let Some(add) = qdisc.to_tc_add_args(impairment) {
            let (line, _) = self.run_tc(pid, add).await?;
            commands.push(line);
        }

        tracing::info!(node, interface, pid, %impairment, "impairment applied");
        Ok(Outcome::Local { commands })
    }

    async fn stats(&self, node: &str, interface: &str) -> Result<String> {
        let pid = self.resolver.resolve_pid(node).await?;
        let qdisc = QdiscConfig::new(interface);
        let (_, output) = self.run_tc(pid, qdisc.to_tc_show_args()).await?;
        Ok(output.stdout)
    }

    async fn resolve_pid(&self, node: &str) -> Result<u32> {
        self.resolver.resolve_pid(node).await
    }
}
