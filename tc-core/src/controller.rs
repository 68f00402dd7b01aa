//! TrafficController - the entry point test harnesses use.
//!
//! # Architecture
//!
//! ```text
//! test → TrafficController → TcBackend ─┬→ RestBackend   → sidecar → tc
//!                                       └→ DirectBackend → nsenter → tc
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tc_core::TrafficController;
//!
//! let tc = TrafficController::rest("127.0.0.1", 8080);
//! tc.add_packet_loss_correlated("node2", 40.0, 75.0).await?;
//! // ... measure delivery ...
//! tc.clear("node2").await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tc_types::{Impairment, Rate, Target, DEFAULT_INTERFACE};
use tracing::Instrument;

use crate::backend::{DirectBackend, Outcome, RestBackend, TcBackend, ToolPaths};
use crate::config::{BackendKind, Config};
use crate::error::{Result, TcError};
use crate::executor::SudoExecutor;
use crate::pid::DockerPidResolver;
use crate::stats::QdiscReport;

/// Applies and removes network impairments on test nodes.
///
/// Every `add_*` replaces whatever was installed on the interface. Calls are
/// independent; callers that impair the same node from several tasks must order
/// those calls themselves.
#[derive(Clone)]
pub struct TrafficController {
    backend: Arc<dyn TcBackend>,
    interface: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for TrafficController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficController")
            .field("backend", &self.backend.name())
            .field("interface", &self.interface)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for TrafficController {
    /// REST backend against `127.0.0.1:8080`.
    fn default() -> Self {
        Self::rest("127.0.0.1", 8080)
    }
}

impl TrafficController {
    /// Create a controller over any backend.
    pub fn new(backend: Arc<dyn TcBackend>) -> Self {
        Self {
            backend,
            interface: DEFAULT_INTERFACE.to_string(),
            timeout: None,
        }
    }

    /// Controller talking to the sidecar at `host:port`.
    pub fn rest(host: &str, port: u16) -> Self {
        Self::new(Arc::new(RestBackend::from_host_port(host, port)))
    }

    /// Build the controller described by `config`.
    ///
    /// The direct backend connects to the local Docker daemon for pid lookups.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let backend: Arc<dyn TcBackend> = match config.backend {
            BackendKind::Rest => Arc::new(RestBackend::new(config.base_url())),
            BackendKind::Direct => Arc::new(DirectBackend::new(
                Arc::new(SudoExecutor::with_sudo(config.use_sudo)),
                Arc::new(DockerPidResolver::connect()?),
                ToolPaths {
                    nsenter: config.nsenter_path.clone(),
                    tc: config.tc_path.clone(),
                },
            )),
        };

        let mut controller = Self::new(backend).with_interface(&config.interface);
        controller.timeout = config.timeout();
        Ok(controller)
    }

    /// Shape `interface` when a target does not name one.
    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interface = interface.to_string();
        self
    }

    /// Bound every call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Default interface.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Per-call deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Replace whatever is installed on the target with `impairment`.
    ///
    /// The impairment is validated before anything leaves the process.
    pub async fn apply(&self, target: impl Into<Target>, impairment: Impairment) -> Result<Outcome> {
        let target = target.into();
        impairment.validate()?;
        self.run_apply("apply", &target, &impairment).await
    }

    /// Add fixed latency, with optional jitter.
    pub async fn add_latency(
        &self,
        target: impl Into<Target>,
        delay_ms: u32,
        jitter_ms: Option<u32>,
    ) -> Result<Outcome> {
        let target = target.into();
        let impairment = Impairment::latency(delay_ms, jitter_ms);
        self.run_apply("add_latency", &target, &impairment).await
    }

    /// Drop `percent` of packets independently.
    pub async fn add_packet_loss(&self, target: impl Into<Target>, percent: f64) -> Result<Outcome> {
        let target = target.into();
        let impairment = Impairment::packet_loss(percent)?;
        self.run_apply("add_packet_loss", &target, &impairment).await
    }

    /// Drop `percent` of packets in bursts; `correlation_percent` ties each
    /// decision to the previous one.
    pub async fn add_packet_loss_correlated(
        &self,
        target: impl Into<Target>,
        percent: f64,
        correlation_percent: f64,
    ) -> Result<Outcome> {
        let target = target.into();
        let impairment = Impairment::correlated_packet_loss(percent, correlation_percent)?;
        self.run_apply("add_packet_loss_correlated", &target, &impairment)
            .await
    }

    /// Cap egress rate, e.g. `"1mbit"`.
    pub async fn add_bandwidth(&self, target: impl Into<Target>, rate: &str) -> Result<Outcome> {
        let target = target.into();
        let impairment = Impairment::Bandwidth {
            rate: Rate::new(rate)?,
        };
        self.run_apply("add_bandwidth", &target, &impairment).await
    }

    /// Remove any impairment. Succeeds when nothing is installed.
    pub async fn clear(&self, target: impl Into<Target>) -> Result<Outcome> {
        let target = target.into();
        self.run_apply("clear", &target, &Impairment::Clear).await
    }

    /// Read and parse `tc -s qdisc show` for the target interface.
    pub async fn stats(&self, target: impl Into<Target>) -> Result<QdiscReport> {
        let target = target.into();
        let interface = target.interface_or(&self.interface).to_string();
        let span = tracing::info_span!("tc", operation = "stats", node = %target.node, %interface);

        let raw = self
            .bounded("stats", self.backend.stats(&target.node, &interface))
            .instrument(span)
            .await?;
        let report = QdiscReport::parse(&raw);
        tracing::debug!(node = %target.node, qdiscs = report.qdiscs.len(), "tc stats");
        Ok(report)
    }

    /// Pid whose namespace the target lives in (direct backend only).
    pub async fn resolve_pid(&self, target: impl Into<Target>) -> Result<u32> {
        let target = target.into();
        self.bounded("resolve_pid", self.backend.resolve_pid(&target.node))
            .await
    }

    async fn run_apply(
        &self,
        operation: &'static str,
        target: &Target,
        impairment: &Impairment,
    ) -> Result<Outcome> {
        let interface = target.interface_or(&self.interface);
        let span = tracing::info_span!(
            "tc",
            operation,
            node = %target.node,
            interface,
            backend = self.backend.name()
        );

        async {
            tracing::info!(%impairment, "applying");
            let result = self
                .bounded(operation, self.backend.apply(&target.node, interface, impairment))
                .await;
            match &result {
                Ok(_) => tracing::info!("applied"),
                Err(e) => tracing::warn!(error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| TcError::Timeout { operation, after })?,
            None => call.await,
        }
    }
}
