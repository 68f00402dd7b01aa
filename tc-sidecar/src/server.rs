//! Shared sidecar state.

use dashmap::DashMap;
use std::sync::Arc;
use tc_core::TrafficController;
use tc_types::{ApplyRequest, ApplyResponse, StatsResponse, Target};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::SidecarError;

/// Applies decoded requests through a controller, one request per node at a time.
///
/// Requests for different nodes run concurrently. Requests for the same node
/// queue on that node's lock so a clear-then-install is never interleaved with
/// another one.
pub struct TcSidecar {
    controller: TrafficController,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TcSidecar {
    /// Create a sidecar over an already-built controller.
    pub fn new(controller: TrafficController) -> Self {
        Self {
            controller,
            locks: DashMap::new(),
        }
    }

    /// Build the direct-backend controller described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, SidecarError> {
        let controller = TrafficController::from_config(&config.direct_controller())?;
        Ok(Self::new(controller))
    }

    /// The controller requests go through.
    pub fn controller(&self) -> &TrafficController {
        &self.controller
    }

    /// Number of nodes with a live lock entry.
    ///
    /// Nodes that turn out not to be running are forgotten again, so this is
    /// bounded by the nodes that exist in the topology.
    pub fn known_nodes(&self) -> usize {
        self.locks.len()
    }

    fn lock_for(&self, node: &str) -> Arc<Mutex<()>> {
        self.locks.entry(node.to_string()).or_default().value().clone()
    }

    /// Drop the lock of a node that is not running, unless another request holds a clone.
    fn forget_if_not_running<T>(&self, node: &str, result: &tc_core::Result<T>) {
        if matches!(result, Err(e) if e.is_not_running()) {
            // One reference in the map, one held by the caller.
            self.locks.remove_if(node, |_, lock| Arc::strong_count(lock) <= 2);
        }
    }

    /// Validate and apply one `POST /tc/apply` request.
    pub async fn apply(&self, request: &ApplyRequest) -> Result<ApplyResponse, SidecarError> {
        if request.node.trim().is_empty() {
            return Err(SidecarError::InvalidRequest("node must not be empty".into()));
        }
        let impairment = request.impairment()?;

        let lock = self.lock_for(&request.node);
        let guard = lock.lock().await;
        let result = self
            .controller
            .apply(Target::new(&request.node), impairment)
            .await;
        drop(guard);
        self.forget_if_not_running(&request.node, &result);
        let outcome = result?;

        Ok(ApplyResponse::ok(
            &request.node,
            &request.command,
            outcome.commands(),
        ))
    }

    /// Read raw statistics for `node`.
    pub async fn stats(
        &self,
        node: &str,
        interface: Option<&str>,
    ) -> Result<StatsResponse, SidecarError> {
        let interface = interface.unwrap_or(self.controller.interface()).to_string();
        let target = Target::new(node).interface(&interface);

        let lock = self.lock_for(node);
        let guard = lock.lock().await;
        let result = self.controller.stats(target).await;
        drop(guard);
        self.forget_if_not_running(node, &result);
        let report = result?;
        Ok(StatsResponse {
            node: node.to_string(),
            interface,
            stats: report.raw,
        })
    }
}
