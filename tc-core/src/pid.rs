//! Resolving a target to the pid whose network namespace is entered.

use async_trait::async_trait;
use bollard::container::InspectContainerOptions;
use bollard::errors::Error as DockerError;
use bollard::Docker;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Result, TcError};

/// Maps a node identifier to a live process id.
///
/// Resolution happens on every call; pids are never cached because a restarted
/// container gets a new one.
#[async_trait]
pub trait PidResolver: Send + Sync {
    /// Resolve `node` to a pid, or fail with [`TcError::NotRunning`].
    async fn resolve_pid(&self, node: &str) -> Result<u32>;
}

/// Resolves container ids or names through the Docker API.
#[derive(Debug, Clone)]
pub struct DockerPidResolver {
    docker: Docker,
}

impl DockerPidResolver {
    /// Connect using the local Docker socket defaults.
    pub fn connect() -> Result<Self> {
        Ok(Self {
            docker: Docker::connect_with_local_defaults()?,
        })
    }

    /// Use an existing client.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl PidResolver for DockerPidResolver {
    async fn resolve_pid(&self, node: &str) -> Result<u32> {
        let inspect = match self
            .docker
            .inspect_container(node, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => inspect,
            Err(DockerError::DockerResponseServerError {
                status_code: 404,
                message,
            }) => {
                return Err(TcError::NotRunning {
                    target: node.to_string(),
                    reason: message,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let state = inspect.state.unwrap_or_default();
        let running = state.running.unwrap_or(false);
        let pid = state.pid.unwrap_or(0);
        tracing::debug!(node, running, pid, "inspected container");

        check_pid(node, running, pid)
    }
}

fn check_pid(node: &str, running: bool, pid: i64) -> Result<u32> {
    if !running {
        return Err(TcError::NotRunning {
            target: node.to_string(),
            reason: "container is not running".into(),
        });
    }
    match u32::try_from(pid) {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(TcError::NotRunning {
            target: node.to_string(),
            reason: format!("container reports pid {pid}"),
        }),
    }
}

/// Fixed node-to-pid table, for host processes and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPidResolver {
    pids: Arc<RwLock<HashMap<String, u32>>>,
}

impl StaticPidResolver {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a pid. A pid of 0 marks the node as not started.
    pub fn insert(&self, node: &str, pid: u32) {
        let mut pids = self.pids.write().unwrap_or_else(|e| e.into_inner());
        pids.insert(node.to_string(), pid);
    }

    /// Forget a node.
    pub fn remove(&self, node: &str) {
        let mut pids = self.pids.write().unwrap_or_else(|e| e.into_inner());
        pids.remove(node);
    }

    /// Builder-style insert.
    pub fn with(self, node: &str, pid: u32) -> Self {
        self.insert(node, pid);
        self
    }
}

#[async_trait]
impl PidResolver for StaticPidResolver {
    async fn resolve_pid(&self, node: &str) -> Result<u32> {
        let pid = {
            let pids = self.pids.read().unwrap_or_else(|e| e.into_inner());
            pids.get(node).copied()
        };

        match pid {
            Some(pid) => check_pid(node, true, pid.into()),
            None => Err(TcError::NotRunning {
                target: node.to_string(),
                reason: "no such process".into(),
            }),
        }
    }
}
