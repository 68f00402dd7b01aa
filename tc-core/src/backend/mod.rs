//! Traffic-control backends.
//!
//! One capability, two ways of reaching the kernel:
//! - [`RestBackend`] posts commands to a privileged sidecar over HTTP
//! - [`DirectBackend`] enters the target's network namespace with `nsenter`
//!   and runs `tc` itself
//!
//! # Design
//!
//! Backends are stateless with respect to impairments: nothing remembers what
//! is currently installed. Every install is clear-then-add, so the kernel is the
//! only source of truth.
//!
//! # Example
//!
//! ```ignore
//! let backend = DirectBackend::new(executor, resolver, ToolPaths::default());
//! backend.apply("node2", "eth0", &Impairment::latency(500, None)).await?;
//! ```

mod direct;
mod rest;

pub use direct::{DirectBackend, ToolPaths};
pub use rest::RestBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tc_types::Impairment;

use crate::error::Result;

/// What a backend reports after applying an impairment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", content = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// Decoded sidecar response.
    Remote(serde_json::Value),
    /// Command lines issued, in order.
    Local {
        /// Each command as it was run.
        commands: Vec<String>,
    },
}

impl Outcome {
    /// Command lines issued, if known.
    ///
    /// The sidecar reports its command lines under `commands`; a response
    /// without them yields an empty list.
    pub fn commands(&self) -> Vec<String> {
        match self {
            Outcome::Local { commands } => commands.clone(),
            Outcome::Remote(value) => value
                .get("commands")
                .and_then(|c| c.as_array())
                .map(|c| {
                    c.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// A way of installing and removing root disciplines on a node.
#[async_trait]
pub trait TcBackend: Send + Sync {
    /// Short backend name for logs and errors.
    fn name(&self) -> &'static str;

    /// Replace whatever is installed on `interface` of `node` with `impairment`.
    ///
    /// [`Impairment::Clear`] only removes.
    async fn apply(&self, node: &str, interface: &str, impairment: &Impairment) -> Result<Outcome>;

    /// Raw `tc -s qdisc show` output for `interface` of `node`.
    async fn stats(&self, node: &str, interface: &str) -> Result<String>;

    /// The pid whose network namespace `node` lives in.
    async fn resolve_pid(&self, node: &str) -> Result<u32>;
}
