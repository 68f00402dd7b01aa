//! # tc-core
//!
//! Network fault injection for waku node test harnesses.
//!
//! Installs Linux `tc` queueing disciplines (`netem` for latency and loss, `tbf`
//! for bandwidth) on a node's interface, either through a privileged sidecar or
//! by entering the node's network namespace directly.
//!
//! ## Features
//!
//! - **One facade**: [`TrafficController`] over two interchangeable backends
//! - **Replace semantics**: every install clears the root discipline first
//! - **Injected privilege**: commands run through a [`PrivilegedExecutor`]
//! - **Typed failures**: not running, transport, command and timeout errors
//!
//! ## Example
//!
//! ```ignore
//! use tc_core::{Config, TrafficController};
//!
//! let tc = TrafficController::from_config(&Config::default())?;
//! tc.add_latency("node2", 500, None).await?;
//! tc.clear("node2").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod pid;
pub mod qdisc;
pub mod stats;

pub use backend::{DirectBackend, Outcome, RestBackend, TcBackend, ToolPaths};
pub use config::{BackendKind, Config, ConfigError};
pub use controller::TrafficController;
pub use error::{Result, TcError};
pub use executor::{ExecOutput, MockExecutor, PrivilegedExecutor, SudoExecutor};
pub use pid::{DockerPidResolver, PidResolver, StaticPidResolver};
pub use qdisc::{NothingToClear, QdiscConfig};
pub use stats::{QdiscReport, QdiscStats};
pub use tc_types::{Impairment, ImpairmentError, Rate, Target};
