//! # tc-sidecar
//!
//! Privileged HTTP service that applies traffic-control impairments on behalf of
//! test harnesses that cannot enter container namespaces themselves.
//!
//! Runs next to the node containers (host pid namespace, `CAP_NET_ADMIN`) and
//! serves the `POST /tc/apply` contract the REST backend of `tc-core` speaks.
//!
//! ## Example
//!
//! ```ignore
//! use tc_sidecar::{build_router, Config, TcSidecar};
//!
//! let config = Config::from_file("sidecar.toml".as_ref())?;
//! let app = build_router(Arc::new(TcSidecar::from_config(&config)?));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod server;

pub use config::{Config, ServerConfig};
pub use error::SidecarError;
pub use http::build_router;
pub use server::TcSidecar;
