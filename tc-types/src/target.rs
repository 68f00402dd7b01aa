//! Shaping targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interface used when neither the target nor the configuration names one.
pub const DEFAULT_INTERFACE: &str = "eth0";

/// The node whose traffic is shaped, and optionally the interface to shape.
///
/// `node` is opaque: a container id, a container name or a hostname, depending on
/// the backend. When `interface` is `None` the controller's configured interface
/// is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Container id, container name or hostname.
    pub node: String,
    /// Interface override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

impl Target {
    /// Target `node` on the configured interface.
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            interface: None,
        }
    }

    /// Target a specific interface.
    pub fn interface(mut self, iface: impl Into<String>) -> Self {
        self.interface = Some(iface.into());
        self
    }

    /// The interface to shape, given the configured fallback.
    pub fn interface_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.interface.as_deref().unwrap_or(fallback)
    }
}

impl From<&str> for Target {
    fn from(node: &str) -> Self {
        Self::new(node)
    }
}

impl From<String> for Target {
    fn from(node: String) -> Self {
        Self::new(node)
    }
}

impl From<&String> for Target {
    fn from(node: &String) -> Self {
        Self::new(node.clone())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.interface {
            Some(iface) => write!(f, "{}/{}", self.node, iface),
            None => f.write_str(&self.node),
        }
    }
}
