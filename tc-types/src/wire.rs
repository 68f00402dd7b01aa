//! Sidecar wire contract.
//!
//! `POST /tc/apply` carries `{"node": ..., "command": ..., "value": ...}` where
//! `command` is one of `latency`, `loss`, `bandwidth`, `clear` and `value` is the
//! command-specific object (or `null` for `clear`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Impairment, ImpairmentError, Rate};

/// Sidecar command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandName {
    /// `{"ms": .., "jitter_ms": ..}`
    Latency,
    /// `{"percent": .., "correlation_percent": ..}`
    Loss,
    /// `{"rate": ..}`
    Bandwidth,
    /// `null`
    Clear,
}

impl CommandName {
    /// The name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Latency => "latency",
            CommandName::Loss => "loss",
            CommandName::Bandwidth => "bandwidth",
            CommandName::Clear => "clear",
        }
    }
}

impl FromStr for CommandName {
    type Err = ImpairmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latency" => Ok(CommandName::Latency),
            "loss" => Ok(CommandName::Loss),
            "bandwidth" => Ok(CommandName::Bandwidth),
            "clear" => Ok(CommandName::Clear),
            other => Err(ImpairmentError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a `latency` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyValue {
    /// Delay in milliseconds.
    pub ms: u32,
    /// Jitter in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_ms: Option<u32>,
}

/// Value of a `loss` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossValue {
    /// Loss percentage.
    pub percent: f64,
    /// Correlation percentage; absent for independent loss.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_percent: Option<f64>,
}

/// Value of a `bandwidth` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthValue {
    /// Rate in `tc` notation.
    pub rate: Rate,
}

/// Body of `POST /tc/apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyRequest {
    /// Target node identifier.
    pub node: String,
    /// Command name.
    pub command: String,
    /// Command-specific value, `null` for `clear`.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl ApplyRequest {
    /// Build a request from a raw command name and value.
    pub fn raw(node: impl Into<String>, command: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            node: node.into(),
            command: command.into(),
            value,
        }
    }

    /// Build the request that applies `impairment` to `node`.
    pub fn new(node: impl Into<String>, impairment: &Impairment) -> Self {
        let value = match impairment {
            Impairment::Latency {
                delay_ms,
                jitter_ms,
            } => to_value(&LatencyValue {
                ms: *delay_ms,
                jitter_ms: *jitter_ms,
            }),
            Impairment::PacketLoss { percent } => to_value(&LossValue {
                percent: *percent,
                correlation_percent: None,
            }),
            Impairment::CorrelatedPacketLoss {
                percent,
                correlation_percent,
            } => to_value(&LossValue {
                percent: *percent,
                correlation_percent: Some(*correlation_percent),
            }),
            Impairment::Bandwidth { rate } => to_value(&BandwidthValue { rate: rate.clone() }),
            Impairment::Clear => serde_json::Value::Null,
        };

        Self::raw(node, impairment.command().as_str(), value)
    }

    /// Parse the command name.
    pub fn command_name(&self) -> Result<CommandName, ImpairmentError> {
        self.command.parse()
    }

    /// Decode the request into a validated impairment.
    pub fn impairment(&self) -> Result<Impairment, ImpairmentError> {
        let impairment = match self.command_name()? {
            CommandName::Clear => Impairment::Clear,
            CommandName::Latency => {
                let value: LatencyValue = self.decode_value(CommandName::Latency)?;
                Impairment::latency(value.ms, value.jitter_ms)
            }
            CommandName::Loss => {
                let value: LossValue = self.decode_value(CommandName::Loss)?;
                match value.correlation_percent {
                    Some(correlation_percent) => Impairment::CorrelatedPacketLoss {
                        percent: value.percent,
                        correlation_percent,
                    },
                    None => Impairment::PacketLoss {
                        percent: value.percent,
                    },
                }
            }
            CommandName::Bandwidth => {
                let value: BandwidthValue = self.decode_value(CommandName::Bandwidth)?;
                Impairment::Bandwidth { rate: value.rate }
            }
        };

        impairment.validate()?;
        Ok(impairment)
    }

    fn decode_value<T: DeserializeOwned>(&self, command: CommandName) -> Result<T, ImpairmentError> {
        if self.value.is_null() {
            return Err(ImpairmentError::MissingValue(command.as_str()));
        }
        serde_json::from_value(self.value.clone()).map_err(|e| ImpairmentError::InvalidValue {
            command: command.as_str(),
            reason: e.to_string(),
        })
    }
}

fn to_value<T: Serialize>(value: &T) -> serde_json::Value {
    // Plain structs of numbers and strings always serialize.
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Successful body of `POST /tc/apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResponse {
    /// Always `ok`.
    pub status: String,
    /// Target node identifier.
    pub node: String,
    /// Command name as received.
    pub command: String,
    /// Command lines the sidecar ran, in order.
    #[serde(default)]
    pub commands: Vec<String>,
}

impl ApplyResponse {
    /// A successful response.
    pub fn ok(node: impl Into<String>, command: impl Into<String>, commands: Vec<String>) -> Self {
        Self {
            status: "ok".to_string(),
            node: node.into(),
            command: command.into(),
            commands,
        }
    }
}

/// Body of `GET /tc/stats/{node}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Target node identifier.
    pub node: String,
    /// Interface the statistics were read from.
    pub interface: String,
    /// Raw `tc -s qdisc show` output.
    pub stats: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Sidecar version.
    pub version: String,
}
