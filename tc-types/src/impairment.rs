//! Declarative network impairments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::wire::CommandName;
use crate::{ImpairmentError, Rate};

/// Upper bound for loss and correlation percentages.
pub const MAX_PERCENT: f64 = 100.0;

/// A network condition to apply to a target interface.
///
/// Applying any impairment replaces whatever was active before; impairments never
/// stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Impairment {
    /// Fixed delay with optional uniform jitter.
    Latency {
        /// Delay in milliseconds.
        delay_ms: u32,
        /// Jitter in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        jitter_ms: Option<u32>,
    },
    /// Independent random loss.
    PacketLoss {
        /// Loss probability, 0-100.
        percent: f64,
    },
    /// Bursty loss: each packet's loss state leans towards the previous packet's.
    CorrelatedPacketLoss {
        /// Loss probability, 0-100.
        percent: f64,
        /// Correlation with the previous packet, 0-100.
        correlation_percent: f64,
    },
    /// Token-bucket rate limit.
    Bandwidth {
        /// Rate in `tc` notation.
        rate: Rate,
    },
    /// Remove every impairment.
    Clear,
}

fn check_percent(field: &'static str, value: f64) -> Result<(), ImpairmentError> {
    if value.is_finite() && (0.0..=MAX_PERCENT).contains(&value) {
        Ok(())
    } else {
        Err(ImpairmentError::InvalidPercent { field, value })
    }
}

impl Impairment {
    /// Latency impairment.
    pub fn latency(delay_ms: u32, jitter_ms: Option<u32>) -> Self {
        Self::Latency {
            delay_ms,
            jitter_ms,
        }
    }

    /// Uncorrelated loss impairment.
    pub fn packet_loss(percent: f64) -> Result<Self, ImpairmentError> {
        let impairment = Self::PacketLoss { percent };
        impairment.validate()?;
        Ok(impairment)
    }

    /// Correlated loss impairment.
    pub fn correlated_packet_loss(
        percent: f64,
        correlation_percent: f64,
    ) -> Result<Self, ImpairmentError> {
        let impairment = Self::CorrelatedPacketLoss {
            percent,
            correlation_percent,
        };
        impairment.validate()?;
        Ok(impairment)
    }

    /// Bandwidth impairment from a rate string.
    pub fn bandwidth(rate: &str) -> Result<Self, ImpairmentError> {
        Ok(Self::Bandwidth {
            rate: Rate::new(rate)?,
        })
    }

    /// Check parameter ranges.
    ///
    /// Struct literals bypass the constructors, so the controller calls this before
    /// issuing anything.
    pub fn validate(&self) -> Result<(), ImpairmentError> {
        match self {
            Self::PacketLoss { percent } => check_percent("percent", *percent),
            Self::CorrelatedPacketLoss {
                percent,
                correlation_percent,
            } => {
                check_percent("percent", *percent)?;
                check_percent("correlation_percent", *correlation_percent)
            }
            Self::Latency { .. } | Self::Bandwidth { .. } | Self::Clear => Ok(()),
        }
    }

    /// The sidecar command this impairment is sent as.
    pub fn command(&self) -> CommandName {
        match self {
            Self::Latency { .. } => CommandName::Latency,
            Self::PacketLoss { .. } | Self::CorrelatedPacketLoss { .. } => CommandName::Loss,
            Self::Bandwidth { .. } => CommandName::Bandwidth,
            Self::Clear => CommandName::Clear,
        }
    }

    /// Returns true for [`Impairment::Clear`].
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }
}

impl fmt::Display for Impairment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latency {
                delay_ms,
                jitter_ms: Some(jitter),
            } => write!(f, "latency {delay_ms}ms ±{jitter}ms"),
            Self::Latency { delay_ms, .. } => write!(f, "latency {delay_ms}ms"),
            Self::PacketLoss { percent } => write!(f, "loss {percent}%"),
            Self::CorrelatedPacketLoss {
                percent,
                correlation_percent,
            } => write!(f, "loss {percent}% correlation {correlation_percent}%"),
            Self::Bandwidth { rate } => write!(f, "bandwidth {rate}"),
            Self::Clear => f.write_str("clear"),
        }
    }
}
