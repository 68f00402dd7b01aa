//! Validation errors for impairments and sidecar requests.

use thiserror::Error;

/// Errors raised while building or decoding an [`Impairment`](crate::Impairment).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImpairmentError {
    /// A percentage was outside `[0, 100]` or not finite.
    #[error("invalid {field}: {value} (expected 0-100)")]
    InvalidPercent {
        /// Which parameter was rejected.
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// A bandwidth rate could not be parsed.
    #[error("invalid rate {0:?} (expected e.g. 1mbit, 512kbit, 100kbps)")]
    InvalidRate(String),

    /// The command requires a value but none was sent.
    #[error("command {0} requires a value")]
    MissingValue(&'static str),

    /// The value did not match the command's expected shape.
    #[error("invalid value for {command}: {reason}")]
    InvalidValue {
        /// The command the value was sent with.
        command: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// Command name not recognized.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}
