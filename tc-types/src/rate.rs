//! Bandwidth rates in `tc` notation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ImpairmentError;

/// Unit suffixes understood by `tc`, with their multiplier in bits per second.
///
/// Longer suffixes come first so `kbit` is not matched as `bit`.
const UNITS: &[(&str, f64)] = &[
    ("kibit", 1024.0),
    ("mibit", 1024.0 * 1024.0),
    ("gibit", 1024.0 * 1024.0 * 1024.0),
    ("tibit", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("kibps", 8.0 * 1024.0),
    ("mibps", 8.0 * 1024.0 * 1024.0),
    ("gibps", 8.0 * 1024.0 * 1024.0 * 1024.0),
    ("tibps", 8.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("kbit", 1e3),
    ("mbit", 1e6),
    ("gbit", 1e9),
    ("tbit", 1e12),
    ("kbps", 8e3),
    ("mbps", 8e6),
    ("gbps", 8e9),
    ("tbps", 8e12),
    ("bit", 1.0),
    ("bps", 8.0),
];

/// A bandwidth rate such as `1mbit` or `512kbit`.
///
/// Stored lowercased exactly as it is passed to `tc`. Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rate(String);

impl Rate {
    /// Parse and validate a rate.
    pub fn new(rate: &str) -> Result<Self, ImpairmentError> {
        rate.parse()
    }

    /// The rate as passed on the `tc` command line.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The rate converted to bits per second.
    pub fn bits_per_second(&self) -> f64 {
        // Validated on construction, so both lookups succeed.
        let (number, unit) = split(&self.0).unwrap_or((0.0, 1.0));
        number * unit
    }
}

fn split(rate: &str) -> Option<(f64, f64)> {
    let (suffix, multiplier) = UNITS.iter().find(|(suffix, _)| rate.ends_with(suffix))?;
    let number = &rate[..rate.len() - suffix.len()];
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value: f64 = number.parse().ok()?;
    (value.is_finite() && value > 0.0).then_some((value, *multiplier))
}

impl FromStr for Rate {
    type Err = ImpairmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match split(&normalized) {
            Some(_) => Ok(Self(normalized)),
            None => Err(ImpairmentError::InvalidRate(s.to_string())),
        }
    }
}

impl TryFrom<String> for Rate {
    type Error = ImpairmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rate> for String {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
