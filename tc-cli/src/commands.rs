//! Command implementations.
//!
//! Arguments are validated before a controller is built, so a bad value never
//! reaches the sidecar or spawns a process.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tc_core::{Config, Outcome, TrafficController};
use tc_types::{Impairment, Rate};

fn controller(config: &Config) -> Result<TrafficController> {
    TrafficController::from_config(config).context("Failed to set up traffic controller")
}

async fn apply(config: &Config, node: &str, impairment: Impairment) -> Result<Value> {
    let outcome: Outcome = controller(config)?
        .apply(node, impairment)
        .await
        .with_context(|| format!("Failed to shape {node}"))?;
    Ok(serde_json::to_value(outcome)?)
}

/// `waku-tc latency`.
pub async fn latency(config: &Config, node: &str, ms: u32, jitter_ms: Option<u32>) -> Result<Value> {
    apply(config, node, Impairment::latency(ms, jitter_ms)).await
}

/// `waku-tc loss`.
pub async fn loss(
    config: &Config,
    node: &str,
    percent: f64,
    correlation: Option<f64>,
) -> Result<Value> {
    let impairment = match correlation {
        Some(correlation) => Impairment::correlated_packet_loss(percent, correlation)?,
        None => Impairment::packet_loss(percent)?,
    };
    apply(config, node, impairment).await
}

/// `waku-tc bandwidth`.
pub async fn bandwidth(config: &Config, node: &str, rate: &str) -> Result<Value> {
    let rate = Rate::new(rate)?;
    apply(config, node, Impairment::Bandwidth { rate }).await
}

/// `waku-tc clear`.
pub async fn clear(config: &Config, node: &str) -> Result<Value> {
    apply(config, node, Impairment::Clear).await
}

/// `waku-tc stats`.
pub async fn stats(config: &Config, node: &str) -> Result<Value> {
    let report = controller(config)?
        .stats(node)
        .await
        .with_context(|| format!("Failed to read stats for {node}"))?;
    Ok(serde_json::to_value(report)?)
}

/// `waku-tc pid`.
pub async fn pid(config: &Config, node: &str) -> Result<Value> {
    let pid = controller(config)?
        .resolve_pid(node)
        .await
        .with_context(|| format!("Failed to resolve {node}"))?;
    Ok(json!({ "node": node, "pid": pid }))
}
