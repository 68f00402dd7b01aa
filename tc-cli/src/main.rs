//! # waku-tc
//!
//! Apply and remove network impairments on waku test nodes from the shell.
//!
//! ## Commands
//!
//! - `latency`: Add fixed delay (and jitter)
//! - `loss`: Drop a share of packets, optionally in bursts
//! - `bandwidth`: Cap the egress rate
//! - `clear`: Remove any impairment
//! - `stats`: Show queueing discipline counters
//! - `pid`: Show the pid whose namespace is shaped (direct backend)
//!
//! ## Example
//!
//! ```bash
//! # Through the sidecar on localhost:8080
//! waku-tc latency node2 --ms 500
//! waku-tc loss node2 --percent 40 --correlation 75
//! waku-tc clear node2
//!
//! # Directly, as root on the container host
//! waku-tc --backend direct --interface eth0 bandwidth node2 --rate 1mbit
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tc_core::BackendKind;

mod commands;
mod config;

/// Traffic-control fault injection for waku test nodes.
#[derive(Parser, Debug)]
#[command(name = "waku-tc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/waku-tc/tc.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend: rest (sidecar) or direct (nsenter + tc)
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Sidecar host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Sidecar port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Interface to shape
    #[arg(long, global = true)]
    interface: Option<String>,

    /// Per-call deadline in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add fixed latency
    Latency {
        /// Node (container id or name)
        node: String,

        /// Delay in milliseconds
        #[arg(long)]
        ms: u32,

        /// Jitter in milliseconds
        #[arg(long)]
        jitter_ms: Option<u32>,
    },

    /// Drop packets
    Loss {
        /// Node (container id or name)
        node: String,

        /// Loss percentage (0-100)
        #[arg(long)]
        percent: f64,

        /// Correlation percentage (0-100) for bursty loss
        #[arg(long)]
        correlation: Option<f64>,
    },

    /// Cap egress bandwidth
    Bandwidth {
        /// Node (container id or name)
        node: String,

        /// Rate in tc notation, e.g. 1mbit or 512kbit
        #[arg(long)]
        rate: String,
    },

    /// Remove any impairment
    Clear {
        /// Node (container id or name)
        node: String,
    },

    /// Show queueing discipline statistics
    Stats {
        /// Node (container id or name)
        node: String,
    },

    /// Show the pid whose network namespace is shaped
    Pid {
        /// Node (container id or name)
        node: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let overrides = config::Overrides {
        backend: cli.backend,
        host: cli.host,
        port: cli.port,
        interface: cli.interface,
        timeout_secs: cli.timeout_secs,
    };
    let config = config::resolve(cli.config.as_deref(), overrides)?;
    tracing::debug!(
        backend = %config.backend.as_str(),
        host = %config.host,
        port = config.port,
        interface = %config.interface,
        timeout_secs = ?config.timeout_secs,
        "resolved configuration"
    );

    let output = match cli.command {
        Commands::Latency {
            node,
            ms,
            jitter_ms,
        } => commands::latency(&config, &node, ms, jitter_ms).await?,
        Commands::Loss {
            node,
            percent,
            correlation,
        } => commands::loss(&config, &node, percent, correlation).await?,
        Commands::Bandwidth { node, rate } => commands::bandwidth(&config, &node, &rate).await?,
        Commands::Clear { node } => commands::clear(&config, &node).await?,
        Commands::Stats { node } => commands::stats(&config, &node).await?,
        Commands::Pid { node } => commands::pid(&config, &node).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
