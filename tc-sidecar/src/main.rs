//! tc-sidecar binary entry point.
//!
//! Usage:
//! ```bash
//! tc-sidecar --config sidecar.toml
//! tc-sidecar --bind 0.0.0.0:8080 --interface eth0
//! RUST_LOG=tc_core=debug tc-sidecar
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tc_sidecar::{build_router, Config, TcSidecar};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Traffic-control sidecar for waku test topologies.
#[derive(Parser, Debug)]
#[command(name = "tc-sidecar")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the interface shaped by default
    #[arg(long)]
    interface: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(interface) = args.interface {
        config.controller.interface = interface;
    }

    let sidecar = TcSidecar::from_config(&config).context("Failed to build controller")?;
    tracing::info!(
        interface = %sidecar.controller().interface(),
        timeout = ?sidecar.controller().timeout(),
        use_sudo = config.controller.use_sudo,
        "tc-sidecar v{}",
        env!("CARGO_PKG_VERSION")
    );

    let app = build_router(Arc::new(sidecar));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    tracing::info!(listen_addr = %config.server.bind_address, "tc-sidecar listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
            }
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
