//! Rendezvous Daemon - registration broker
//!
//! Runs in the foreground, handing each known client its rendezvous
//! address exactly once.
//!
//! # Usage
//!
//! ```bash
//! # Serve the built-in client table on the default socket
//! rdvd
//!
//! # Use a config file and/or a different socket
//! rdvd --config /etc/rdvd.toml --socket /run/rdvd.sock
//!
//! # Enable debug logging
//! RUST_LOG=rdvd=debug rdvd
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: stop accepting and remove the socket file

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rdvd::config::DaemonConfig;
use rdvd::manager::RegistrationManager;

/// Rendezvous daemon - hands known clients their socket addresses
#[derive(Parser, Debug)]
#[command(name = "rdvd", version, about)]
struct Args {
    /// TOML config file (client table, socket path, timeouts)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registration socket path, overrides the config file
    #[arg(short, long)]
    socket: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(socket) = args.socket {
        config.socket_path = socket;
    }

    run_daemon(config)
}

/// Directives used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "rdvd=info,rdv_protocol=info";

/// Builds the log filter; `RUST_LOG` replaces the defaults entirely.
fn log_filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid RUST_LOG directives: {directives}")),
        _ => Ok(EnvFilter::new(DEFAULT_LOG_FILTER)),
    }
}

/// Runs the daemon on a single-threaded event loop.
#[tokio::main(flavor = "current_thread")]
async fn run_daemon(config: DaemonConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env::var("RUST_LOG").ok().as_deref())?)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        socket = %config.socket_path.display(),
        known_clients = config.clients.len(),
        "Rendezvous daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let manager = RegistrationManager::new(config, cancel_token);

    if let Err(e) = manager.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Rendezvous daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
