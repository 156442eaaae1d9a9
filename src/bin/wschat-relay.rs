//! wschat relay - local stand-in for the hosted chat backend
//!
//! Accepts WebSocket clients, tells each sender its connection id, and
//! broadcasts every `send_message` request to all connected clients.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address (127.0.0.1:9001)
//! wschat-relay
//!
//! # Listen on all interfaces, capped at 50 clients
//! wschat-relay --bind 0.0.0.0:9001 --max-connections 50
//! ```

use std::net::SocketAddr;
use std::process;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wschat_relay::registry::{spawn_registry_with_capacity, MAX_CONNECTIONS};
use wschat_relay::server::{RelayServer, DEFAULT_BIND_ADDR};

/// wschat relay - development chat backend
#[derive(Parser, Debug)]
#[command(name = "wschat-relay", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, short = 'b', env = "WSCHAT_RELAY_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Maximum number of simultaneous clients
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("wschat_relay=info".parse()?)
                .add_directive("wschat_protocol=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "wschat relay starting"
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

    let registry = spawn_registry_with_capacity(args.max_connections);
    info!(max_connections = args.max_connections, "Connection registry started");

    let server = RelayServer::bind(args.bind, registry, cancel_token).await?;

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("wschat relay stopped");
    Ok(())
}

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
