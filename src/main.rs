//! AR glasses storefront API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     SPECTRA API                      │
//!                 │                                                      │
//!   Request ──────┼─▶ request-id ─▶ trace ─▶ timeout ─▶ CSRF guard ──┐   │
//!                 │                                                  │   │
//!                 │                       ┌──────────────────────────┘   │
//!                 │                       ▼                              │
//!                 │              per-route rate limiter                  │
//!                 │          (api / search / compare stores)             │
//!                 │                       │                              │
//!                 │                       ▼                              │
//!   Response ◀────┼──── X-RateLimit-* ◀── handler ◀── catalog            │
//!                 │                                                      │
//!                 │   background: limiter sweepers, metrics exporter     │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use spectra_api::config::{load_config, ServerConfig};
use spectra_api::lifecycle::{wait_for_signal, Shutdown};
use spectra_api::observability::{logging, metrics};
use spectra_api::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "spectra-api")]
#[command(about = "Product API for the AR glasses comparison site")]
struct Args {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("spectra-api v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        csrf_enabled = config.csrf.enabled,
        secure_cookies = config.csrf.secure_cookies,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
