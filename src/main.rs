//! Edge redirect interceptor.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                     EDGE INTERCEPTOR                      │
//!   Client        │  ┌────────┐   ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!   ──────────────┼─▶│  http  │──▶│ access │──▶│  source  │──▶│ processor │  │
//!                 │  │ server │   │control │   │ (rules)  │   │ pipeline  │  │
//!                 │  └────────┘   └───┬────┘   └──────────┘   └─────┬─────┘  │
//!                 │                   │ 401/418                     │         │
//!   ◀─────────────┼───────────────────┴──── 3xx redirect ◀──────────┤         │
//!                 │                                                 │ forward │
//!                 │                                    ┌────────────▼──────┐  │
//!   ◀─────────────┼────────────────────────────────────│  origin client   │──┼──▶ Origin
//!                 │                                    └───────────────────┘  │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use edge_redirect::config::{load_config, watcher::ConfigWatcher, EdgeConfig};
use edge_redirect::observability::{logging, metrics};
use edge_redirect::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-redirect")]
#[command(about = "Edge request interceptor with redirect rules", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration when the file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };

    logging::init(&config.observability.log_level);

    tracing::info!("edge-redirect v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        redirect_enabled = config.redirect.enabled,
        rules_url = ?config.redirect.rules_url,
        cache_ttl_ms = ?config.redirect.cache_ttl_ms,
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

    // The watcher must outlive the server.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
