// Manhattan Sales Heat Map - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;

use heatmap::{router, AppState, Config, Store};

/// Serve the Manhattan sales heat map
#[derive(Debug, Parser)]
#[command(name = "heatmap-server", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database holding the ManhattanSales table
    #[arg(long)]
    database: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if let Some(addr) = cli.addr {
        config.server.addr = addr;
    }

    config.logging.init();

    if !config.database.path.exists() {
        // Requests will answer 500 until the data is provisioned
        tracing::warn!(path = %config.database.path.display(), "database not found");
    }

    let state = AppState::new(Store::new(config.database.path.clone()));
    let mut app = router(state, &config.server.static_dir);
    if config.server.cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind(config.server.addr)
        .await
        .with_context(|| format!("binding to {}", config.server.addr))?;

    tracing::info!(
        addr = %config.server.addr,
        database = %config.database.path.display(),
        "heat map server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
