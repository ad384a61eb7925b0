//! Keepsake Viewer (keepsake-viewer) - Main entry point
//!
//! HTTP service that plays back proposal journeys: each session runs a
//! server-side phase sequencer and streams its state to the browser over SSE.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keepsake_viewer::{api, config, db, engine::ViewerEngine};

/// Command-line arguments for keepsake-viewer
#[derive(Parser, Debug)]
#[command(name = "keepsake-viewer")]
#[command(about = "Playback service for Keepsake proposal journeys")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5870", env = "KEEPSAKE_PORT")]
    port: u16,

    /// Path to the journeys database (overrides config file)
    #[arg(short, long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keepsake_viewer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting Keepsake Viewer on port {}", args.port);

    let db_path = config::resolve_db_path(args.database.as_deref())
        .context("Failed to resolve database path")?;
    info!("Database: {}", db_path.display());

    let pool = db::init::open_db(&db_path)
        .await
        .context("Failed to open journeys database")?;

    let timing = db::settings::load_timing(&pool)
        .await
        .context("Failed to load timing settings")?;

    let engine = ViewerEngine::new(pool, timing);
    engine.clone().spawn_prune_loop();
    info!("Viewer engine initialized");

    // Build the application router
    let app = api::create_router(api::AppContext { engine });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
