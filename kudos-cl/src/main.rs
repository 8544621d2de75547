//! Classifier (kudos-cl) - Main entry point
//!
//! Bus-driven middle stage of the feedback pipeline: consumes
//! `feedback-created` deliveries, calls the sentiment provider, writes the
//! result back to the record store, and publishes `feedback-classified`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kudos_cl::sentiment::LanguageClient;
use kudos_cl::{build_router, AppState};
use kudos_common::bus::HttpEventBus;
use kudos_common::config::{self, ConfigFile};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kudos-cl
#[derive(Parser, Debug)]
#[command(name = "kudos-cl")]
#[command(about = "Sentiment classifier service for the kudos pipeline")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "KUDOS_CL_PORT")]
    port: u16,

    /// Record store database path
    #[arg(short, long)]
    database: Option<String>,

    /// Event bus base URL
    #[arg(short, long)]
    bus_url: Option<String>,

    /// Sentiment provider base URL
    #[arg(short, long)]
    sentiment_url: Option<String>,

    /// Sentiment provider API key
    #[arg(long)]
    sentiment_api_key: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kudos_cl=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting kudos-cl v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let file = ConfigFile::load(args.config.as_deref()).context("Failed to load config file")?;
    let db_path = config::resolve(
        args.database,
        "KUDOS_DATABASE",
        &file,
        "store",
        "path",
        "kudos.db",
    );
    let bus_url = config::resolve(
        args.bus_url,
        "KUDOS_BUS_URL",
        &file,
        "bus",
        "url",
        "http://localhost:8085",
    );
    let sentiment_url = config::resolve(
        args.sentiment_url,
        "KUDOS_SENTIMENT_URL",
        &file,
        "sentiment",
        "url",
        "https://language.googleapis.com",
    );
    let api_key = args
        .sentiment_api_key
        .or_else(|| std::env::var("KUDOS_SENTIMENT_API_KEY").ok())
        .or_else(|| file.get("sentiment", "api_key"));

    let db = kudos_common::db::init_database(db_path.as_ref())
        .await
        .context("Failed to initialize record store")?;
    info!("Record store ready at {}", db_path);

    let bus = Arc::new(HttpEventBus::new(bus_url.clone()));
    info!("Publishing to event bus at {}", bus_url);

    let analyzer = Arc::new(LanguageClient::new(sentiment_url.clone(), api_key));
    info!("Sentiment provider at {}", sentiment_url);

    let app = build_router(AppState::new(db, bus, analyzer));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on {}", addr);

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
