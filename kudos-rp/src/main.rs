//! Reporter (kudos-rp) - Main entry point
//!
//! Bus-driven final stage of the feedback pipeline: consumes
//! `feedback-classified` deliveries and appends each record to the
//! configured report spreadsheet.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use kudos_common::config::{self, ConfigFile};
use kudos_rp::auth::TokenProvider;
use kudos_rp::sheets::SheetsClient;
use kudos_rp::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kudos-rp
#[derive(Parser, Debug)]
#[command(name = "kudos-rp")]
#[command(about = "Report writer service for the kudos pipeline")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "KUDOS_RP_PORT")]
    port: u16,

    /// Record store database path
    #[arg(short, long)]
    database: Option<String>,

    /// Spreadsheet API base URL
    #[arg(long)]
    sheets_url: Option<String>,

    /// Destination spreadsheet id
    #[arg(long)]
    spreadsheet_id: Option<String>,

    /// Target range within the spreadsheet
    #[arg(long)]
    range: Option<String>,

    /// Token endpoint URL
    #[arg(long)]
    token_url: Option<String>,

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
                .unwrap_or_else(|_| "kudos_rp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting kudos-rp v{} [{}] built {} ({})",
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
    let sheets_url = config::resolve(
        args.sheets_url,
        "KUDOS_SHEETS_URL",
        &file,
        "report",
        "url",
        "https://sheets.googleapis.com",
    );
    let spreadsheet_id = config::resolve(
        args.spreadsheet_id,
        "KUDOS_SPREADSHEET_ID",
        &file,
        "report",
        "spreadsheet_id",
        "",
    );
    if spreadsheet_id.is_empty() {
        bail!("No destination spreadsheet configured (set KUDOS_SPREADSHEET_ID or [report] spreadsheet_id)");
    }
    let range = config::resolve(args.range, "KUDOS_REPORT_RANGE", &file, "report", "range", "Sheet1");
    let token_url = config::resolve(
        args.token_url,
        "KUDOS_TOKEN_URL",
        &file,
        "report",
        "token_url",
        "http://localhost:8086/token",
    );

    let db = kudos_common::db::init_database(db_path.as_ref())
        .await
        .context("Failed to initialize record store")?;
    info!("Record store ready at {}", db_path);

    let tokens = TokenProvider::new(token_url);
    let sink = Arc::new(SheetsClient::new(
        sheets_url.clone(),
        spreadsheet_id,
        range,
        tokens,
    ));
    info!("Report sink at {}", sheets_url);

    let app = build_router(AppState::new(db, sink));

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
