//! Record store initialization
//!
//! Creates the database on first run so every service can start against an
//! empty data directory. Initialization is idempotent; all three services run
//! it at startup and whichever starts first wins.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; the services share this
    // file and handle deliveries concurrently
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_feedback_table(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema, for tests
pub async fn init_memory_database() -> Result<SqlitePool> {
    // A pool of one connection: each :memory: connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    create_feedback_table(&pool).await?;

    Ok(pool)
}

async fn create_feedback_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            guid TEXT PRIMARY KEY,
            feedback TEXT NOT NULL,
            created_at TEXT NOT NULL,
            classified INTEGER NOT NULL DEFAULT 0,
            classified_at TEXT,
            sentiment_score REAL NOT NULL DEFAULT -1.0,
            sentiment_magnitude REAL NOT NULL DEFAULT -1.0,
            reported_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
