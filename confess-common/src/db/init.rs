//! Database initialization
//!
//! Creates the database file and the `confessions` table on first run.
//! Schema creation is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database file and ensure the schema
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
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the change-feed readers proceed while a write is in flight
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_confessions_table(&pool).await?;

    Ok(pool)
}

/// In-memory database with the schema applied
///
/// Limited to one connection: every SQLite in-memory connection is a
/// separate database, so the one connection is never recycled.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_confessions_table(&pool).await?;

    Ok(pool)
}

/// Create the confessions table and its indexes
pub async fn create_confessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS confessions (
            id TEXT PRIMARY KEY,
            target_name TEXT NOT NULL,
            message TEXT NOT NULL,
            song_url TEXT,
            song_embed_id TEXT,
            is_approved INTEGER NOT NULL DEFAULT 1,
            is_verified INTEGER NOT NULL DEFAULT 0,
            dev_code TEXT,
            created_at TEXT NOT NULL,
            unique_slug TEXT NOT NULL UNIQUE,
            views INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_confessions_approved_created \
         ON confessions (is_approved, created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
