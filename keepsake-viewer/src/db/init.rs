//! Database initialization
//!
//! Opens (creating if missing) the sqlite database and ensures the schema
//! exists. The journeys table is owned by the external authoring side; the
//! viewer only creates it so a fresh deployment starts clean.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::info;

/// Open the database pool, creating the file and schema if missing
pub async fn open_db(path: &Path) -> Result<Pool<Sqlite>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;

    info!("Database ready at {}", path.display());
    Ok(pool)
}

/// Create required tables if they do not exist
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS journeys (
            slug TEXT PRIMARY KEY,
            partner_name TEXT NOT NULL,
            proposer_name TEXT NOT NULL,
            passcode TEXT NOT NULL,
            media TEXT NOT NULL DEFAULT '[]',
            photos TEXT NOT NULL DEFAULT '[]',
            music_url TEXT,
            how_we_met_text TEXT,
            love_reasons TEXT NOT NULL DEFAULT '[]',
            is_accepted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
