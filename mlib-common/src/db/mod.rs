//! Database access for the catalog service.

pub mod init;
pub mod models;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the SQLite connection pool and make sure the schema exists.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    init::create_tables(&pool).await?;

    Ok(pool)
}
