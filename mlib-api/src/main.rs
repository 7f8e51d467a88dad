//! mlib-api - Music Library Catalog service
//!
//! HTTP backend for the music library catalog: item and lookup-table
//! editing, account and session management, audit history, printable
//! records, and the report engine (filtered, column-projected exports as
//! JSON or spreadsheet downloads).

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mlib_api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting mlib-api (Music Library Catalog) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = mlib_common::config::resolve_database_path();
    info!("Database: {}", db_path.display());

    let db_pool = mlib_common::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let state = AppState::new(db_pool);
    let app = mlib_api::build_router(state);

    let port = mlib_common::config::resolve_port();
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
