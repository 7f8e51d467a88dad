//! mlib-api library interface
//!
//! Exposes the application state, router, and report engine for
//! integration testing.

pub mod api;
pub mod error;
pub mod report;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Static routes are registered before the generic `/api/:slug` lookup
/// routes, which catch everything else (the router prefers static
/// matches).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health::health_routes())
        .merge(api::sessions::session_routes())
        .merge(api::accounts::account_routes())
        .merge(api::items::item_routes())
        .merge(api::audit::audit_routes())
        .merge(api::print::print_routes())
        .merge(api::reports::report_routes())
        .merge(api::lookups::lookup_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
