//! Report engine.
//!
//! A report runs in four stages: compile the stored filters into the
//! surviving item-id set, materialize each requested column against that
//! set, assemble and sort the rows, then render JSON or a spreadsheet.
//! The whole run holds one pool connection so the temporary id table
//! stays private to the execution.

pub mod columns;
pub mod filter;
pub mod params;
pub mod rows;
pub mod store;
pub mod xlsx;

use std::time::Instant;

use sqlx::SqlitePool;

use crate::{ApiError, ApiResult};
use mlib_common::config::columns::ReportColumn;
use params::{OutputFormat, ReportParams};

/// Subquery selecting each item's latest inventory row as a composite
/// string key: stock date (missing dates sort earliest) then the
/// zero-padded inventory id as tie-break. The id is recovered from the
/// last 15 characters of the key.
pub(crate) const LATEST_INVENTORY_SUBQUERY: &str =
    "SELECT LibraryItem, \
            MAX(COALESCE(InStockDate, '0000-00-00') || ':' || printf('%015d', InventoryID)) AS latest \
       FROM LibraryInventory GROUP BY LibraryItem";

/// A completed report run.
pub struct ReportOutput {
    pub request_id: i64,
    pub title: String,
    pub output: OutputFormat,
    pub columns: Vec<&'static ReportColumn>,
    pub rows: Vec<Vec<Option<String>>>,
    pub elapsed: f64,
}

/// Execute a stored report request.
pub async fn run_report(db: &SqlitePool, request_id: i64) -> ApiResult<ReportOutput> {
    let request = store::load_request(db, request_id).await?;
    let blob: serde_json::Value = serde_json::from_str(&request.parameters)
        .map_err(|e| ApiError::Internal(format!("stored report parameters are corrupt: {e}")))?;
    let params = ReportParams::parse(&blob)?;

    let started = Instant::now();
    let mut conn = db.acquire().await?;
    let ids = filter::surviving_ids(&mut conn, &params.filters).await?;
    tracing::info!(
        "report {}: {} item(s) survive {} filter(s)",
        request_id,
        ids.len(),
        params.filters.len()
    );
    let materialized = columns::materialize(&mut conn, &ids, &params.columns).await?;
    let mut rows = rows::assemble(&materialized);
    rows::sort_rows(&mut rows, params.reversed);
    let elapsed = started.elapsed().as_secs_f64();
    store::record_elapsed(&mut conn, request_id, elapsed).await?;

    Ok(ReportOutput {
        request_id,
        title: params.title,
        output: params.output,
        columns: params.columns,
        rows,
        elapsed,
    })
}
