//! Report request persistence.
//!
//! A request id is only handed out after the parameter insert commits, so
//! every id a client holds refers to a complete stored request. Elapsed
//! time is written back after a successful run; a failed run leaves the
//! row untouched for a later retry with the same id.

use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};

use crate::session::localtime_now;
use crate::{ApiError, ApiResult};
use mlib_common::db::models::ReportRequestRow;

/// Persist a parameter blob and return its request id.
pub async fn save_request(db: &SqlitePool, account: &str, parameters: &Value) -> ApiResult<i64> {
    let text = serde_json::to_string(parameters)
        .map_err(|e| ApiError::Internal(format!("parameter serialization failed: {e}")))?;
    let result = sqlx::query(
        "INSERT INTO report_request (account, requested, parameters) VALUES (?, ?, ?)",
    )
    .bind(account)
    .bind(localtime_now())
    .bind(&text)
    .execute(db)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Load a stored request by id.
pub async fn load_request(db: &SqlitePool, request_id: i64) -> ApiResult<ReportRequestRow> {
    let row: Option<ReportRequestRow> =
        sqlx::query_as("SELECT * FROM report_request WHERE request_id = ?")
            .bind(request_id)
            .fetch_optional(db)
            .await?;
    row.ok_or_else(|| ApiError::NotFound(format!("report request {} not found", request_id)))
}

/// Record how long the run took, in seconds.
pub async fn record_elapsed(
    conn: &mut SqliteConnection,
    request_id: i64,
    elapsed: f64,
) -> ApiResult<()> {
    sqlx::query("UPDATE report_request SET elapsed = ? WHERE request_id = ?")
        .bind(elapsed)
        .bind(request_id)
        .execute(conn)
        .await?;
    Ok(())
}
