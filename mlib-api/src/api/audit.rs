//! Change-history listing (admin only).

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::session::CurrentUser;
use crate::{ApiResult, AppState};
use mlib_common::db::models::AuditEntry;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub table: Option<String>,
    pub who: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const LIST_LIMIT: i64 = 500;

/// GET /api/audit — most recent changes first.
pub async fn list_audit(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    user.require_admin()?;

    let limit = query.limit.unwrap_or(LIST_LIMIT).clamp(1, 5000);
    let offset = query.offset.unwrap_or(0).max(0);
    let entries: Vec<AuditEntry> = sqlx::query_as(
        r#"
        SELECT * FROM LibraryAudit
         WHERE (? IS NULL OR AuditTable = ?)
           AND (? IS NULL OR AuditWho = ?)
         ORDER BY AuditWhen DESC, AuditID DESC
         LIMIT ? OFFSET ?
        "#,
    )
    .bind(&query.table)
    .bind(&query.table)
    .bind(&query.who)
    .bind(&query.who)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({ "status": "success", "entries": entries })))
}

/// Build audit routes
pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/api/audit", get(list_audit))
}
