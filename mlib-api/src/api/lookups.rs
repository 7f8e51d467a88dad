//! Generic lookup-record API.
//!
//! One set of handlers serves every table in the registry, keyed by URL
//! slug. A few picklist slugs (`collection`, `user`) are synthesized from
//! other tables rather than edited directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use sqlx::SqliteConnection;

use crate::api::{bind_json, record_audit};
use crate::session::CurrentUser;
use crate::{ApiError, ApiResult, AppState};
use mlib_common::config::tables::{table_for_slug, TableSpec};
use mlib_common::db::models::row_to_json;
use mlib_common::text::compose_person_name;

fn spec_for(slug: &str) -> Result<&'static TableSpec, ApiError> {
    table_for_slug(slug).ok_or_else(|| ApiError::NotFound(format!("no such record type: {}", slug)))
}

/// GET /api/:slug — picklist of `{id, display}` entries.
pub async fn list_records(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let sql = match slug.as_str() {
        // Collections are items flagged IsCollection, not a lookup table.
        "collection" => {
            "SELECT ItemID AS id, ItemTitle AS display \
             FROM LibraryItem WHERE IsCollection = 'Y' ORDER BY SortKey"
                .to_string()
        }
        // Catalogers: accounts that have actually added items.
        "user" => {
            "SELECT DISTINCT a.account_name AS id, \
                    COALESCE(a.account_fullname, a.account_name) AS display \
             FROM login_account a \
             JOIN LibraryItem i ON i.AddedBy = a.account_name \
             ORDER BY display"
                .to_string()
        }
        "tag" => {
            "SELECT t.TagID AS id, g.TagGroupName || ': ' || t.TagName AS display \
             FROM LibraryTag t \
             JOIN LibraryTagGroup g ON g.TagGroupID = t.TagGroup \
             ORDER BY display"
                .to_string()
        }
        "person" => {
            "SELECT PersonID AS id, SearchKey AS display \
             FROM LibraryPerson ORDER BY SearchKey"
                .to_string()
        }
        _ => {
            let spec = spec_for(&slug)?;
            let order = if spec.columns.contains(&"SortPosition") {
                format!("COALESCE(SortPosition, 999999), {}", spec.display)
            } else {
                spec.display.to_string()
            };
            format!(
                "SELECT {} AS id, {} AS display FROM {} ORDER BY {}",
                spec.primary_key, spec.display, spec.table, order
            )
        }
    };

    let rows = sqlx::query(&sql).fetch_all(&state.db).await?;
    let records: Vec<Value> = rows.iter().map(row_to_json).collect();
    Ok(Json(json!({ "status": "success", "records": records })))
}

/// GET /api/:slug/:id — full record plus its reference count.
pub async fn get_record(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, i64)>,
) -> ApiResult<Json<Value>> {
    let spec = spec_for(&slug)?;
    let sql = format!("SELECT * FROM {} WHERE {} = ?", spec.table, spec.primary_key);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} {} not found", slug, id)))?;
    let mut record = match row_to_json(&row) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    record.insert("used_by".to_string(), json!(reference_count(&state, spec, id).await?));
    Ok(Json(Value::Object(record)))
}

async fn reference_count(state: &AppState, spec: &TableSpec, id: i64) -> Result<i64, ApiError> {
    let Some(used_by) = spec.used_by else {
        return Ok(0);
    };
    let mut total = 0;
    for column in used_by.columns {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", used_by.table, column);
        total += sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    }
    Ok(total)
}

/// POST /api/:slug — create a lookup record.
pub async fn create_record(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let who = user.require_write()?.account_name.clone();
    let spec = spec_for(&slug)?;
    let fields = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("record must be a JSON object".to_string()))?;

    let placeholders = vec!["?"; spec.columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        spec.table,
        spec.columns.join(", "),
        placeholders
    );
    let mut tx = state.db.begin().await?;
    let mut query = sqlx::query(&sql);
    for col in spec.columns {
        query = bind_json(query, fields.get(*col).unwrap_or(&Value::Null));
    }
    let result = query.execute(&mut *tx).await?;
    let id = result.last_insert_rowid();
    finish_save(&mut tx, spec, id).await?;
    record_audit(&mut tx, &who, "INSERT", spec.table, &id.to_string()).await?;
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "id": id })),
    ))
}

/// PUT /api/:slug/:id — update a lookup record.
pub async fn update_record(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let who = user.require_write()?.account_name.clone();
    let spec = spec_for(&slug)?;
    let fields = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("record must be a JSON object".to_string()))?;

    let present: Vec<&str> = spec
        .columns
        .iter()
        .copied()
        .filter(|col| fields.contains_key(*col))
        .collect();
    if present.is_empty() {
        return Err(ApiError::BadRequest("no settable fields in payload".to_string()));
    }
    let assignments: Vec<String> = present.iter().map(|col| format!("{col} = ?")).collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        spec.table,
        assignments.join(", "),
        spec.primary_key
    );
    let mut tx = state.db.begin().await?;
    let mut query = sqlx::query(&sql);
    for col in &present {
        query = bind_json(query, &fields[*col]);
    }
    let result = query.bind(id).execute(&mut *tx).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("{} {} not found", slug, id)));
    }
    finish_save(&mut tx, spec, id).await?;
    record_audit(&mut tx, &who, "UPDATE", spec.table, &id.to_string()).await?;
    tx.commit().await?;

    Ok(Json(json!({ "status": "success", "id": id })))
}

/// DELETE /api/:slug/:id — refuse while the record is referenced.
pub async fn delete_record(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
) -> ApiResult<Json<Value>> {
    let who = user.require_write()?.account_name.clone();
    let spec = spec_for(&slug)?;
    let references = reference_count(&state, spec, id).await?;
    if references > 0 {
        return Err(ApiError::BadRequest(format!(
            "{} {} is used by {} record(s)",
            slug, id, references
        )));
    }

    let sql = format!("DELETE FROM {} WHERE {} = ?", spec.table, spec.primary_key);
    let mut tx = state.db.begin().await?;
    let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("{} {} not found", slug, id)));
    }
    record_audit(&mut tx, &who, "DELETE", spec.table, &id.to_string()).await?;
    tx.commit().await?;

    Ok(Json(json!({ "status": "success" })))
}

/// Per-table fixups after an insert or update.
///
/// People carry a denormalized SearchKey, and items referencing a person
/// cache that key inside their sort keys, so both are restamped here.
async fn finish_save(
    conn: &mut SqliteConnection,
    spec: &TableSpec,
    id: i64,
) -> Result<(), ApiError> {
    if spec.table != "LibraryPerson" {
        return Ok(());
    }

    let (last, first, dates): (String, Option<String>, Option<String>) = sqlx::query_as(
        "SELECT LastName, FirstName, Dates FROM LibraryPerson WHERE PersonID = ?",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    let search_key =
        compose_person_name(&last, first.as_deref().unwrap_or(""), dates.as_deref().unwrap_or(""));
    sqlx::query("UPDATE LibraryPerson SET SearchKey = ? WHERE PersonID = ?")
        .bind(&search_key)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let item_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT ItemID FROM LibraryItem WHERE ComposerID = ? OR LyricistID = ? OR ArrangerID = ?",
    )
    .bind(id)
    .bind(id)
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    for item_id in item_ids {
        crate::api::items::refresh_sort_keys(conn, item_id).await?;
    }

    Ok(())
}

/// Build lookup-record routes
pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        .route("/api/:slug", get(list_records).post(create_record))
        .route(
            "/api/:slug/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
}
