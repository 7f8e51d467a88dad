//! Catalog item records.
//!
//! An item record is the LibraryItem row plus its keyword/tag links and
//! its repeating subrecords (performances, inventories, parts, loans).
//! Saves replace the links and subrecords wholesale inside one
//! transaction, then restamp the denormalized sort keys.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::{Row, SqliteConnection};

use crate::api::{bind_json, is_empty_value, record_audit};
use crate::session::{localtime_now, CurrentUser};
use crate::{ApiError, ApiResult, AppState};
use mlib_common::config::tables::{ITEM_COLUMNS, ITEM_LINKS, ITEM_SUBRECORDS};
use mlib_common::db::models::row_to_json;
use mlib_common::text::{escape_like, transliterate};

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub title: Option<String>,
    pub composer_arranger: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const LIST_LIMIT: i64 = 200;

/// GET /api/item — browse the catalog.
///
/// `title` matches either title column, `composer_arranger` matches the
/// composer or arranger sort keys. Both are case-insensitive substring
/// matches.
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<Json<Value>> {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();
    if let Some(title) = query.title.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = format!("%{}%", escape_like(title.trim()));
        conditions.push("(i.ItemTitle LIKE ? ESCAPE '\\' OR i.OtherTitle LIKE ? ESCAPE '\\')");
        binds.push(pattern.clone());
        binds.push(pattern);
    }
    if let Some(creator) = query
        .composer_arranger
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        let pattern = format!(
            "%{}%",
            escape_like(&transliterate(creator.trim()).to_lowercase())
        );
        conditions.push(
            "(i.ComposerSortKey LIKE ? ESCAPE '\\' OR i.ArrangerSortKey LIKE ? ESCAPE '\\')",
        );
        binds.push(pattern.clone());
        binds.push(pattern);
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM LibraryItem i {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total = count_query.fetch_one(&state.db).await?;

    let limit = query.limit.unwrap_or(LIST_LIMIT).clamp(1, 1000);
    let offset = query.offset.unwrap_or(0).max(0);
    let list_sql = format!(
        r#"
        SELECT i.ItemID, i.ItemTitle, i.OtherTitle, i.IsCollection,
               c.SearchKey AS Composer, a.SearchKey AS Arranger,
               s.LookupValue AS Season
          FROM LibraryItem i
          LEFT JOIN LibraryPerson c ON c.PersonID = i.ComposerID
          LEFT JOIN LibraryPerson a ON a.PersonID = i.ArrangerID
          LEFT JOIN LibrarySeason s ON s.LookupID = i.SeasonID
          {where_clause}
         ORDER BY i.SortKey
         LIMIT ? OFFSET ?
        "#
    );
    let mut list_query = sqlx::query(&list_sql);
    for bind in &binds {
        list_query = list_query.bind(bind);
    }
    let rows = list_query
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.db)
        .await?;
    let items: Vec<Value> = rows.iter().map(row_to_json).collect();

    Ok(Json(json!({ "status": "success", "total": total, "items": items })))
}

/// GET /api/item/:id — full record with links and subrecords.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let row = sqlx::query("SELECT * FROM LibraryItem WHERE ItemID = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {} not found", id)))?;
    let mut record = match row_to_json(&row) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for link in ITEM_LINKS {
        let sql = format!(
            "SELECT {} FROM {} WHERE LibraryItem = ? ORDER BY {}",
            link.link_column, link.table, link.link_column
        );
        let ids: Vec<i64> = sqlx::query_scalar(&sql).bind(id).fetch_all(&state.db).await?;
        record.insert(link.field.to_string(), json!(ids));
    }

    for sub in ITEM_SUBRECORDS {
        let sql = format!("SELECT * FROM {} WHERE LibraryItem = ? ORDER BY 1", sub.table);
        let rows = sqlx::query(&sql).bind(id).fetch_all(&state.db).await?;
        let values: Vec<Value> = rows.iter().map(row_to_json).collect();
        record.insert(sub.field.to_string(), Value::Array(values));
    }

    // Collections list their member items.
    if record.get("IsCollection").and_then(Value::as_str) == Some("Y") {
        let rows = sqlx::query(
            "SELECT ItemID, ItemTitle FROM LibraryItem WHERE CollectionID = ? ORDER BY SortKey",
        )
        .bind(id)
        .fetch_all(&state.db)
        .await?;
        let members: Vec<Value> = rows.iter().map(row_to_json).collect();
        record.insert("Members".to_string(), Value::Array(members));
    }

    Ok(Json(Value::Object(record)))
}

/// POST /api/item — create a catalog item.
pub async fn create_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let who = user.require_write()?.account_name.clone();
    let fields = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("item record must be a JSON object".to_string()))?;
    if is_empty_value(fields.get("ItemTitle")) {
        return Err(ApiError::BadRequest("ItemTitle is required".to_string()));
    }

    let present: Vec<&str> = ITEM_COLUMNS
        .iter()
        .copied()
        .filter(|col| fields.contains_key(*col))
        .collect();
    let mut columns: Vec<&str> = present.clone();
    columns.extend(["DateAdded", "AddedBy"]);
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO LibraryItem ({}) VALUES ({})",
        columns.join(", "),
        placeholders
    );
    let now = localtime_now();

    let mut tx = state.db.begin().await?;
    let mut query = sqlx::query(&sql);
    for col in &present {
        query = bind_json(query, &fields[*col]);
    }
    let result = query.bind(&now).bind(&who).execute(&mut *tx).await?;
    let item_id = result.last_insert_rowid();

    save_links_and_subrecords(&mut tx, item_id, fields).await?;
    refresh_sort_keys(&mut tx, item_id).await?;
    record_audit(&mut tx, &who, "INSERT", "LibraryItem", &item_id.to_string()).await?;
    tx.commit().await?;

    tracing::info!("{} created item {}", who, item_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "ItemID": item_id })),
    ))
}

/// PUT /api/item/:id — update a catalog item.
///
/// Only columns present in the payload change; links and subrecords are
/// replaced for every list field the payload carries.
pub async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let who = user.require_write()?.account_name.clone();
    let fields = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("item record must be a JSON object".to_string()))?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT ItemID FROM LibraryItem WHERE ItemID = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound(format!("item {} not found", id)));
    }

    let present: Vec<&str> = ITEM_COLUMNS
        .iter()
        .copied()
        .filter(|col| fields.contains_key(*col))
        .collect();
    let now = localtime_now();

    let mut tx = state.db.begin().await?;
    if !present.is_empty() {
        let assignments: Vec<String> =
            present.iter().map(|col| format!("{col} = ?")).collect();
        let sql = format!(
            "UPDATE LibraryItem SET {}, DateModified = ?, ModifiedBy = ? WHERE ItemID = ?",
            assignments.join(", ")
        );
        let mut query = sqlx::query(&sql);
        for col in &present {
            query = bind_json(query, &fields[*col]);
        }
        query.bind(&now).bind(&who).bind(id).execute(&mut *tx).await?;
    }

    save_links_and_subrecords(&mut tx, id, fields).await?;
    refresh_sort_keys(&mut tx, id).await?;
    record_audit(&mut tx, &who, "UPDATE", "LibraryItem", &id.to_string()).await?;
    tx.commit().await?;

    Ok(Json(json!({ "status": "success", "ItemID": id })))
}

/// DELETE /api/item/:id — remove an item with its links and subrecords.
pub async fn delete_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let who = user.require_write()?.account_name.clone();

    let mut tx = state.db.begin().await?;
    for link in ITEM_LINKS {
        let sql = format!("DELETE FROM {} WHERE LibraryItem = ?", link.table);
        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
    }
    for sub in ITEM_SUBRECORDS {
        let sql = format!("DELETE FROM {} WHERE LibraryItem = ?", sub.table);
        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
    }
    let result = sqlx::query("DELETE FROM LibraryItem WHERE ItemID = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("item {} not found", id)));
    }
    record_audit(&mut tx, &who, "DELETE", "LibraryItem", &id.to_string()).await?;
    tx.commit().await?;

    tracing::info!("{} deleted item {}", who, id);
    Ok(Json(json!({ "status": "success" })))
}

/// Replace link and subrecord rows for every list field present in the
/// payload. Fields the payload omits are left alone.
async fn save_links_and_subrecords(
    conn: &mut SqliteConnection,
    item_id: i64,
    fields: &Map<String, Value>,
) -> Result<(), ApiError> {
    for link in ITEM_LINKS {
        let Some(values) = fields.get(link.field).and_then(Value::as_array) else {
            continue;
        };
        let sql = format!("DELETE FROM {} WHERE LibraryItem = ?", link.table);
        sqlx::query(&sql).bind(item_id).execute(&mut *conn).await?;
        let insert = format!(
            "INSERT INTO {} (LibraryItem, {}) VALUES (?, ?)",
            link.table, link.link_column
        );
        for value in values {
            let Some(lookup_id) = value_as_id(value) else {
                return Err(ApiError::BadRequest(format!(
                    "{} entries must be record ids",
                    link.field
                )));
            };
            sqlx::query(&insert)
                .bind(item_id)
                .bind(lookup_id)
                .execute(&mut *conn)
                .await?;
        }
    }

    for sub in ITEM_SUBRECORDS {
        let Some(records) = fields.get(sub.field).and_then(Value::as_array) else {
            continue;
        };
        let sql = format!("DELETE FROM {} WHERE LibraryItem = ?", sub.table);
        sqlx::query(&sql).bind(item_id).execute(&mut *conn).await?;
        let placeholders = vec!["?"; sub.columns.len() + 1].join(", ");
        let insert = format!(
            "INSERT INTO {} (LibraryItem, {}) VALUES ({})",
            sub.table,
            sub.columns.join(", "),
            placeholders
        );
        for record in records {
            let Some(obj) = record.as_object() else {
                return Err(ApiError::BadRequest(format!(
                    "{} entries must be objects",
                    sub.field
                )));
            };
            let mut query = sqlx::query(&insert).bind(item_id);
            for col in sub.columns {
                query = bind_json(query, obj.get(*col).unwrap_or(&Value::Null));
            }
            query.execute(&mut *conn).await?;
        }
    }

    Ok(())
}

/// Accept record ids as JSON numbers or numeric strings.
fn value_as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Restamp the three denormalized sort keys from the saved row.
///
/// Keys are transliterated to ASCII and lowercased, with the item id as
/// final tie-break so equal titles keep a stable order.
pub(crate) async fn refresh_sort_keys(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> Result<(), ApiError> {
    let row = sqlx::query(
        r#"
        SELECT i.ItemTitle,
               c.LastName AS ComposerLast, c.FirstName AS ComposerFirst,
               c.SearchKey AS ComposerKey, a.SearchKey AS ArrangerKey
          FROM LibraryItem i
          LEFT JOIN LibraryPerson c ON c.PersonID = i.ComposerID
          LEFT JOIN LibraryPerson a ON a.PersonID = i.ArrangerID
         WHERE i.ItemID = ?
        "#,
    )
    .bind(item_id)
    .fetch_one(&mut *conn)
    .await?;

    let key = |text: Option<String>| transliterate(text.as_deref().unwrap_or("")).to_lowercase();
    let title = key(Some(row.get::<String, _>("ItemTitle")));
    let composer_last = key(row.get("ComposerLast"));
    let composer_first = key(row.get("ComposerFirst"));
    let composer = key(row.get("ComposerKey"));
    let arranger = key(row.get("ArrangerKey"));

    let sort_key = format!("{title}\t{composer_last}\t{composer_first}\t{item_id:06}");
    let composer_key = format!("{composer}\t{title}\t{item_id:06}");
    let arranger_key = format!("{arranger}\t{title}\t{item_id:06}");

    sqlx::query(
        "UPDATE LibraryItem SET SortKey = ?, ComposerSortKey = ?, ArrangerSortKey = ? WHERE ItemID = ?",
    )
    .bind(&sort_key)
    .bind(&composer_key)
    .bind(&arranger_key)
    .bind(item_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Build item routes
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/api/item", get(list_items).post(create_item))
        .route(
            "/api/item/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}
