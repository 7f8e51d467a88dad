//! Printable record view.
//!
//! Resolves every foreign key to display text and flattens the item into
//! labeled blocks, ready for the client to lay out on paper. Empty fields
//! are dropped rather than printed blank.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{ApiError, ApiResult, AppState};
use mlib_common::config::print::{PrintKind, PrintLookup, PRINT_FIELDSETS};
use mlib_common::db::models::row_to_json;
use mlib_common::text::compose_person_name;

/// GET /api/print/:id — labeled blocks for the printable view.
pub async fn print_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let row = sqlx::query("SELECT * FROM LibraryItem WHERE ItemID = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {} not found", id)))?;
    let item = row_to_json(&row);

    let mut blocks = Vec::new();
    for fieldset in PRINT_FIELDSETS {
        match fieldset.subrecord {
            None => {
                let fields = render_fields(&state.db, fieldset.fields, &item).await?;
                if !fields.is_empty() {
                    blocks.push(json!({ "label": fieldset.label, "fields": fields }));
                }
            }
            Some(table) => {
                let sql = format!("SELECT * FROM {table} WHERE LibraryItem = ? ORDER BY 1");
                let rows = sqlx::query(&sql).bind(id).fetch_all(&state.db).await?;
                for (index, row) in rows.iter().enumerate() {
                    let record = row_to_json(row);
                    let fields = render_fields(&state.db, fieldset.fields, &record).await?;
                    if !fields.is_empty() {
                        blocks.push(json!({
                            "label": format!("{} {}", fieldset.label, index + 1),
                            "fields": fields,
                        }));
                    }
                }
            }
        }
    }

    let title = item
        .get("ItemTitle")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    Ok(Json(json!({
        "status": "success",
        "ItemID": id,
        "title": title,
        "blocks": blocks,
    })))
}

async fn render_fields(
    db: &SqlitePool,
    fields: &[mlib_common::config::print::PrintField],
    record: &Value,
) -> Result<Vec<Value>, ApiError> {
    let mut rendered = Vec::new();
    for field in fields {
        let raw = record.get(field.column).unwrap_or(&Value::Null);
        let text = match &field.kind {
            PrintKind::Text => plain_text(raw),
            PrintKind::YesNo => match raw.as_str() {
                Some("Y") => Some("Yes".to_string()),
                Some(_) => Some("No".to_string()),
                None => None,
            },
            PrintKind::Money => match raw {
                Value::Number(n) => n.as_f64().map(|v| format!("{:.2}", v)),
                Value::String(s) => s.trim().parse::<f64>().ok().map(|v| format!("{:.2}", v)),
                _ => None,
            },
            PrintKind::Lookup(lookup) => match raw.as_i64() {
                Some(key) => resolve_lookup(db, lookup, key).await?,
                None => None,
            },
            PrintKind::Multiple {
                value_table,
                value_column,
                value_key,
                link_table,
                link_column,
            } => match raw.as_i64() {
                Some(item_id) => {
                    let sql = format!(
                        "SELECT v.{value_column} FROM {link_table} l \
                         JOIN {value_table} v ON v.{value_key} = l.{link_column} \
                         WHERE l.LibraryItem = ? ORDER BY v.{value_column}"
                    );
                    let values: Vec<String> =
                        sqlx::query_scalar(&sql).bind(item_id).fetch_all(db).await?;
                    if values.is_empty() {
                        None
                    } else {
                        Some(values.join("; "))
                    }
                }
                None => None,
            },
        };
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            rendered.push(json!({ "label": field.label, "value": text }));
        }
    }
    Ok(rendered)
}

fn plain_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

async fn resolve_lookup(
    db: &SqlitePool,
    lookup: &PrintLookup,
    key: i64,
) -> Result<Option<String>, ApiError> {
    if lookup.columns.len() == 3 {
        let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(&format!(
            "SELECT {}, {}, {} FROM {} WHERE {} = ?",
            lookup.columns[0], lookup.columns[1], lookup.columns[2], lookup.table, lookup.key
        ))
        .bind(key)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|(last, first, dates)| {
            compose_person_name(&last, first.as_deref().unwrap_or(""), dates.as_deref().unwrap_or(""))
        }))
    } else {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            lookup.columns[0], lookup.table, lookup.key
        );
        let value: Option<String> = sqlx::query_scalar(&sql).bind(key).fetch_optional(db).await?;
        Ok(value)
    }
}

/// Build print routes
pub fn print_routes() -> Router<AppState> {
    Router::new().route("/api/print/:id", get(print_item))
}
