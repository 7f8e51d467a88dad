//! HTTP API handlers for the catalog service.

pub mod accounts;
pub mod audit;
pub mod health;
pub mod items;
pub mod lookups;
pub mod print;
pub mod reports;
pub mod sessions;

use serde_json::Value;
use sqlx::SqliteConnection;

use crate::ApiError;

/// Record one audit entry inside the caller's transaction.
pub(crate) async fn record_audit(
    conn: &mut SqliteConnection,
    who: &str,
    action: &str,
    table: &str,
    key: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO LibraryAudit (AuditWho, AuditWhen, AuditAction, AuditTable, AuditKey)
             VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(who)
    .bind(crate::session::localtime_now())
    .bind(action)
    .bind(table)
    .bind(key)
    .execute(conn)
    .await?;
    Ok(())
}

/// Bind a JSON scalar to the next query placeholder.
///
/// The dynamic handlers carry record payloads as JSON; values bind as
/// the closest SQLite type (ints, floats, text, null). Arrays and
/// objects never reach column positions.
pub(crate) fn bind_json<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        _ => query.bind(None::<String>),
    }
}

/// True when a payload field should be treated as absent: missing, null,
/// or an empty/whitespace string.
pub(crate) fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}
