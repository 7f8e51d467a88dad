//! Typed rows and dynamic-row helpers.
//!
//! The lookup-table and item handlers are driven by the trusted config
//! registries, so their SELECT shapes vary by table; [`row_to_json`]
//! converts any SQLite row into a JSON object keyed by column name, the
//! way the handlers hand records back to the form layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Login account row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub account_id: i64,
    pub account_name: String,
    pub account_fullname: Option<String>,
    pub account_comment: Option<String>,
    pub account_admin: i64,
    pub account_readonly: i64,
    pub account_status: String,
    #[serde(skip_serializing)]
    pub account_hash: Option<String>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.account_admin != 0
    }

    pub fn is_readonly(&self) -> bool {
        self.account_readonly != 0
    }

    pub fn is_active(&self) -> bool {
        self.account_status == "Active"
    }
}

/// Login session row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub sess_id: String,
    pub sess_user: String,
    pub sess_start: String,
    pub sess_last: i64,
    pub sess_closed: Option<String>,
}

/// Queued report request row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRequestRow {
    pub request_id: i64,
    pub account: String,
    pub requested: String,
    pub parameters: String,
    pub elapsed: Option<f64>,
}

/// One audit log entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditEntry {
    #[serde(rename = "AuditID")]
    pub audit_id: i64,
    #[serde(rename = "AuditWho")]
    pub audit_who: String,
    #[serde(rename = "AuditWhen")]
    pub audit_when: String,
    #[serde(rename = "AuditAction")]
    pub audit_action: String,
    #[serde(rename = "AuditTable")]
    pub audit_table: String,
    #[serde(rename = "AuditKey")]
    pub audit_key: String,
}

/// Convert a row into a JSON object keyed by column name.
///
/// Integer and real columns become JSON numbers, everything else text;
/// NULLs are preserved. Blob columns are not part of this schema and
/// collapse to null.
pub fn row_to_json(row: &SqliteRow) -> Value {
    let mut map = serde_json::Map::new();
    for column in row.columns() {
        let ordinal = column.ordinal();
        let value = match row.try_get_raw(ordinal) {
            Ok(raw) if raw.is_null() => Value::Null,
            Ok(raw) => match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => row
                    .try_get::<i64, _>(ordinal)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                "REAL" => row
                    .try_get::<f64, _>(ordinal)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                "BLOB" => Value::Null,
                _ => row
                    .try_get::<String, _>(ordinal)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            },
            Err(_) => Value::Null,
        };
        map.insert(column.name().to_string(), value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[tokio::test]
    async fn row_to_json_preserves_types_and_nulls() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let row = sqlx::query(
            "SELECT 42 AS n, 2.5 AS r, 'hello' AS t, NULL AS missing",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let json = row_to_json(&row);
        assert_eq!(json["n"], Value::from(42));
        assert_eq!(json["r"], Value::from(2.5));
        assert_eq!(json["t"], Value::from("hello"));
        assert_eq!(json["missing"], Value::Null);
    }
}
