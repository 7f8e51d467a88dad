//! Column materialization.
//!
//! The surviving id list is loaded into a connection-scoped temporary
//! table, and each requested column runs one query LEFT JOINed against it
//! and ordered by it, so every value array lines up 1:1 with the id list.
//! A cell is `None` when the relationship is absent, except the
//! many-valued strategy, which renders "no related values" as an empty
//! string.

use std::collections::BTreeMap;

use sqlx::SqliteConnection;

use super::LATEST_INVENTORY_SUBQUERY;
use crate::ApiResult;
use mlib_common::config::columns::{ColumnStrategy, ReportColumn};
use mlib_common::text::{compose_person_name, format_template};

/// One value per surviving id, in id-list order, per requested column.
pub async fn materialize(
    conn: &mut SqliteConnection,
    ids: &[i64],
    columns: &[&'static ReportColumn],
) -> ApiResult<Vec<Vec<Option<String>>>> {
    load_keys(conn, ids).await?;

    let mut materialized = Vec::with_capacity(columns.len());
    for column in columns {
        let values = match &column.strategy {
            ColumnStrategy::Key { format } => key_column(ids, format),
            ColumnStrategy::Direct { column, format } => {
                direct_column(conn, column, *format).await?
            }
            ColumnStrategy::Person { join_column } => person_column(conn, join_column).await?,
            ColumnStrategy::Multiple { value_table, value_column, join, condition } => {
                multiple_column(conn, ids, value_table, value_column, join.as_ref(), *condition)
                    .await?
            }
            ColumnStrategy::Lookup { value_table, value_key, value_column, join_column } => {
                lookup_column(conn, value_table, value_key, value_column, join_column).await?
            }
            ColumnStrategy::Inventory { value_column } => {
                inventory_column(conn, value_column).await?
            }
            ColumnStrategy::LastPerformance => last_performance_column(conn).await?,
        };
        debug_assert_eq!(values.len(), ids.len());
        materialized.push(values);
    }

    Ok(materialized)
}

/// (Re)populate the temp id table for this connection.
///
/// TEMP tables are private to the connection, so concurrent report runs
/// on other pool connections never see these rows.
async fn load_keys(conn: &mut SqliteConnection, ids: &[i64]) -> ApiResult<()> {
    sqlx::query("CREATE TEMP TABLE IF NOT EXISTS report_keys (k INTEGER PRIMARY KEY)")
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM report_keys").execute(&mut *conn).await?;
    for id in ids {
        sqlx::query("INSERT INTO report_keys (k) VALUES (?)")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Formatted key strings, sorted as strings after formatting.
fn key_column(ids: &[i64], format: &str) -> Vec<Option<String>> {
    let mut keys: Vec<String> = ids
        .iter()
        .map(|id| format_template(format, &id.to_string()))
        .collect();
    keys.sort();
    keys.into_iter().map(Some).collect()
}

async fn direct_column(
    conn: &mut SqliteConnection,
    column: &str,
    format: Option<&str>,
) -> ApiResult<Vec<Option<String>>> {
    let sql = format!(
        "SELECT CAST(i.{column} AS TEXT) FROM report_keys r \
         LEFT JOIN LibraryItem i ON i.ItemID = r.k ORDER BY r.k"
    );
    let values: Vec<Option<String>> = sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?;
    Ok(match format {
        None => values,
        Some(template) => values
            .into_iter()
            .map(|v| v.map(|v| if v.is_empty() { v } else { format_template(template, &v) }))
            .collect(),
    })
}

async fn person_column(
    conn: &mut SqliteConnection,
    join_column: &str,
) -> ApiResult<Vec<Option<String>>> {
    let sql = format!(
        "SELECT p.LastName, p.FirstName, p.Dates FROM report_keys r \
         LEFT JOIN LibraryItem i ON i.ItemID = r.k \
         LEFT JOIN LibraryPerson p ON p.PersonID = i.{join_column} \
         ORDER BY r.k"
    );
    let rows: Vec<(Option<String>, Option<String>, Option<String>)> =
        sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
    Ok(rows
        .into_iter()
        .map(|(last, first, dates)| {
            last.map(|last| {
                compose_person_name(
                    &last,
                    first.as_deref().unwrap_or(""),
                    dates.as_deref().unwrap_or(""),
                )
            })
        })
        .collect())
}

async fn multiple_column(
    conn: &mut SqliteConnection,
    ids: &[i64],
    value_table: &str,
    value_column: &str,
    join: Option<&mlib_common::config::columns::MultipleJoin>,
    condition: Option<&str>,
) -> ApiResult<Vec<Option<String>>> {
    let source = match join {
        Some(join) => format!(
            "JOIN {} l ON l.LibraryItem = r.k \
             JOIN {value_table} v ON v.{} = l.{}",
            join.table, join.value_key, join.join_column
        ),
        None => format!("JOIN {value_table} v ON v.LibraryItem = r.k"),
    };
    let condition = condition.unwrap_or("");
    let sql = format!(
        "SELECT r.k, CAST(v.{value_column} AS TEXT) FROM report_keys r \
         {source} {condition} ORDER BY r.k, v.{value_column}"
    );
    let rows: Vec<(i64, Option<String>)> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    let mut by_id: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for (id, value) in rows {
        let values = by_id.entry(id).or_default();
        if let Some(value) = value {
            // Rows arrive ordered, so dedup by checking the last entry.
            if values.last() != Some(&value) {
                values.push(value);
            }
        }
    }
    Ok(ids
        .iter()
        .map(|id| Some(by_id.get(id).map(|v| v.join("; ")).unwrap_or_default()))
        .collect())
}

async fn lookup_column(
    conn: &mut SqliteConnection,
    value_table: &str,
    value_key: &str,
    value_column: &str,
    join_column: &str,
) -> ApiResult<Vec<Option<String>>> {
    let sql = format!(
        "SELECT CAST(v.{value_column} AS TEXT) FROM report_keys r \
         LEFT JOIN LibraryItem i ON i.ItemID = r.k \
         LEFT JOIN {value_table} v ON v.{value_key} = i.{join_column} \
         ORDER BY r.k"
    );
    Ok(sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?)
}

/// Value from the most-recently-dated inventory row, missing stock dates
/// sorting earliest and ties broken by the larger inventory id.
async fn inventory_column(
    conn: &mut SqliteConnection,
    value_column: &str,
) -> ApiResult<Vec<Option<String>>> {
    let sql = format!(
        "SELECT CAST(inv.{value_column} AS TEXT) FROM report_keys r \
         LEFT JOIN ({LATEST_INVENTORY_SUBQUERY}) m ON m.LibraryItem = r.k \
         LEFT JOIN LibraryInventory inv \
           ON inv.LibraryItem = r.k \
          AND CAST(substr(m.latest, -15) AS INTEGER) = inv.InventoryID \
         ORDER BY r.k"
    );
    Ok(sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?)
}

async fn last_performance_column(conn: &mut SqliteConnection) -> ApiResult<Vec<Option<String>>> {
    let sql = "SELECT MAX(p.PerformanceDate) FROM report_keys r \
               LEFT JOIN LibraryPerformance p ON p.LibraryItem = r.k \
               GROUP BY r.k ORDER BY r.k";
    Ok(sqlx::query_scalar(sql).fetch_all(&mut *conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_column_formats_then_sorts() {
        let values = key_column(&[7, 12, 3], "%06d");
        assert_eq!(
            values,
            vec![
                Some("000003".to_string()),
                Some("000007".to_string()),
                Some("000012".to_string()),
            ]
        );
    }
}
