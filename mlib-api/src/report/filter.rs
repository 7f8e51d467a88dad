//! Filter compilation.
//!
//! Every active filter is compiled to one query producing a set of item
//! ids; the surviving set is the intersection of all of them with the
//! universal set of item ids. Sets intersect as plain integer sets, and
//! the result comes back in ascending order.

use std::collections::BTreeSet;

use sqlx::SqliteConnection;

use super::params::{CountLogic, DateLogic, Filter, MatchLogic, ScalarLogic, SetLogic};
use super::LATEST_INVENTORY_SUBQUERY;
use crate::ApiResult;
use mlib_common::text::escape_like;

/// Intersect the universal item-id set with every active predicate set.
pub async fn surviving_ids(
    conn: &mut SqliteConnection,
    filters: &[Filter],
) -> ApiResult<Vec<i64>> {
    let universal: Vec<i64> = sqlx::query_scalar("SELECT ItemID FROM LibraryItem ORDER BY ItemID")
        .fetch_all(&mut *conn)
        .await?;
    let mut surviving: BTreeSet<i64> = universal.into_iter().collect();

    for filter in filters {
        if surviving.is_empty() {
            break;
        }
        let predicate = predicate_set(conn, filter).await?;
        surviving = surviving.intersection(&predicate).copied().collect();
    }

    Ok(surviving.into_iter().collect())
}

/// Item ids satisfying one filter predicate.
async fn predicate_set(conn: &mut SqliteConnection, filter: &Filter) -> ApiResult<BTreeSet<i64>> {
    let ids: Vec<i64> = match filter {
        Filter::Title { logic, text } => {
            let clause = "(ItemTitle LIKE ? ESCAPE '\\' OR COALESCE(OtherTitle, '') LIKE ? ESCAPE '\\')";
            let sql = match logic {
                MatchLogic::Like => format!("SELECT ItemID FROM LibraryItem WHERE {clause}"),
                MatchLogic::NotLike => format!("SELECT ItemID FROM LibraryItem WHERE NOT {clause}"),
            };
            let pattern = like_pattern(text);
            sqlx::query_scalar(&sql)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_all(&mut *conn)
                .await?
        }
        Filter::Creator { logic, text } => {
            // A match on any of the three roles matches the item. Items
            // with no credited person never match under either logic.
            let clause = "(COALESCE(c.SearchKey, '') LIKE ? ESCAPE '\\' \
                          OR COALESCE(l.SearchKey, '') LIKE ? ESCAPE '\\' \
                          OR COALESCE(a.SearchKey, '') LIKE ? ESCAPE '\\')";
            let sql = format!(
                "SELECT i.ItemID FROM LibraryItem i \
                 LEFT JOIN LibraryPerson c ON c.PersonID = i.ComposerID \
                 LEFT JOIN LibraryPerson l ON l.PersonID = i.LyricistID \
                 LEFT JOIN LibraryPerson a ON a.PersonID = i.ArrangerID \
                 WHERE (c.PersonID IS NOT NULL \
                        OR l.PersonID IS NOT NULL \
                        OR a.PersonID IS NOT NULL) \
                   AND {}{clause}",
                match logic {
                    MatchLogic::Like => "",
                    MatchLogic::NotLike => "NOT ",
                }
            );
            let pattern = like_pattern(text);
            sqlx::query_scalar(&sql)
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_all(&mut *conn)
                .await?
        }
        Filter::Collection { logic, text } => {
            // Only items inside some collection can match either way.
            let sql = format!(
                "SELECT i.ItemID FROM LibraryItem i \
                 JOIN LibraryItem p ON p.ItemID = i.CollectionID \
                 WHERE {}(p.ItemTitle LIKE ? ESCAPE '\\')",
                match logic {
                    MatchLogic::Like => "",
                    MatchLogic::NotLike => "NOT ",
                }
            );
            sqlx::query_scalar(&sql)
                .bind(like_pattern(text))
                .fetch_all(&mut *conn)
                .await?
        }
        Filter::Cataloger { logic, name } => {
            let sql = match logic {
                ScalarLogic::Is => "SELECT ItemID FROM LibraryItem WHERE AddedBy = ?",
                ScalarLogic::IsNot => "SELECT ItemID FROM LibraryItem WHERE AddedBy <> ?",
            };
            sqlx::query_scalar(sql).bind(name).fetch_all(&mut *conn).await?
        }
        Filter::Membership { column, logic, ids } => {
            let op = match logic {
                SetLogic::In => "IN",
                SetLogic::NotIn => "NOT IN",
            };
            let sql = format!(
                "SELECT ItemID FROM LibraryItem WHERE {column} {op} ({})",
                placeholders(ids.len())
            );
            let mut query = sqlx::query_scalar(&sql);
            for id in ids {
                query = query.bind(id);
            }
            query.fetch_all(&mut *conn).await?
        }
        Filter::Linked { table, link_column, logic, ids } => {
            let inner = format!(
                "SELECT DISTINCT LibraryItem FROM {table} WHERE {link_column} IN ({})",
                placeholders(ids.len())
            );
            let sql = match logic {
                SetLogic::In => inner,
                // Not-linked includes items with no link rows at all.
                SetLogic::NotIn => {
                    format!("SELECT ItemID FROM LibraryItem WHERE ItemID NOT IN ({inner})")
                }
            };
            let mut query = sqlx::query_scalar(&sql);
            for id in ids {
                query = query.bind(id);
            }
            query.fetch_all(&mut *conn).await?
        }
        Filter::Added { logic, date } => {
            let sql = match logic {
                DateLogic::OnOrAfter => "SELECT ItemID FROM LibraryItem WHERE DateAdded >= ?",
                DateLogic::OnOrBefore => "SELECT ItemID FROM LibraryItem WHERE DateAdded <= ?",
            };
            sqlx::query_scalar(sql).bind(date).fetch_all(&mut *conn).await?
        }
        Filter::Performance { logic, date } => {
            let op = match logic {
                DateLogic::OnOrAfter => ">=",
                DateLogic::OnOrBefore => "<=",
            };
            let sql = format!(
                "SELECT LibraryItem FROM LibraryPerformance \
                 GROUP BY LibraryItem HAVING MAX(PerformanceDate) {op} ?"
            );
            sqlx::query_scalar(&sql).bind(date).fetch_all(&mut *conn).await?
        }
        Filter::Copies { logic, count } => {
            let op = match logic {
                CountLogic::AtLeast => ">=",
                CountLogic::Below => "<",
            };
            // A latest row with NULL InStock fails both comparisons.
            let sql = format!(
                "SELECT inv.LibraryItem FROM LibraryInventory inv \
                 JOIN ({LATEST_INVENTORY_SUBQUERY}) m \
                   ON m.LibraryItem = inv.LibraryItem \
                  AND CAST(substr(m.latest, -15) AS INTEGER) = inv.InventoryID \
                 WHERE inv.InStock {op} ?"
            );
            sqlx::query_scalar(&sql).bind(count).fetch_all(&mut *conn).await?
        }
        Filter::OnLoan { logic } => {
            let on_loan = "SELECT DISTINCT LibraryItem FROM LibraryLoan WHERE LoanReturned IS NULL";
            let sql = match logic {
                SetLogic::In => on_loan.to_string(),
                SetLogic::NotIn => {
                    format!("SELECT ItemID FROM LibraryItem WHERE ItemID NOT IN ({on_loan})")
                }
            };
            sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?
        }
    };

    Ok(ids.into_iter().collect())
}

fn like_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50% off_"), "%50\\% off\\_%");
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
