//! Schema initialization tests.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use mlib_common::db::{self, init};

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database")
}

async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn create_tables_builds_the_full_schema() {
    let pool = memory_pool().await;
    init::create_tables(&pool).await.unwrap();

    let tables = table_names(&pool).await;
    for expected in [
        "LibraryItem",
        "LibraryPerson",
        "LibrarySeason",
        "LibraryKeyword",
        "LibraryTagGroup",
        "LibraryTag",
        "LibraryCompany",
        "LibraryItemKeyword",
        "LibraryItemTag",
        "LibraryPerformance",
        "LibraryInventory",
        "LibraryPart",
        "LibraryLoan",
        "LibraryAudit",
        "login_account",
        "login_session",
        "report_request",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
    }
}

#[tokio::test]
async fn create_tables_is_idempotent() {
    let pool = memory_pool().await;
    init::create_tables(&pool).await.unwrap();
    let first = table_names(&pool).await;

    init::create_tables(&pool).await.unwrap();
    assert_eq!(table_names(&pool).await, first);
}

#[tokio::test]
async fn init_database_pool_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested/data/catalog.db");

    let pool = db::init_database_pool(&db_path).await.unwrap();
    assert!(db_path.exists());

    // The schema came up with the pool.
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM LibraryItem")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(items, 0);
}

#[tokio::test]
async fn item_table_accepts_a_minimal_row() {
    let pool = memory_pool().await;
    init::create_tables(&pool).await.unwrap();

    sqlx::query("INSERT INTO LibraryItem (ItemTitle) VALUES ('Anthem')")
        .execute(&pool)
        .await
        .unwrap();
    let (is_collection, sort_key): (String, String) =
        sqlx::query_as("SELECT IsCollection, SortKey FROM LibraryItem")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(is_collection, "N");
    assert_eq!(sort_key, "");
}
