//! Schema creation.
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so startup against an
//! existing database is a no-op. Tests call the individual helpers against
//! in-memory pools.

use crate::Result;
use sqlx::SqlitePool;

/// Create the full schema.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_catalog_tables(pool).await?;
    create_account_tables(pool).await?;
    create_workflow_tables(pool).await?;
    tracing::info!("Database tables initialized");
    Ok(())
}

/// Catalog item, lookup, link, and subrecord tables.
pub async fn create_catalog_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryItem (
            ItemID INTEGER PRIMARY KEY AUTOINCREMENT,
            ItemTitle TEXT NOT NULL,
            OtherTitle TEXT,
            IsCollection TEXT NOT NULL DEFAULT 'N',
            CollectionID INTEGER,
            ComposerID INTEGER,
            LyricistID INTEGER,
            ArrangerID INTEGER,
            ArrangementID INTEGER,
            KeyID INTEGER,
            SkillID INTEGER,
            AccompanimentID INTEGER,
            HandbellEnsembleID INTEGER,
            SeasonID INTEGER,
            OwnerID INTEGER,
            PublisherID INTEGER,
            Duration TEXT,
            Copyright TEXT,
            Comments TEXT,
            DateAdded TEXT,
            AddedBy TEXT,
            DateModified TEXT,
            ModifiedBy TEXT,
            SortKey TEXT NOT NULL DEFAULT '',
            ComposerSortKey TEXT NOT NULL DEFAULT '',
            ArrangerSortKey TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryPerson (
            PersonID INTEGER PRIMARY KEY AUTOINCREMENT,
            LastName TEXT NOT NULL,
            FirstName TEXT,
            Dates TEXT,
            Comments TEXT,
            SearchKey TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Simple lookup tables share one shape; LibraryKeyword has no
    // SortPosition because keywords list alphabetically.
    for table in [
        "LibraryAccompaniment",
        "LibraryArrangement",
        "LibraryHandbellEnsemble",
        "LibraryKey",
        "LibraryOwner",
        "LibrarySeason",
        "LibrarySkill",
    ] {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                LookupID INTEGER PRIMARY KEY AUTOINCREMENT,
                LookupValue TEXT NOT NULL,
                SortPosition INTEGER,
                Comments TEXT
            )
            "#
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryKeyword (
            LookupID INTEGER PRIMARY KEY AUTOINCREMENT,
            LookupValue TEXT NOT NULL,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryTagGroup (
            TagGroupID INTEGER PRIMARY KEY AUTOINCREMENT,
            TagGroupName TEXT NOT NULL,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryTag (
            TagID INTEGER PRIMARY KEY AUTOINCREMENT,
            TagGroup INTEGER NOT NULL,
            TagName TEXT NOT NULL,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryCompany (
            CompanyID INTEGER PRIMARY KEY AUTOINCREMENT,
            CompanyName TEXT NOT NULL,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryItemKeyword (
            LibraryItem INTEGER NOT NULL,
            LibraryKeyword INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryItemTag (
            LibraryItem INTEGER NOT NULL,
            LibraryTag INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryPerformance (
            PerformanceID INTEGER PRIMARY KEY AUTOINCREMENT,
            LibraryItem INTEGER NOT NULL,
            PerformanceDate TEXT,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryInventory (
            InventoryID INTEGER PRIMARY KEY AUTOINCREMENT,
            LibraryItem INTEGER NOT NULL,
            InventoryDate TEXT,
            InStockDate TEXT,
            InStock INTEGER,
            LatestPrice REAL,
            AcquireCondition TEXT,
            StorageLocation TEXT,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryPart (
            PartID INTEGER PRIMARY KEY AUTOINCREMENT,
            LibraryItem INTEGER NOT NULL,
            PartName TEXT,
            OnHand INTEGER,
            Needed INTEGER,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryLoan (
            LoanID INTEGER PRIMARY KEY AUTOINCREMENT,
            LibraryItem INTEGER NOT NULL,
            LoanRecipient TEXT,
            LoanDate TEXT,
            LoanReturned TEXT,
            Comments TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS LibraryAudit (
            AuditID INTEGER PRIMARY KEY AUTOINCREMENT,
            AuditWho TEXT NOT NULL,
            AuditWhen TEXT NOT NULL,
            AuditAction TEXT NOT NULL,
            AuditTable TEXT NOT NULL,
            AuditKey TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Login account and session tables.
pub async fn create_account_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS login_account (
            account_id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_name TEXT NOT NULL UNIQUE,
            account_fullname TEXT,
            account_comment TEXT,
            account_admin INTEGER NOT NULL DEFAULT 0,
            account_readonly INTEGER NOT NULL DEFAULT 1,
            account_status TEXT NOT NULL DEFAULT 'Active',
            account_hash TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS login_session (
            sess_id TEXT PRIMARY KEY,
            sess_user TEXT NOT NULL,
            sess_start TEXT NOT NULL,
            sess_last INTEGER NOT NULL,
            sess_closed TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Report request queue.
pub async fn create_workflow_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS report_request (
            request_id INTEGER PRIMARY KEY AUTOINCREMENT,
            account TEXT NOT NULL,
            requested TEXT NOT NULL,
            parameters TEXT NOT NULL,
            elapsed REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
