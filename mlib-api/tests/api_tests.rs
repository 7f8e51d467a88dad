//! Integration tests for the HTTP API: sessions, record editing, the
//! generic lookup endpoints, and report submission/execution over the
//! router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

use mlib_api::{build_router, AppState};

/// One connection so every query sees the same in-memory database.
async fn setup_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    mlib_common::db::init::create_tables(&pool)
        .await
        .expect("Should create schema");
    pool
}

fn setup_app(db: SqlitePool) -> Router {
    build_router(AppState::new(db))
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Insert a login account directly; hashing goes through the same helper
/// the handlers use.
async fn insert_account(pool: &SqlitePool, name: &str, password: &str, readonly: bool) {
    sqlx::query(
        r#"
        INSERT INTO login_account (account_name, account_readonly, account_hash)
             VALUES (?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(readonly as i64)
    .bind(mlib_common::auth::hash_password(password))
    .execute(pool)
    .await
    .unwrap();
}

async fn login(app: &Router, name: &str, password: &str) -> String {
    let body = json!({ "username": name, "password": password });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/session", None, Some(&body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Should set a session cookie")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

// =============================================================================
// Health and sessions
// =============================================================================

#[tokio::test]
async fn health_endpoint_reports_the_module() {
    let app = setup_app(setup_db().await);

    let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mlib-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn empty_account_table_bootstraps_an_admin() {
    let app = setup_app(setup_db().await);

    let response = app.oneshot(request("GET", "/api/session", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "[init]");
    assert_eq!(body["admin"], true);
}

#[tokio::test]
async fn login_logout_lifecycle() {
    let pool = setup_db().await;
    insert_account(&pool, "martha", "s3cret", false).await;
    let app = setup_app(pool);

    // Wrong password is rejected.
    let body = json!({ "username": "martha", "password": "wrong" });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/session", None, Some(&body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = login(&app, "martha", "s3cret").await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/session", Some(&cookie), None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "martha");

    let response = app
        .clone()
        .oneshot(request("DELETE", "/api/session", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The closed session no longer resolves to an account.
    let response = app
        .clone()
        .oneshot(request("GET", "/api/session", Some(&cookie), None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert!(body.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn writes_require_a_login_once_accounts_exist() {
    let pool = setup_db().await;
    insert_account(&pool, "martha", "s3cret", false).await;
    insert_account(&pool, "visitor", "visitor", true).await;
    let app = setup_app(pool);

    let body = json!({ "ItemTitle": "Test Piece" });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/item", None, Some(&body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A read-only login is refused with 403 rather than 401.
    let cookie = login(&app, "visitor", "visitor").await;
    let response = app
        .clone()
        .oneshot(request("POST", "/api/item", Some(&cookie), Some(&body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Records (bootstrap admin, empty account table)
// =============================================================================

#[tokio::test]
async fn item_crud_through_the_router() {
    let pool = setup_db().await;
    let app = setup_app(pool.clone());

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/person",
            None,
            Some(&json!({ "LastName": "Fauré", "FirstName": "Gabriel" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let person = extract_json(response.into_body()).await;
    let person_id = person["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/keyword",
            None,
            Some(&json!({ "LookupValue": "Brass" })),
        ))
        .await
        .unwrap();
    let keyword_id = extract_json(response.into_body()).await["id"].as_i64().unwrap();

    let item = json!({
        "ItemTitle": "Pavane",
        "ComposerID": person_id,
        "Keywords": [keyword_id],
        "Parts": [{ "PartName": "Trumpet", "OnHand": 2, "Needed": 4 }],
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/item", None, Some(&item)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let item_id = extract_json(response.into_body()).await["ItemID"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/item/{item_id}"), None, None))
        .await
        .unwrap();
    let record = extract_json(response.into_body()).await;
    assert_eq!(record["ItemTitle"], "Pavane");
    assert_eq!(record["AddedBy"], "[init]");
    assert_eq!(record["Keywords"], json!([keyword_id]));
    assert_eq!(record["Parts"][0]["PartName"], "Trumpet");

    // The stored sort key is transliterated and carries the composer.
    let sort_key: String = sqlx::query_scalar("SELECT SortKey FROM LibraryItem WHERE ItemID = ?")
        .bind(item_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(sort_key.starts_with("pavane\tfaure\t"));

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/item/{item_id}"),
            None,
            Some(&json!({ "ItemTitle": "Pavane, Op. 50", "Keywords": [] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/item/{item_id}"), None, None))
        .await
        .unwrap();
    let record = extract_json(response.into_body()).await;
    assert_eq!(record["ItemTitle"], "Pavane, Op. 50");
    assert_eq!(record["Keywords"], json!([]));
    assert_eq!(record["ModifiedBy"], "[init]");

    // Every mutation left an audit row.
    let audits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM LibraryAudit")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(audits >= 4);

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/item/{item_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/item/{item_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_search_matches_the_composer_sort_key() {
    let pool = setup_db().await;
    sqlx::query(
        r#"
        INSERT INTO LibraryItem
            (ItemID, ItemTitle, DateAdded, AddedBy, ComposerSortKey) VALUES
            (1, 'Symphony No. 5', '2020-05-01', 'martha', 'beethoven, ludwig van'),
            (2, 'Pavane', '2021-01-15', 'john', 'faure, gabriel')
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/item?composer_arranger=Beethoven", None, None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["ItemTitle"], "Symphony No. 5");

    // Accented queries fold to the transliterated sort key.
    let response = app
        .clone()
        .oneshot(request("GET", "/api/item?composer_arranger=Faur%C3%A9", None, None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["ItemTitle"], "Pavane");
}

#[tokio::test]
async fn referenced_lookup_records_cannot_be_deleted() {
    let pool = setup_db().await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/season",
            None,
            Some(&json!({ "LookupValue": "Easter" })),
        ))
        .await
        .unwrap();
    let season_id = extract_json(response.into_body()).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/item",
            None,
            Some(&json!({ "ItemTitle": "Anthem", "SeasonID": season_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/season/{season_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The picklist endpoint still serves it.
    let response = app
        .clone()
        .oneshot(request("GET", "/api/season", None, None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["records"][0]["display"], "Easter");
}

#[tokio::test]
async fn unknown_slugs_are_not_found() {
    let app = setup_app(setup_db().await);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/astrology-sign", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Reports over HTTP
// =============================================================================

async fn seed_minimal_catalog(pool: &SqlitePool) {
    sqlx::query(
        r#"
        INSERT INTO LibraryItem (ItemID, ItemTitle, DateAdded, AddedBy) VALUES
            (1, 'Symphony No. 5', '2020-05-01', 'martha'),
            (2, 'Quartet', '2021-01-15', 'john')
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn report_round_trip_in_json_mode() {
    let pool = setup_db().await;
    seed_minimal_catalog(&pool).await;
    let app = setup_app(pool);

    let blob = json!({ "title": "Catalog", "columns": ["Item ID", "Title"] });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/report", None, Some(&blob)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let request_id = extract_json(response.into_body()).await["request_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/report/{request_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["title"], "Catalog");
    assert_eq!(body["columns"], json!(["Item ID", "Title"]));
    assert_eq!(body["rows"], json!([["000001", "Symphony No. 5"], ["000002", "Quartet"]]));
    assert!(body["elapsed"].is_number());
}

#[tokio::test]
async fn report_round_trip_in_spreadsheet_mode() {
    let pool = setup_db().await;
    seed_minimal_catalog(&pool).await;
    let app = setup_app(pool);

    let blob = json!({
        "title": "Catalog",
        "output": "xlsx",
        "columns": ["Item ID", "Title"],
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/report", None, Some(&blob)))
        .await
        .unwrap();
    let request_id = extract_json(response.into_body()).await["request_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/report/{request_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = headers.get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"Catalog "));
    let echoed = headers.get("X-Filename").unwrap().to_str().unwrap();
    assert!(echoed.ends_with(&format!("-{request_id}.xlsx")));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    // Workbooks are zip containers.
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn accented_titles_keep_the_download_headers() {
    let pool = setup_db().await;
    seed_minimal_catalog(&pool).await;
    let app = setup_app(pool);

    let blob = json!({
        "title": "Fauré Catalog",
        "output": "xlsx",
        "columns": ["Title"],
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/report", None, Some(&blob)))
        .await
        .unwrap();
    let request_id = extract_json(response.into_body()).await["request_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/report/{request_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    let disposition = headers.get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"Faure Catalog "));
    let echoed = headers.get("X-Filename").unwrap().to_str().unwrap();
    assert!(echoed.starts_with("Faure Catalog "));
    assert!(echoed.ends_with(&format!("-{request_id}.xlsx")));
}

#[tokio::test]
async fn invalid_report_parameters_are_rejected_at_submission() {
    let app = setup_app(setup_db().await);

    let blob = json!({ "columns": ["Shoe Size"] });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/report", None, Some(&blob)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was stored, so no id can reach the runner.
    let response = app
        .clone()
        .oneshot(request("GET", "/api/report/1", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn report_column_names_are_listed() {
    let app = setup_app(setup_db().await);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/report/columns", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let names = body["columns"].as_array().unwrap();
    assert!(names.iter().any(|n| n == "Title"));
    assert!(names.iter().any(|n| n == "Copies On Hand"));
}
