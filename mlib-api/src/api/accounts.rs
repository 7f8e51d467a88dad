//! Login account administration (admin only).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::record_audit;
use crate::session::CurrentUser;
use crate::{ApiResult, AppState};
use mlib_common::db::models::Account;

#[derive(Debug, Deserialize)]
pub struct AccountPayload {
    pub account_name: Option<String>,
    pub account_fullname: Option<String>,
    pub account_password: Option<String>,
    pub account_comment: Option<String>,
    #[serde(default)]
    pub account_admin: bool,
    #[serde(default = "default_readonly")]
    pub account_readonly: bool,
    pub account_status: Option<String>,
}

fn default_readonly() -> bool {
    true
}

/// GET /api/account — list all login accounts.
pub async fn list_accounts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Account>>> {
    user.require_admin()?;
    let accounts: Vec<Account> =
        sqlx::query_as("SELECT * FROM login_account ORDER BY account_name")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(accounts))
}

/// GET /api/account/:id — fetch one account for editing.
pub async fn get_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Account>> {
    user.require_admin()?;
    let account: Option<Account> =
        sqlx::query_as("SELECT * FROM login_account WHERE account_id = ?")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    match account {
        Some(account) => Ok(Json(account)),
        None => Err(crate::ApiError::NotFound(format!("account {} not found", id))),
    }
}

/// POST /api/account — create a login account.
pub async fn create_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AccountPayload>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let admin = user.require_admin()?.account_name.clone();

    let hash = payload
        .account_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(mlib_common::auth::hash_password);

    let mut tx = state.db.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT INTO login_account (account_name, account_fullname, account_comment,
                                   account_admin, account_readonly, account_status,
                                   account_hash)
             VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.account_name)
    .bind(&payload.account_fullname)
    .bind(&payload.account_comment)
    .bind(payload.account_admin as i64)
    .bind(payload.account_readonly as i64)
    .bind(payload.account_status.as_deref().unwrap_or("Active"))
    .bind(&hash)
    .execute(&mut *tx)
    .await?;
    let account_id = result.last_insert_rowid();
    record_audit(&mut tx, &admin, "INSERT", "login_account", &account_id.to_string()).await?;
    tx.commit().await?;

    tracing::info!("{} created account {}", admin, account_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "account_id": account_id })),
    ))
}

/// PUT /api/account/:id — update a login account.
///
/// The password only changes when a new one is supplied.
pub async fn update_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AccountPayload>,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = user.require_admin()?.account_name.clone();

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        UPDATE login_account
           SET account_name = ?,
               account_fullname = ?,
               account_comment = ?,
               account_admin = ?,
               account_readonly = ?,
               account_status = ?
         WHERE account_id = ?
        "#,
    )
    .bind(&payload.account_name)
    .bind(&payload.account_fullname)
    .bind(&payload.account_comment)
    .bind(payload.account_admin as i64)
    .bind(payload.account_readonly as i64)
    .bind(payload.account_status.as_deref().unwrap_or("Active"))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let Some(password) = payload.account_password.as_deref().filter(|p| !p.is_empty()) {
        let hash = mlib_common::auth::hash_password(password);
        sqlx::query("UPDATE login_account SET account_hash = ? WHERE account_id = ?")
            .bind(&hash)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    record_audit(&mut tx, &admin, "UPDATE", "login_account", &id.to_string()).await?;
    tx.commit().await?;

    Ok(Json(json!({ "status": "success", "account_id": id })))
}

/// DELETE /api/account/:id — used for testing; not exposed in the front end.
pub async fn delete_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    user.require_admin()?;
    sqlx::query("DELETE FROM login_account WHERE account_id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(Json(json!({ "status": "success" })))
}

/// Build account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/account", get(list_accounts).post(create_account))
        .route(
            "/api/account/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
}
