//! Login session endpoints.
//!
//! We do our own session management: a uuid row in `login_session`,
//! carried by the `MLSESSID` cookie with a year-long expiry. Idle and
//! closed sessions are handled during resolution (see [`crate::session`]).

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::session::{self, CurrentUser, SESSION_COOKIE};
use crate::{ApiError, ApiResult, AppState};
use mlib_common::db::models::Account;

const COOKIE_LIFETIME_SECS: i64 = 60 * 60 * 24 * 365;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/session — log in.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("login attempt for {}", payload.username);

    let account: Option<Account> =
        sqlx::query_as("SELECT * FROM login_account WHERE account_name = ?")
            .bind(&payload.username)
            .fetch_optional(&state.db)
            .await?;

    let Some(account) = account else {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };
    let verified = account
        .account_hash
        .as_deref()
        .map(|hash| mlib_common::auth::verify_password(&payload.password, hash))
        .unwrap_or(false);
    if !verified {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }
    if !account.is_active() {
        return Err(ApiError::Unauthorized("Account retired".to_string()));
    }

    let session_id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO login_session (sess_id, sess_user, sess_start, sess_last)
             VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session_id)
    .bind(&account.account_name)
    .bind(session::localtime_now())
    .bind(chrono::Utc::now().timestamp())
    .execute(&state.db)
    .await?;
    tracing::info!("created session {}", session_id);

    let cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id, COOKIE_LIFETIME_SECS
    );
    let body = json!({
        "status": "success",
        "account": {
            "id": account.account_id,
            "name": account.account_name,
            "fullname": account.account_fullname,
            "readonly": account.is_readonly(),
            "admin": account.is_admin(),
        },
    });
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(body)))
}

/// GET /api/session — describe the current login, if any.
pub async fn current_session(user: CurrentUser) -> Json<serde_json::Value> {
    match user.account {
        Some(account) if account.is_active() => Json(json!({
            "id": account.account_id,
            "name": account.account_name,
            "fullname": account.account_fullname,
            "readonly": account.is_readonly(),
            "admin": account.is_admin(),
            "active": true,
        })),
        _ => Json(json!({})),
    }
}

/// DELETE /api/session — log out.
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let Some(session_id) = user.session_id else {
        return Ok((
            StatusCode::OK,
            AppendHeaders([(SET_COOKIE, expired_cookie())]),
            Json(json!({ "status": "warning", "message": "Not logged in" })),
        ));
    };

    session::close_session(&state.db, &session_id).await?;
    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, expired_cookie())]),
        Json(json!({ "status": "success", "message": "Logout successful" })),
    ))
}

fn expired_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new().route(
        "/api/session",
        post(login).get(current_session).delete(logout),
    )
}
