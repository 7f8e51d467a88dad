//! Session resolution and authorization guards.
//!
//! Sessions are our own rows keyed by a uuid carried in the `MLSESSID`
//! cookie. Every request resolves the cookie to an account up front; the
//! guards on [`CurrentUser`] are called by handlers that mutate data.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use mlib_common::db::models::{Account, SessionRow};
use sqlx::SqlitePool;

use crate::{ApiError, AppState};

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "MLSESSID";

/// Sessions idle longer than this are closed on sight.
const IDLE_LIMIT_SECS: i64 = 60 * 60 * 48;

/// The account (if any) resolved for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account: Option<Account>,
    pub session_id: Option<String>,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self { account: None, session_id: None }
    }

    pub fn name(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.account_name.as_str())
    }

    /// Require a logged-in account.
    pub fn require_account(&self) -> Result<&Account, ApiError> {
        self.account
            .as_ref()
            .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))
    }

    /// Require an account allowed to modify the catalog.
    pub fn require_write(&self) -> Result<&Account, ApiError> {
        let account = self.require_account()?;
        if !account.is_active() {
            tracing::warn!("account {} has been retired", account.account_name);
            return Err(ApiError::Forbidden("Account closed".to_string()));
        }
        if account.is_readonly() {
            tracing::warn!("account {} is read-only", account.account_name);
            return Err(ApiError::Forbidden("Action forbidden".to_string()));
        }
        Ok(account)
    }

    /// Require an account allowed to perform administrative tasks.
    pub fn require_admin(&self) -> Result<&Account, ApiError> {
        let account = self.require_account()?;
        if !account.is_admin() {
            return Err(ApiError::Forbidden("Action forbidden".to_string()));
        }
        Ok(account)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(&state.db, &parts.headers).await
    }
}

/// Resolve the session cookie to an account.
///
/// Until the first account exists, every request acts as a synthetic
/// admin so the database can be initialized through the normal account
/// endpoints.
pub async fn resolve_user(db: &SqlitePool, headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login_account")
        .fetch_one(db)
        .await?;
    if accounts == 0 {
        return Ok(CurrentUser {
            account: Some(bootstrap_account()),
            session_id: None,
        });
    }

    let Some(session_id) = cookie_value(headers, SESSION_COOKIE) else {
        return Ok(CurrentUser::anonymous());
    };

    let session: Option<SessionRow> =
        sqlx::query_as("SELECT * FROM login_session WHERE sess_id = ?")
            .bind(&session_id)
            .fetch_optional(db)
            .await?;
    let Some(session) = session else {
        return Ok(CurrentUser::anonymous());
    };

    if let Some(closed) = &session.sess_closed {
        tracing::debug!("session {} closed {}", session.sess_id, closed);
        return Ok(CurrentUser::anonymous());
    }

    let now = chrono::Utc::now().timestamp();
    if now - session.sess_last > IDLE_LIMIT_SECS {
        close_session(db, &session.sess_id).await?;
        return Ok(CurrentUser::anonymous());
    }

    sqlx::query("UPDATE login_session SET sess_last = ? WHERE sess_id = ?")
        .bind(now)
        .bind(&session.sess_id)
        .execute(db)
        .await?;

    let account: Option<Account> =
        sqlx::query_as("SELECT * FROM login_account WHERE account_name = ?")
            .bind(&session.sess_user)
            .fetch_optional(db)
            .await?;

    Ok(CurrentUser { account, session_id: Some(session_id) })
}

/// Stamp a session row as closed.
pub async fn close_session(db: &SqlitePool, session_id: &str) -> Result<(), ApiError> {
    let localtime = localtime_now();
    sqlx::query("UPDATE login_session SET sess_closed = ? WHERE sess_id = ?")
        .bind(&localtime)
        .bind(session_id)
        .execute(db)
        .await?;
    tracing::info!("closed session {} at {}", session_id, localtime);
    Ok(())
}

/// Pull one cookie's value out of the Cookie header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        if let Some((key, value)) = pair.trim().split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// ISO-formatted local timestamp with microseconds, used for audit and
/// modification stamps.
pub fn localtime_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn bootstrap_account() -> Account {
    Account {
        account_id: 0,
        account_name: "[init]".to_string(),
        account_fullname: Some("Database Initialization".to_string()),
        account_comment: None,
        account_admin: 1,
        account_readonly: 0,
        account_status: "Active".to_string(),
        account_hash: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn cookie_parsing_finds_the_session_id() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; MLSESSID=abc-123; lang=en".parse().unwrap());
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc-123".to_string()));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn missing_cookie_header_is_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), None);
    }
}
