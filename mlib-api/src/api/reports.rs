//! Report request and execution endpoints.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::report::{self, params::OutputFormat, store, xlsx};
use crate::session::CurrentUser;
use crate::{ApiError, ApiResult, AppState};
use mlib_common::config::columns::REPORT_COLUMNS;
use mlib_common::text::transliterate;

/// Download filename as it may appear in a response header: diacritics
/// folded to ASCII, anything else unprintable replaced.
fn header_safe(name: &str) -> String {
    transliterate(name)
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

/// GET /api/report/columns — column names offerable on the report form.
pub async fn list_columns() -> Json<Value> {
    let names: Vec<&str> = REPORT_COLUMNS.iter().map(|col| col.name).collect();
    Json(json!({ "status": "success", "columns": names }))
}

/// POST /api/report — store a parameter blob and issue a request id.
///
/// Parameters are validated before the insert, so a stored request is
/// always runnable. The id is only returned after a successful insert.
pub async fn queue_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let who = user.require_account()?.account_name.clone();
    report::params::ReportParams::parse(&payload)?;
    let request_id = store::save_request(&state.db, &who, &payload).await?;

    tracing::info!("{} queued report request {}", who, request_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "request_id": request_id })),
    ))
}

/// GET /api/report/:id — run a stored request.
///
/// Returns the JSON envelope, or the workbook bytes as an attachment when
/// the stored parameters ask for a spreadsheet.
pub async fn run_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let output = report::run_report(&state.db, id).await?;

    match output.output {
        OutputFormat::Json => {
            let names: Vec<&str> = output.columns.iter().map(|col| col.name).collect();
            Ok(Json(json!({
                "status": "success",
                "title": output.title,
                "columns": names,
                "rows": output.rows,
                "elapsed": output.elapsed,
            }))
            .into_response())
        }
        OutputFormat::Xlsx => {
            let bytes = xlsx::render_workbook(&output.title, &output.columns, &output.rows)?;
            let filename = header_safe(&xlsx::report_filename(&output.title, output.request_id));
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ),
            );
            let disposition = format!("attachment; filename=\"{}\"", filename);
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition)
                    .map_err(|e| ApiError::Internal(format!("bad disposition header: {e}")))?,
            );
            // Echoed separately so browser-side code can read the name
            // without parsing Content-Disposition.
            headers.insert(
                "X-Filename",
                HeaderValue::from_str(&filename)
                    .map_err(|e| ApiError::Internal(format!("bad filename header: {e}")))?,
            );
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok((headers, bytes).into_response())
        }
    }
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/report", post(queue_report))
        .route("/api/report/columns", get(list_columns))
        .route("/api/report/:id", get(run_report))
}

#[cfg(test)]
mod tests {
    use super::header_safe;

    #[test]
    fn filenames_fold_to_printable_ascii() {
        assert_eq!(
            header_safe("Fauré Catalog 20260830-3.xlsx"),
            "Faure Catalog 20260830-3.xlsx"
        );
        assert_eq!(header_safe("a\"b\\c\u{7}d"), "a_b_c_d");
    }
}
