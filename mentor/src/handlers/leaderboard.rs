//! Leaderboard handlers
//!
//! Supports content negotiation: Accept: application/json for JSON, otherwise text/plain.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::domain::entities::GroupId;
use crate::domain::ports::EvaluationRepository;
use crate::error::AppError;
use crate::handlers::AppState;
use crate::leaderboard::{render_dashboard_html, render_group_detail, render_table};

/// Check if the client wants JSON response
fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false)
}

fn plain_text(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// GET /
///
/// HTML dashboard
pub async fn get_dashboard<R: EvaluationRepository>(
    State(state): State<AppState<R>>,
) -> Result<Html<String>, AppError> {
    let rows = state.leaderboard.leaderboard().await?;
    Ok(Html(render_dashboard_html(&rows)))
}

/// GET /leaderboard
///
/// - Accept: application/json → JSON rows
/// - Otherwise → markdown table
pub async fn get_leaderboard<R: EvaluationRepository>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let rows = state.leaderboard.leaderboard().await?;

    if wants_json(&headers) {
        Ok(Json(rows).into_response())
    } else {
        Ok(plain_text(render_table(&rows)))
    }
}

/// GET /groups/:number
///
/// One group's record with justifications; 404 when never evaluated.
pub async fn get_group<R: EvaluationRepository>(
    State(state): State<AppState<R>>,
    Path(number): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let record = state.leaderboard.group_detail(GroupId(number)).await?;

    if wants_json(&headers) {
        Ok(Json(record).into_response())
    } else {
        Ok(plain_text(render_group_detail(&record)))
    }
}
