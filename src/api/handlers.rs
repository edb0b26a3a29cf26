//! Route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::api::AppState;
use crate::api::models::{CheckRequest, CheckResponse, HealthResponse, ReportRequest};
use crate::error::{AppError, Result};
use crate::models::SetId;
use crate::report::{self, render_report, report_filename};

/// Save a batch of links and queue them for checking.
pub async fn check_links(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>> {
    let Json(request) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    if request.links.is_empty() {
        return Err(AppError::validation("links is empty"));
    }

    let id = state.store.save_links(&request.links).await?;
    state.checker.check_links_async(id, &request.links);
    log::info!("Accepted link set {} with {} links", id, request.links.len());

    Ok(Json(CheckResponse::pending(id, &request.links)))
}

/// Current status of one link set.
pub async fn get_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<CheckResponse>> {
    let id: SetId = raw_id
        .parse()
        .map_err(|e| AppError::validation(format!("invalid id {raw_id:?}: {e}")))?;

    let set = state
        .store
        .get_link_set(id)
        .await
        .ok_or(AppError::NotFound { id })?;
    Ok(Json(CheckResponse::from(&set)))
}

/// Render a report for the requested sets. Unknown ids are skipped.
pub async fn get_report(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReportRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    if request.links_list.is_empty() {
        return Err(AppError::validation("links_list is empty"));
    }

    let sets = state.store.get_link_sets(&request.links_list).await;
    if sets.len() < request.links_list.len() {
        log::debug!(
            "Report requested {} sets, {} found",
            request.links_list.len(),
            sets.len()
        );
    }

    let now = Utc::now();
    let body = render_report(&sets, now)?;
    let headers = [
        (header::CONTENT_TYPE, report::CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", report_filename(now)),
        ),
    ];
    Ok((headers, body))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        time: Utc::now().to_rfc3339(),
    })
}
