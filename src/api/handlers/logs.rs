//! Log handlers: upload and problem scan.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    IngestLogRequest, IngestLogResponse, ProblemDto, ScanLogRequest, ScanLogResponse,
};
use crate::app_state::AppState;
use crate::error::{DashboardError, ErrorResponse};

/// `POST /logs` — Upload a router log and publish its plots.
///
/// # Errors
///
/// Returns [`DashboardError::InvalidRequest`] for an empty log or a bad
/// file name, and [`DashboardError::Storage`] if the log cannot be stored.
#[utoipa::path(
    post,
    path = "/api/v1/logs",
    tag = "Logs",
    summary = "Upload a log",
    description = "Stores the log, parses WAN connection states and signal quality from it and publishes the resulting plots to every dashboard session.",
    request_body = IngestLogRequest,
    responses(
        (status = 201, description = "Log ingested", body = IngestLogResponse),
        (status = 400, description = "Invalid log", body = ErrorResponse),
        (status = 500, description = "Log could not be stored", body = ErrorResponse),
    )
)]
pub async fn ingest_log(
    State(state): State<AppState>,
    Json(req): Json<IngestLogRequest>,
) -> Result<impl IntoResponse, DashboardError> {
    let ingested = state
        .plot_service
        .ingest_log(&req.name, req.contents)
        .await?;

    let response = IngestLogResponse {
        name: ingested.name,
        plots: ingested.plots,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /logs/scan` — Match a log against the known-message database.
///
/// # Errors
///
/// Returns [`DashboardError::ScanUnavailable`] when no database is
/// loaded and [`DashboardError::InvalidCategory`] for an unknown category.
#[utoipa::path(
    post,
    path = "/api/v1/logs/scan",
    tag = "Logs",
    summary = "Scan a log for known problems",
    description = "Matches every line against the message database patterns of the selected categories (all by default).",
    request_body = ScanLogRequest,
    responses(
        (status = 200, description = "Scan result", body = ScanLogResponse),
        (status = 400, description = "Unknown category", body = ErrorResponse),
        (status = 404, description = "No message database loaded", body = ErrorResponse),
    )
)]
pub async fn scan_log(
    State(state): State<AppState>,
    Json(req): Json<ScanLogRequest>,
) -> Result<impl IntoResponse, DashboardError> {
    let problems = state
        .plot_service
        .scan_log(&req.contents, req.categories.as_deref())?;

    let report = problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n");
    let response = ScanLogResponse {
        count: problems.len(),
        problems: problems.into_iter().map(ProblemDto::from).collect(),
        report,
    };
    Ok(Json(response))
}

/// Log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logs", post(ingest_log))
        .route("/logs/scan", post(scan_log))
}
