//! Plot handlers: list, get, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PaginationParams, PlotListResponse};
use crate::app_state::AppState;
use crate::domain::{Plot, PlotId};
use crate::error::{DashboardError, ErrorResponse};

/// `GET /plots` — List published plots with pagination and optional
/// source filter.
///
/// # Errors
///
/// Returns [`DashboardError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/plots",
    tag = "Plots",
    summary = "List plots",
    description = "Returns a paginated list of published plots in publication order, optionally filtered by the log they were built from.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated plot list", body = PlotListResponse),
    )
)]
pub async fn list_plots(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, DashboardError> {
    let params = params.clamped();
    let summaries = state
        .plot_service
        .list_plots(params.source.as_deref())
        .await;

    let pagination = params.meta(summaries.len());
    let data = summaries
        .into_iter()
        .skip(params.offset())
        .take(params.per_page as usize)
        .collect();

    Ok(Json(PlotListResponse { data, pagination }))
}

/// `GET /plots/:id` — Full plot with every series and point.
///
/// # Errors
///
/// Returns [`DashboardError::PlotNotFound`] if the plot does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/plots/{id}",
    tag = "Plots",
    summary = "Get plot",
    description = "Returns the plot exactly as it is sent to dashboard sessions in a `plots` event.",
    params(
        ("id" = uuid::Uuid, Path, description = "Plot UUID"),
    ),
    responses(
        (status = 200, description = "Plot", body = Plot),
        (status = 404, description = "Plot not found", body = ErrorResponse),
    )
)]
pub async fn get_plot(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, DashboardError> {
    let plot = state.plot_service.get_plot(PlotId::from_uuid(id)).await?;
    Ok(Json(Plot::clone(&plot)))
}

/// `DELETE /plots/:id` — Remove a plot from the registry.
///
/// Sessions that already received it keep it; new sessions no longer
/// get it in their replay.
///
/// # Errors
///
/// Returns [`DashboardError::PlotNotFound`] if the plot does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/plots/{id}",
    tag = "Plots",
    summary = "Delete a plot",
    description = "Removes a plot so it is no longer replayed to new sessions.",
    params(
        ("id" = uuid::Uuid, Path, description = "Plot UUID"),
    ),
    responses(
        (status = 204, description = "Plot deleted"),
        (status = 404, description = "Plot not found", body = ErrorResponse),
    )
)]
pub async fn delete_plot(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, DashboardError> {
    state
        .plot_service
        .remove_plot(PlotId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Plot routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plots", get(list_plots))
        .route("/plots/{id}", get(get_plot).delete(delete_plot))
}
