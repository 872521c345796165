//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "wanlog-dashboard",
        description = "Router log dashboard: uploads logs, builds WAN state and signal quality plots and streams them over Socket.IO."
    ),
    paths(
        handlers::system::health_handler,
        handlers::plots::list_plots,
        handlers::plots::get_plot,
        handlers::plots::delete_plot,
        handlers::logs::ingest_log,
        handlers::logs::scan_log,
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Plots", description = "Published plots"),
        (name = "Logs", description = "Log upload and problem scans"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_path() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/health",
            "/api/v1/plots",
            "/api/v1/plots/{id}",
            "/api/v1/logs",
            "/api/v1/logs/scan",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
