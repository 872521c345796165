//! Axum handler for the Engine.IO endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::connection::{SessionContext, run_connection};
use crate::app_state::AppState;
use crate::protocol::ENGINE_IO_VERSION;

/// Engine.IO handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct EngineQuery {
    /// Protocol revision, must be `4`.
    #[serde(rename = "EIO")]
    pub eio: Option<String>,
    /// Transport, must be `websocket`.
    pub transport: Option<String>,
}

/// `GET /socket.io/` — Upgrade to an Engine.IO WebSocket session.
///
/// Only the `websocket` transport of Engine.IO v4 is served. Other
/// requests get an Engine.IO error body with status 400.
pub async fn socket_io_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(query): Query<EngineQuery>,
    State(state): State<AppState>,
) -> Response {
    let version = ENGINE_IO_VERSION.to_string();
    if query.eio.as_deref() != Some(version.as_str()) {
        return engine_error(5, "Unsupported protocol version");
    }
    if query.transport.as_deref() != Some("websocket") {
        return engine_error(0, "Transport unknown");
    }
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!(%rejection, "socket.io request without upgrade");
            return engine_error(3, "Bad request");
        }
    };

    let ctx = SessionContext {
        plot_rx: state.plot_bus.subscribe(),
        plot_service: Arc::clone(&state.plot_service),
        engine: state.engine,
        guard: state.sessions.open(),
    };
    ws.on_upgrade(move |socket| run_connection(socket, ctx))
}

/// Engine.IO error body, e.g. `{"code":0,"message":"Transport unknown"}`.
fn engine_error(code: u8, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "code": code, "message": message })),
    )
        .into_response()
}
