//! # wanlog-dashboard
//!
//! Real-time dashboard for router syslogs, plus the client that follows it.
//!
//! The server parses uploaded logs into WAN connection-state and signal
//! quality plots and streams them to browsers over Socket.IO as `plots`
//! events. The subscriber connects to a dashboard once, joins the default
//! namespace and logs every `plots` event it receives.
//!
//! ## Architecture
//!
//! ```text
//! Browsers / subscriber (Socket.IO over WebSocket)    REST clients
//!     │                                                   │
//!     ├── Socket.IO server (ws/)                          ├── REST handlers (api/)
//!     │                                                   │
//!     └──────────────── PlotService (service/) ───────────┘
//!                           │
//!                           ├── PlotBus / PlotRegistry (domain/)
//!                           └── Log parsers and scanner (logs/)
//!
//! subscriber/ ── Engine.IO / Socket.IO codec (protocol/) ── ws/
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod logs;
pub mod protocol;
pub mod service;
pub mod subscriber;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::socket_io_handler;

/// Full dashboard router: the dashboard page at `/`, its scripts under
/// `/static`, the REST API and the Socket.IO endpoint.
pub fn build_app(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();
    Router::new()
        .merge(api::build_router())
        .route("/socket.io", get(socket_io_handler))
        .route("/socket.io/", get(socket_io_handler))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. `json`
/// switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
