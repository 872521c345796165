//! Shared application state injected into all Axum handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::EngineSettings;
use crate::domain::PlotBus;
use crate::service::PlotService;
use crate::ws::SessionCounter;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Plot service for all business logic.
    pub plot_service: Arc<PlotService>,
    /// Plot bus feeding the Socket.IO sessions.
    pub plot_bus: PlotBus,
    /// Open and historical Socket.IO sessions.
    pub sessions: SessionCounter,
    /// Engine.IO parameters announced to every session.
    pub engine: EngineSettings,
    /// Directory served as the dashboard page (`/`) and `/static`.
    pub static_dir: PathBuf,
}

impl AppState {
    /// Builds the state around a service, sharing its plot bus.
    #[must_use]
    pub fn new(plot_service: PlotService, engine: EngineSettings) -> Self {
        let plot_bus = plot_service.plot_bus().clone();
        Self {
            plot_service: Arc::new(plot_service),
            plot_bus,
            sessions: SessionCounter::new(),
            engine,
            static_dir: PathBuf::from("static"),
        }
    }

    /// Serves the dashboard page from `dir` instead of `./static`.
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }
}
