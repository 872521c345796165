//! wanlog-dashboard server entry point.
//!
//! Starts the Axum HTTP server with the REST API and the Socket.IO
//! endpoint.

use wanlog_dashboard::app_state::AppState;
use wanlog_dashboard::config::DashboardConfig;
use wanlog_dashboard::domain::{Plot, PlotBus, PlotRegistry};
use wanlog_dashboard::logs::ScanDatabase;
use wanlog_dashboard::service::{PlotService, clear_log_dir};
use wanlog_dashboard::{build_app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = DashboardConfig::from_env()?;
    init_tracing(config.json_logs);
    tracing::info!(addr = %config.listen_addr, "starting wanlog-dashboard");

    // Start from an empty log directory
    if config.clear_log_dir_on_start {
        match clear_log_dir(&config.log_dir) {
            Ok(removed) => {
                tracing::info!(dir = %config.log_dir.display(), removed, "log directory cleared");
            }
            Err(e) => {
                tracing::warn!(dir = %config.log_dir.display(), error = %e, "failed to clear log directory");
            }
        }
    }

    // Build domain layer
    let registry = std::sync::Arc::new(PlotRegistry::new());
    let plot_bus = PlotBus::new(config.plot_bus_capacity);

    // Build service layer
    let mut plot_service = PlotService::new(registry, plot_bus).with_log_dir(&config.log_dir);
    if let Some(path) = &config.log_message_database {
        let database = ScanDatabase::load(path)?;
        tracing::info!(path = %path.display(), messages = database.len(), "message database loaded");
        plot_service = plot_service.with_database(database);
    }

    if config.demo_plot {
        plot_service.publish(Plot::demo()).await?;
    }

    // Build router
    let state = AppState::new(plot_service, config.engine).with_static_dir(&config.static_dir);
    let app = build_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
