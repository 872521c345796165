//! Service layer: business logic orchestration.
//!
//! [`PlotService`] turns uploaded logs into plots, stores them in the
//! [`super::domain::PlotRegistry`] and emits them through the
//! [`super::domain::PlotBus`].

pub mod plot_service;

pub use plot_service::{IngestedLog, PlotService, clear_log_dir};
