//! Domain layer: plot model, plot registry and broadcast bus.
//!
//! This module contains the server-side domain model: plot identity, the
//! plot payloads built from parsed logs, the bus that fans plots out to
//! Socket.IO sessions, and the registry that keeps the latest plots.

pub mod plot;
pub mod plot_bus;
pub mod plot_id;
pub mod plot_registry;

pub use plot::{AxisValue, Plot, PlotKind, PlotPoint, PlotSeries, PlotSummary};
pub use plot_bus::PlotBus;
pub use plot_id::PlotId;
pub use plot_registry::PlotRegistry;
