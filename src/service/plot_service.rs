//! Plot service: turns logs into plots and emits them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{Plot, PlotBus, PlotId, PlotRegistry, PlotSummary};
use crate::error::DashboardError;
use crate::logs::{LogCategory, LogFile, LogScanner, Problem, ScanDatabase};

/// Outcome of [`PlotService::ingest_log`].
#[derive(Debug, Clone)]
pub struct IngestedLog {
    /// File name the log was stored under.
    pub name: String,
    /// Plots published from it, in publication order.
    pub plots: Vec<PlotSummary>,
}

/// Orchestration layer for plot publication and log processing.
///
/// Owns references to [`PlotRegistry`] for state and [`PlotBus`] for
/// emission. Every publication follows the pattern: build plot → insert
/// into registry → publish on the bus.
#[derive(Debug, Clone)]
pub struct PlotService {
    registry: Arc<PlotRegistry>,
    plot_bus: PlotBus,
    log_dir: Option<PathBuf>,
    database: Option<Arc<ScanDatabase>>,
}

impl PlotService {
    /// Creates a new `PlotService` that neither stores logs nor scans them.
    #[must_use]
    pub fn new(registry: Arc<PlotRegistry>, plot_bus: PlotBus) -> Self {
        Self {
            registry,
            plot_bus,
            log_dir: None,
            database: None,
        }
    }

    /// Stores a copy of every ingested log under `dir`.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Enables problem scans against `database`.
    #[must_use]
    pub fn with_database(mut self, database: ScanDatabase) -> Self {
        self.database = Some(Arc::new(database));
        self
    }

    /// Returns a reference to the inner [`PlotBus`].
    #[must_use]
    pub fn plot_bus(&self) -> &PlotBus {
        &self.plot_bus
    }

    /// Returns a reference to the inner [`PlotRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PlotRegistry> {
        &self.registry
    }

    /// Stores and broadcasts a plot.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError`] if a plot with the same ID exists.
    pub async fn publish(&self, plot: Plot) -> Result<PlotId, DashboardError> {
        let plot = Arc::new(plot);
        let id = self.registry.insert(Arc::clone(&plot)).await?;
        let receivers = self.plot_bus.publish(Arc::clone(&plot));
        tracing::info!(plot_id = %id, title = %plot.title, receivers, "plot published");
        Ok(id)
    }

    /// Parses a log and publishes every plot it yields.
    ///
    /// The log is first written to the log directory when one is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidRequest`] for an empty log or a
    /// name that is not a plain file name, and [`DashboardError::Storage`]
    /// if the copy cannot be written.
    pub async fn ingest_log(
        &self,
        name: &str,
        contents: String,
    ) -> Result<IngestedLog, DashboardError> {
        let file_name = validate_log_name(name)?;
        if contents.trim().is_empty() {
            return Err(DashboardError::InvalidRequest("log is empty".to_string()));
        }

        if let Some(dir) = &self.log_dir {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| DashboardError::Storage(e.to_string()))?;
            let path = dir.join(&file_name);
            tokio::fs::write(&path, contents.as_bytes())
                .await
                .map_err(|e| DashboardError::Storage(e.to_string()))?;
            tracing::debug!(path = %path.display(), "log stored");
        }

        let log = LogFile::from_text(file_name.clone(), contents);
        let plots = Plot::from_log(&log);
        let mut summaries = Vec::with_capacity(plots.len());
        for plot in plots {
            summaries.push(PlotSummary::from(&plot));
            self.publish(plot).await?;
        }

        tracing::info!(log = %file_name, plots = summaries.len(), "log ingested");
        Ok(IngestedLog {
            name: file_name,
            plots: summaries,
        })
    }

    /// Scans a log for known problem messages.
    ///
    /// `categories` restricts the scan; `None` scans every category.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::ScanUnavailable`] when no database is
    /// configured and [`DashboardError::InvalidCategory`] for an unknown
    /// category.
    pub fn scan_log(
        &self,
        contents: &str,
        categories: Option<&[String]>,
    ) -> Result<Vec<Problem>, DashboardError> {
        let database = self
            .database
            .as_deref()
            .ok_or(DashboardError::ScanUnavailable)?;

        let mut scanner = LogScanner::new(database);
        if let Some(names) = categories {
            let selected = names
                .iter()
                .map(|n| LogCategory::parse(n))
                .collect::<Result<Vec<_>, _>>()?;
            scanner = scanner.only(selected);
        }

        let problems = scanner.scan(&LogFile::from_text("scan", contents));
        tracing::info!(problems = problems.len(), "log scanned");
        Ok(problems)
    }

    /// Returns a plot by ID.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::PlotNotFound`] if it does not exist.
    pub async fn get_plot(&self, id: PlotId) -> Result<Arc<Plot>, DashboardError> {
        self.registry.get(id).await
    }

    /// Removes a plot.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::PlotNotFound`] if it does not exist.
    pub async fn remove_plot(&self, id: PlotId) -> Result<(), DashboardError> {
        self.registry.remove(id).await?;
        tracing::info!(plot_id = %id, "plot removed");
        Ok(())
    }

    /// Lists plot summaries, optionally filtered by source.
    pub async fn list_plots(&self, source: Option<&str>) -> Vec<PlotSummary> {
        self.registry.list(source).await
    }

    /// Every current plot, for replay to a new session.
    pub async fn snapshot(&self) -> Vec<Arc<Plot>> {
        self.registry.snapshot().await
    }
}

/// Deletes every `*.log` file directly inside `dir`.
///
/// A missing directory counts as empty. Returns the number of files removed.
///
/// # Errors
///
/// Returns the first I/O error other than a missing directory.
pub fn clear_log_dir(dir: &Path) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut removed = 0usize;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "log") {
            std::fs::remove_file(&path)?;
            removed = removed.saturating_add(1);
        }
    }
    Ok(removed)
}

/// Accepts plain file names only; appends `.log` when missing.
fn validate_log_name(name: &str) -> Result<String, DashboardError> {
    let name = name.trim();
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.');
    if !plain {
        return Err(DashboardError::InvalidRequest(format!(
            "invalid log name: {name:?}"
        )));
    }
    if name.ends_with(".log") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.log"))
    }
}
