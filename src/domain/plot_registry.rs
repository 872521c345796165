//! Concurrent store of the latest published plots.
//!
//! New Socket.IO sessions replay the registry so a freshly connected
//! dashboard shows every plot, not only the ones published after it joined.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::plot::PlotSummary;
use super::{Plot, PlotId};
use crate::error::DashboardError;

#[derive(Debug, Default)]
struct Inner {
    plots: HashMap<PlotId, Arc<Plot>>,
    order: Vec<PlotId>,
}

/// Central store for published plots, in publication order.
#[derive(Debug, Default)]
pub struct PlotRegistry {
    inner: RwLock<Inner>,
}

impl PlotRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a plot.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidRequest`] if a plot with the same
    /// ID already exists.
    pub async fn insert(&self, plot: Arc<Plot>) -> Result<PlotId, DashboardError> {
        let id = plot.id;
        let mut inner = self.inner.write().await;
        if inner.plots.contains_key(&id) {
            return Err(DashboardError::InvalidRequest(format!(
                "plot {id} already exists"
            )));
        }
        inner.plots.insert(id, plot);
        inner.order.push(id);
        Ok(id)
    }

    /// Returns a plot by ID.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::PlotNotFound`] if no plot has that ID.
    pub async fn get(&self, id: PlotId) -> Result<Arc<Plot>, DashboardError> {
        let inner = self.inner.read().await;
        inner
            .plots
            .get(&id)
            .cloned()
            .ok_or(DashboardError::PlotNotFound(*id.as_uuid()))
    }

    /// Removes a plot, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::PlotNotFound`] if no plot has that ID.
    pub async fn remove(&self, id: PlotId) -> Result<Arc<Plot>, DashboardError> {
        let mut inner = self.inner.write().await;
        let plot = inner
            .plots
            .remove(&id)
            .ok_or(DashboardError::PlotNotFound(*id.as_uuid()))?;
        inner.order.retain(|p| *p != id);
        Ok(plot)
    }

    /// Every plot in publication order.
    pub async fn snapshot(&self) -> Vec<Arc<Plot>> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.plots.get(id).cloned())
            .collect()
    }

    /// Summaries of every plot in publication order, optionally filtered
    /// by source.
    pub async fn list(&self, source_filter: Option<&str>) -> Vec<PlotSummary> {
        self.snapshot()
            .await
            .iter()
            .filter(|p| source_filter.is_none_or(|s| p.source == s))
            .map(|p| PlotSummary::from(p.as_ref()))
            .collect()
    }

    /// Returns the number of plots.
    pub async fn len(&self) -> usize {
        self.inner.read().await.plots.len()
    }

    /// Returns `true` if the registry holds no plots.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.plots.is_empty()
    }
}
