//! Plot listing DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::PlotSummary;

/// Paginated plot list.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlotListResponse {
    /// Plots on this page, in publication order.
    pub data: Vec<PlotSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
