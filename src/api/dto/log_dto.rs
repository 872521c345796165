//! Log upload and scan DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PlotSummary;
use crate::logs::Problem;

/// Request body for `POST /api/v1/logs`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngestLogRequest {
    /// File name to store the log under; `.log` is appended if missing.
    pub name: String,
    /// Raw log text.
    pub contents: String,
}

/// Response body for `POST /api/v1/logs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestLogResponse {
    /// Stored file name.
    pub name: String,
    /// Plots built from the log and published to the dashboard.
    pub plots: Vec<PlotSummary>,
}

/// Request body for `POST /api/v1/logs/scan`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScanLogRequest {
    /// Raw log text.
    pub contents: String,
    /// Categories to scan; every category when absent.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// One matched problem.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProblemDto {
    /// 1-based line number.
    pub line: usize,
    /// Message database category.
    pub category: String,
    /// Matching database pattern.
    pub pattern: String,
    /// Common meaning of the message.
    pub meaning: String,
}

impl From<Problem> for ProblemDto {
    fn from(p: Problem) -> Self {
        Self {
            line: p.line,
            category: p.category.to_string(),
            pattern: p.pattern,
            meaning: p.meaning,
        }
    }
}

/// Response body for `POST /api/v1/logs/scan`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanLogResponse {
    /// Number of problems found.
    pub count: usize,
    /// Problems by line.
    pub problems: Vec<ProblemDto>,
    /// Plain-text report, one problem per paragraph.
    pub report: String,
}
