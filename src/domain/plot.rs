//! Plot payloads emitted on the `"plots"` event.
//!
//! A [`Plot`] is a titled set of named series. Builders turn parsed logs
//! into plots: a step plot of WAN connection states and one line plot per
//! numeric signal metric.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PlotId;
use crate::logs::{
    ConnStateParser, DeviceSignals, LogFile, Metric, SignalQualityParser, WanSeries, WanState,
};

/// A value on either axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AxisValue {
    /// Numeric coordinate.
    Number(f64),
    /// Timestamp coordinate.
    Time(NaiveDateTime),
    /// Categorical coordinate, e.g. a state name.
    Category(String),
}

/// How series are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    /// Straight segments between points.
    Line,
    /// Value holds until the next point.
    Step,
}

/// One point of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlotPoint {
    /// Horizontal coordinate.
    pub x: AxisValue,
    /// Vertical coordinate.
    pub y: AxisValue,
    /// Tooltip text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A named sequence of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlotSeries {
    /// Legend label.
    pub name: String,
    /// Points in drawing order.
    pub points: Vec<PlotPoint>,
}

/// A complete plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Plot {
    /// Plot identifier.
    pub id: PlotId,
    /// Title shown above the plot.
    pub title: String,
    /// Drawing style.
    pub kind: PlotKind,
    /// Where the data came from (log name or `demo`).
    pub source: String,
    /// Ordered categories of a categorical y axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_range: Option<Vec<String>>,
    /// Series in legend order.
    pub series: Vec<PlotSeries>,
    /// Build time.
    pub created_at: DateTime<Utc>,
}

impl Plot {
    /// Creates an empty plot.
    #[must_use]
    pub fn new(title: impl Into<String>, kind: PlotKind, source: impl Into<String>) -> Self {
        Self {
            id: PlotId::new(),
            title: title.into(),
            kind,
            source: source.into(),
            y_range: None,
            series: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Total number of points over all series.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// The dashboard's placeholder plot: `y = 2^x` for `x` in `0..10`.
    #[must_use]
    pub fn demo() -> Self {
        let points = (0..10u32)
            .map(|x| PlotPoint {
                x: AxisValue::Number(f64::from(x)),
                y: AxisValue::Number(f64::from(2u32.pow(x))),
                detail: None,
            })
            .collect();
        let mut plot = Self::new("Demo", PlotKind::Line, "demo");
        plot.series.push(PlotSeries {
            name: "2^x".to_string(),
            points,
        });
        plot
    }

    /// Step plot of WAN states over time, one series per device.
    #[must_use]
    pub fn connection_states(source: &str, devices: &[WanSeries]) -> Self {
        let mut plot = Self::new("Connection State Graph", PlotKind::Step, source);
        plot.y_range = Some(WanState::ALL.iter().map(|s| s.name().to_string()).collect());
        plot.series = devices
            .iter()
            .map(|d| PlotSeries {
                name: d.uid.clone(),
                points: d
                    .events
                    .iter()
                    .map(|e| PlotPoint {
                        x: AxisValue::Time(e.at),
                        y: AxisValue::Category(e.state.clone()),
                        detail: Some(e.detail_format()),
                    })
                    .collect(),
            })
            .collect();
        plot
    }

    /// Line plot of one numeric metric, one series per device. `None` when
    /// no device reported the metric.
    #[must_use]
    pub fn signal_quality(source: &str, metric: Metric, devices: &[DeviceSignals]) -> Option<Self> {
        if metric.thresholds().is_none() {
            return None;
        }
        let series: Vec<PlotSeries> = devices
            .iter()
            .filter_map(|d| {
                let points: Vec<PlotPoint> = d
                    .samples(metric)
                    .iter()
                    .filter_map(|s| {
                        let y = s.value?;
                        let x = NaiveDateTime::parse_from_str(&s.timestamp, "%Y-%m-%d %H:%M:%S")
                            .map_or_else(|_| AxisValue::Category(s.timestamp.clone()), AxisValue::Time);
                        Some(PlotPoint {
                            x,
                            y: AxisValue::Number(y),
                            detail: s.quality.map(|q| q.to_string()),
                        })
                    })
                    .collect();
                (!points.is_empty()).then(|| PlotSeries {
                    name: d.uid.clone(),
                    points,
                })
            })
            .collect();

        if series.is_empty() {
            return None;
        }
        let mut plot = Self::new(format!("{metric} Signal Quality"), PlotKind::Line, source);
        plot.series = series;
        Some(plot)
    }

    /// Every plot a log yields: connection states (when any device changed
    /// state) followed by one plot per reported numeric metric.
    #[must_use]
    pub fn from_log(log: &LogFile) -> Vec<Self> {
        let source = log.name().display().to_string();
        let mut plots = Vec::new();

        let states = ConnStateParser.parse_log(log);
        if !states.is_empty() {
            plots.push(Self::connection_states(&source, &states));
        }

        let signals = SignalQualityParser.parse_log(log);
        plots.extend(
            Metric::ALL
                .into_iter()
                .filter_map(|m| Self::signal_quality(&source, m, &signals)),
        );
        plots
    }
}

/// Lightweight plot listing entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlotSummary {
    /// Plot identifier.
    pub id: PlotId,
    /// Title.
    pub title: String,
    /// Drawing style.
    pub kind: PlotKind,
    /// Data source.
    pub source: String,
    /// Number of series.
    pub series_count: usize,
    /// Number of points over all series.
    pub point_count: usize,
    /// Build time.
    pub created_at: DateTime<Utc>,
}

impl From<&Plot> for PlotSummary {
    fn from(plot: &Plot) -> Self {
        Self {
            id: plot.id,
            title: plot.title.clone(),
            kind: plot.kind,
            source: plot.source.clone(),
            series_count: plot.series.len(),
            point_count: plot.point_count(),
            created_at: plot.created_at,
        }
    }
}
