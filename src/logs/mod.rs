//! Router syslog parsing.
//!
//! Lines look like:
//!
//! ```text
//! 2019-04-19 03:35:51 192.168.0.1 S= INFO WAN:686be2ac -- connecting -> connected, Reason: Failback
//! ```
//!
//! [`LogFile`] tokenizes them into [`LogRecord`]s; the parsers turn records
//! into per-WAN series that the dashboard plots.

pub mod conn_state;
pub mod record;
pub mod report;
pub mod scan;
pub mod signal;

pub use conn_state::{ConnStateParser, WanEvent, WanSeries, WanState};
pub use record::{LogFile, LogRecord};
pub use scan::{LogCategory, LogScanner, Problem, ScanDatabase};
pub use signal::{DeviceSignals, Metric, Quality, SignalQualityParser, SignalSample};

use std::path::PathBuf;

/// Errors raised while loading or scanning logs.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Reading a file failed.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The message database is not valid JSON.
    #[error("invalid message database: {0}")]
    Database(#[from] serde_json::Error),

    /// A database message is not a valid regular expression.
    #[error("invalid message pattern {pattern:?}: {source}")]
    Pattern {
        /// Offending pattern.
        pattern: String,
        /// Regex compile error.
        #[source]
        source: regex::Error,
    },

    /// The category is not one of [`LogCategory::ALL`].
    #[error("unknown category {0:?}")]
    UnknownCategory(String),
}
