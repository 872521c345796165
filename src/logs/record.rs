//! Tokenized log lines.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::LogError;

#[allow(clippy::expect_used)]
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s*(\d+.\d+.\d+.\d+)\s*S=\s*(\S*)\s*\W(\S*)\s*--\s*(.*)",
    )
    .expect("static regex")
});

/// One syslog line split into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// `YYYY-MM-DD HH:MM:SS`, as written.
    pub timestamp: String,
    /// Router address.
    pub ip: String,
    /// Severity (`INFO`, `WARNING`, ...).
    pub level: String,
    /// Emitting component, e.g. `WAN:686be2ac`.
    pub source: String,
    /// Free text after `--`.
    pub message: String,
}

impl LogRecord {
    /// Splits a line, or returns `None` if it is not in the standard format.
    #[must_use]
    pub fn tokenize(line: &str) -> Option<Self> {
        let caps = LINE_RE.captures(line.trim_end_matches(['\r', '\n']))?;
        let field = |i: usize| caps.get(i).map_or_else(String::new, |m| m.as_str().to_string());
        Some(Self {
            timestamp: field(1),
            ip: field(2),
            level: field(3),
            source: field(4),
            message: field(5),
        })
    }
}

/// A log file held in memory.
#[derive(Debug, Clone)]
pub struct LogFile {
    name: PathBuf,
    contents: String,
}

impl LogFile {
    /// Reads a log file.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            name: path.to_path_buf(),
            contents,
        })
    }

    /// Wraps already-loaded text.
    #[must_use]
    pub fn from_text(name: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// File name the contents came from.
    #[must_use]
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// Raw lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.contents.lines()
    }

    /// Tokenized records; lines not in the standard format are skipped.
    pub fn records(&self) -> impl Iterator<Item = LogRecord> + '_ {
        self.lines().filter_map(LogRecord::tokenize)
    }
}
