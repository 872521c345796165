//! Known-problem scanning against a message database.
//!
//! The database is JSON keyed by category:
//!
//! ```json
//! {
//!   "IPSec": [
//!     { "Message": "IKE SA .* failed", "Meaning": "Peer unreachable or PSK mismatch" }
//!   ]
//! }
//! ```
//!
//! `Message` is a regular expression searched anywhere in a line.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{LogError, LogFile};

/// Message database categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    /// WAN links and modems.
    #[serde(rename = "Connectivity+Modem")]
    ConnectivityModem,
    /// IPsec tunnels.
    #[serde(rename = "IPSec")]
    IpSec,
    /// OSPF, BGP and friends.
    #[serde(rename = "Routing Protocols")]
    RoutingProtocols,
    /// NetCloud Perimeter.
    #[serde(rename = "NCP")]
    Ncp,
    /// NetCloud Manager.
    #[serde(rename = "NCM")]
    Ncm,
}

impl LogCategory {
    /// Every allowed category.
    pub const ALL: [Self; 5] = [
        Self::ConnectivityModem,
        Self::IpSec,
        Self::RoutingProtocols,
        Self::Ncp,
        Self::Ncm,
    ];

    /// Database key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConnectivityModem => "Connectivity+Modem",
            Self::IpSec => "IPSec",
            Self::RoutingProtocols => "Routing Protocols",
            Self::Ncp => "NCP",
            Self::Ncm => "NCM",
        }
    }

    /// Looks a category up by its database key.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::UnknownCategory`] for anything outside
    /// [`LogCategory::ALL`].
    pub fn parse(name: &str) -> Result<Self, LogError> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| LogError::UnknownCategory(name.to_string()))
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Meaning")]
    meaning: String,
}

/// A compiled database message.
#[derive(Debug, Clone)]
pub struct KnownMessage {
    /// Pattern as written in the database.
    pub pattern: String,
    /// Explanation shown to the operator.
    pub meaning: String,
    regex: Regex,
}

/// Known problem messages, by category.
#[derive(Debug, Clone, Default)]
pub struct ScanDatabase {
    messages: BTreeMap<LogCategory, Vec<KnownMessage>>,
}

impl ScanDatabase {
    /// Parses a JSON database. Keys that are not known categories are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Database`] for malformed JSON and
    /// [`LogError::Pattern`] for an invalid message regex.
    pub fn from_json(text: &str) -> Result<Self, LogError> {
        let raw: HashMap<String, Vec<RawEntry>> = serde_json::from_str(text)?;
        let mut messages = BTreeMap::new();
        for (key, entries) in raw {
            let Ok(category) = LogCategory::parse(&key) else {
                tracing::debug!(category = %key, "skipping unknown database category");
                continue;
            };
            let compiled = entries
                .into_iter()
                .map(|e| {
                    let regex = Regex::new(&e.message).map_err(|source| LogError::Pattern {
                        pattern: e.message.clone(),
                        source,
                    })?;
                    Ok(KnownMessage {
                        pattern: e.message,
                        meaning: e.meaning,
                        regex,
                    })
                })
                .collect::<Result<Vec<_>, LogError>>()?;
            messages.insert(category, compiled);
        }
        Ok(Self { messages })
    }

    /// Reads and parses a JSON database file.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the file cannot be read, otherwise as
    /// [`ScanDatabase::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Messages of one category.
    #[must_use]
    pub fn messages(&self, category: LogCategory) -> &[KnownMessage] {
        self.messages
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    /// Returns `true` if the database has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A log line matching a known message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// 1-based line number.
    pub line: usize,
    /// Category of the matching message.
    pub category: LogCategory,
    /// Matching pattern.
    pub pattern: String,
    /// Its explanation.
    pub meaning: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Problem found on line {}: {}\nCommon meaning of error: {}",
            self.line, self.pattern, self.meaning
        )
    }
}

/// Scans logs for the messages of a selected set of categories.
#[derive(Debug, Clone)]
pub struct LogScanner<'a> {
    database: &'a ScanDatabase,
    categories: BTreeSet<LogCategory>,
}

impl<'a> LogScanner<'a> {
    /// Scanner over every category.
    #[must_use]
    pub fn new(database: &'a ScanDatabase) -> Self {
        Self {
            database,
            categories: LogCategory::ALL.into_iter().collect(),
        }
    }

    /// Adds a category by database key.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::UnknownCategory`] if `name` is not allowed.
    pub fn add_category(&mut self, name: &str) -> Result<(), LogError> {
        self.categories.insert(LogCategory::parse(name)?);
        Ok(())
    }

    /// Removes a category. Removing an absent category is a no-op.
    pub fn remove_category(&mut self, category: LogCategory) {
        self.categories.remove(&category);
    }

    /// Restricts the scan to exactly `categories`.
    #[must_use]
    pub fn only(mut self, categories: impl IntoIterator<Item = LogCategory>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Selected categories.
    #[must_use]
    pub const fn categories(&self) -> &BTreeSet<LogCategory> {
        &self.categories
    }

    /// Every match, by line then category then database order.
    #[must_use]
    pub fn scan(&self, log: &LogFile) -> Vec<Problem> {
        let mut problems = Vec::new();
        for (idx, line) in log.lines().enumerate() {
            for category in &self.categories {
                for known in self.database.messages(*category) {
                    if known.regex.is_match(line) {
                        problems.push(Problem {
                            line: idx.saturating_add(1),
                            category: *category,
                            pattern: known.pattern.clone(),
                            meaning: known.meaning.clone(),
                        });
                    }
                }
            }
        }
        problems
    }
}
