//! WAN connection state transitions.
//!
//! Recognized lines (first match wins):
//!
//! ```text
//! ... WAN:685ca069 -- connecting -> disconnecting
//! ... WAN:686be2ac -- connecting -> connected, Reason: Failback
//! ... WAN:685ca069 -- Unplugged
//! ... WAN:685ca069 -- Plug event: ok
//! ```
//!
//! `Service Change` transitions belong to the signal parser and are skipped.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::{Captures, Regex};

use super::LogFile;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[allow(clippy::expect_used)]
static DEV_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d*-\d*-\d* \d*:\d*:\d*).*WAN:(.*) -- (.*) -> (.*?)(?:, Reason: (.*))?$")
        .expect("static regex")
});

#[allow(clippy::expect_used)]
static UNPLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d*-\d*-\d* \d*:\d*:\d*).*WAN:(.*) -- Unplugged$").expect("static regex")
});

#[allow(clippy::expect_used)]
static PLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d*-\d*-\d* \d*:\d*:\d*).*WAN:(.*) -- Plug event: ok$").expect("static regex")
});

/// WAN device states, in plot axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WanState {
    /// Cable or modem removed.
    Unplugged,
    /// Device detected.
    Plugged,
    /// Link down.
    Disconnected,
    /// Tearing the link down.
    Disconnecting,
    /// Bringing up a standby link.
    StandbyConnecting,
    /// Standby (failover) link.
    Standby,
    /// Bringing the link up.
    Connecting,
    /// Link up.
    Connected,
}

impl WanState {
    /// All states in axis order.
    pub const ALL: [Self; 8] = [
        Self::Unplugged,
        Self::Plugged,
        Self::Disconnected,
        Self::Disconnecting,
        Self::StandbyConnecting,
        Self::Standby,
        Self::Connecting,
        Self::Connected,
    ];

    /// Name as it appears in the log.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unplugged => "unplugged",
            Self::Plugged => "plugged",
            Self::Disconnected => "disconnected",
            Self::Disconnecting => "disconnecting",
            Self::StandbyConnecting => "standby_connecting",
            Self::Standby => "standby",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    /// Looks a state up by its log name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for WanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One state change of one WAN device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WanEvent {
    /// When the change was logged.
    pub at: NaiveDateTime,
    /// WAN device id.
    pub uid: String,
    /// New state, as logged.
    pub state: String,
    /// Ordered `(key, value)` details; always ends with `State`.
    pub details: Vec<(String, String)>,
}

impl WanEvent {
    fn new(
        timestamp: &str,
        uid: &str,
        state: &str,
        mut details: Vec<(String, String)>,
    ) -> Option<Self> {
        let at = NaiveDateTime::parse_from_str(timestamp, TIME_FORMAT).ok()?;
        details.push(("State".to_string(), state.to_string()));
        Some(Self {
            at,
            uid: uid.to_string(),
            state: state.to_string(),
            details,
        })
    }

    /// `Key: value, Key: value` rendering of the details.
    #[must_use]
    pub fn detail_format(&self) -> String {
        self.details
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// CSV header matching [`WanEvent::csv_row`].
    #[must_use]
    pub const fn csv_header() -> &'static str {
        "datetime,uid,stateEnum,details\n"
    }

    /// One CSV row, newline-terminated.
    #[must_use]
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},\"{}\"\n",
            self.at.format(TIME_FORMAT),
            self.uid,
            self.state,
            self.detail_format().replace('"', "\"\"")
        )
    }
}

/// All events of one WAN device, in log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WanSeries {
    /// WAN device id.
    pub uid: String,
    /// Events in log order.
    pub events: Vec<WanEvent>,
}

/// Extracts [`WanEvent`]s from a log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnStateParser;

impl ConnStateParser {
    /// Parses one line, or returns `None` if it carries no state change.
    #[must_use]
    pub fn parse_line(&self, line: &str) -> Option<WanEvent> {
        let line = line.trim_end_matches(['\r', '\n']);
        Self::dev_state(line)
            .or_else(|| Self::fixed_state(&UNPLUG_RE, line, WanState::Unplugged))
            .or_else(|| Self::fixed_state(&PLUG_RE, line, WanState::Plugged))
    }

    /// Groups every state change by device, devices in first-seen order.
    #[must_use]
    pub fn parse_log(&self, log: &LogFile) -> Vec<WanSeries> {
        let mut series: Vec<WanSeries> = Vec::new();
        for event in log.lines().filter_map(|l| self.parse_line(l)) {
            match series.iter_mut().find(|s| s.uid == event.uid) {
                Some(s) => s.events.push(event),
                None => series.push(WanSeries {
                    uid: event.uid.clone(),
                    events: vec![event],
                }),
            }
        }
        series
    }

    /// Every state change as CSV, in log order.
    #[must_use]
    pub fn csv(&self, log: &LogFile) -> String {
        let mut out = WanEvent::csv_header().to_string();
        for event in log.lines().filter_map(|l| self.parse_line(l)) {
            out.push_str(&event.csv_row());
        }
        out
    }

    fn dev_state(line: &str) -> Option<WanEvent> {
        let caps = DEV_STATE_RE.captures(line)?;
        let prev = group(&caps, 3)?;
        if prev.starts_with("Service Change") {
            return None;
        }
        let mut details = vec![("PrevState".to_string(), prev.to_string())];
        if let Some(reason) = group(&caps, 5) {
            details.push(("Reason".to_string(), reason.to_string()));
        }
        WanEvent::new(group(&caps, 1)?, group(&caps, 2)?, group(&caps, 4)?, details)
    }

    fn fixed_state(re: &Regex, line: &str, state: WanState) -> Option<WanEvent> {
        let caps = re.captures(line)?;
        WanEvent::new(group(&caps, 1)?, group(&caps, 2)?, state.name(), Vec::new())
    }
}

fn group<'h>(caps: &Captures<'h>, i: usize) -> Option<&'h str> {
    caps.get(i).map(|m| m.as_str())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const LOG: &str = "\
2019-04-19 03:35:51 192.168.0.1 S= INFO \u{feff}WAN:686be2ac -- connecting -> connected, Reason: Failback
2019-04-19 03:36:10 192.168.0.1 S= INFO WAN:685ca069 -- Service Change : Not Reported -> LTE, 100%, RSSI: -45(dBm)
2019-04-19 03:37:05 192.168.0.1 S= INFO WAN:685ca069 -- connecting -> disconnecting
2019-04-19 03:37:09 192.168.0.1 S= INFO WAN:685ca069 -- Unplugged
2019-04-19 03:38:00 192.168.0.1 S= INFO WAN:685ca069 -- Plug event: ok
2019-04-19 03:38:01 192.168.0.1 S= INFO WAN:686be2ac -- Configure Event: ok
";

    #[test]
    fn transition_with_reason() {
        let Some(event) = ConnStateParser.parse_line(LOG.lines().next().unwrap_or_default())
        else {
            panic!("expected event");
        };
        assert_eq!(event.uid, "686be2ac");
        assert_eq!(event.state, "connected");
        assert_eq!(
            event.detail_format(),
            "PrevState: connecting, Reason: Failback, State: connected"
        );
    }

    #[test]
    fn service_change_is_not_a_transition() {
        let line = LOG.lines().nth(1).unwrap_or_default();
        assert!(ConnStateParser.parse_line(line).is_none());
    }

    #[test]
    fn groups_by_uid_in_order() {
        let log = LogFile::from_text("t.log", LOG);
        let series = ConnStateParser.parse_log(&log);
        assert_eq!(series.len(), 2);
        let Some(first) = series.first() else {
            panic!("missing series");
        };
        assert_eq!(first.uid, "686be2ac");
        let Some(second) = series.get(1) else {
            panic!("missing series");
        };
        let states: Vec<_> = second.events.iter().map(|e| e.state.as_str()).collect();
        assert_eq!(states, vec!["disconnecting", "unplugged", "plugged"]);
        assert_eq!(
            second.events.get(1).map(WanEvent::detail_format).as_deref(),
            Some("State: unplugged")
        );
    }

    #[test]
    fn csv_export() {
        let log = LogFile::from_text("t.log", LOG);
        let csv = ConnStateParser.csv(&log);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("datetime,uid,stateEnum,details"));
        assert_eq!(
            lines.next(),
            Some(
                "2019-04-19 03:35:51,686be2ac,connected,\"PrevState: connecting, Reason: Failback, State: connected\""
            )
        );
        assert_eq!(csv.lines().count(), 5);
    }

    #[test]
    fn state_names_round_trip() {
        for state in WanState::ALL {
            assert_eq!(WanState::from_name(state.name()), Some(state));
        }
        assert_eq!(WanState::from_name("configured"), None);
    }
}
