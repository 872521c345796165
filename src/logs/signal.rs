//! Cellular signal quality over time.
//!
//! Parses modem reports such as
//!
//! ```text
//! signal MC400LPE (SIM1) on port modem2: 100%, RSSI:-45(dBm), SINR:15.6(dB), RSRP:-68(dB), RSRQ:-7(dB), RFBAND: Band 13
//! signal MC400LPE (SIM1) on port modem2: 100%, RSSI:-57(dBm), ECIO:-31.5(dBm), RFBAND: CDMA Band Class 0 (800 MHz)
//! ```
//!
//! and grades each reading against fixed thresholds.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{LogFile, LogRecord};

#[allow(clippy::expect_used)]
static UID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"WAN:([0-9a-f]+)").expect("static regex"));

#[allow(clippy::expect_used)]
static METRIC_RES: LazyLock<Vec<(Metric, Regex)>> = LazyLock::new(|| {
    Metric::ALL
        .into_iter()
        .map(|m| {
            let pattern = match m {
                Metric::RfBand => format!(r"{}:(.*)", m.name()),
                _ => format!(r"{}:(.*?)\(", m.name()),
            };
            (m, Regex::new(&pattern).expect("static regex"))
        })
        .collect()
});

/// Reported signal metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    /// Received signal strength indicator (dBm).
    #[serde(rename = "RSSI")]
    Rssi,
    /// Signal to interference plus noise ratio (dB).
    #[serde(rename = "SINR")]
    Sinr,
    /// Reference signal received power (dB).
    #[serde(rename = "RSRP")]
    Rsrp,
    /// Reference signal received quality (dB).
    #[serde(rename = "RSRQ")]
    Rsrq,
    /// Energy per chip to interference ratio (dBm).
    #[serde(rename = "ECIO")]
    Ecio,
    /// Radio band, free text.
    #[serde(rename = "RFBAND")]
    RfBand,
}

impl Metric {
    /// All metrics in report order.
    pub const ALL: [Self; 6] = [
        Self::Rssi,
        Self::Sinr,
        Self::Rsrp,
        Self::Rsrq,
        Self::Ecio,
        Self::RfBand,
    ];

    /// Label used in the log.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rssi => "RSSI",
            Self::Sinr => "SINR",
            Self::Rsrp => "RSRP",
            Self::Rsrq => "RSRQ",
            Self::Ecio => "ECIO",
            Self::RfBand => "RFBAND",
        }
    }

    /// Lower bounds for excellent, good and fair. `None` for text metrics.
    #[must_use]
    pub const fn thresholds(self) -> Option<[f64; 3]> {
        match self {
            Self::Rssi => Some([-67.0, -70.0, -80.0]),
            Self::Sinr => Some([20.0, 13.0, 0.0]),
            Self::Rsrp => Some([-80.0, -90.0, -100.0]),
            Self::Rsrq => Some([-10.0, -15.0, -20.0]),
            Self::Ecio => Some([-6.0, -10.0, -20.0]),
            Self::RfBand => None,
        }
    }

    /// Grades a reading.
    #[must_use]
    pub fn grade(self, value: f64) -> Option<Quality> {
        let [excellent, good, fair] = self.thresholds()?;
        Some(if value >= excellent {
            Quality::Excellent
        } else if value >= good {
            Quality::Good
        } else if value >= fair {
            Quality::Fair
        } else {
            Quality::Poor
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signal grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quality {
    /// At or above the first threshold.
    Excellent,
    /// At or above the second threshold.
    Good,
    /// At or above the third threshold.
    Fair,
    /// Below every threshold.
    Poor,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        };
        f.write_str(s)
    }
}

/// One reading of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSample {
    /// Record timestamp, as written.
    pub timestamp: String,
    /// Reading, as written.
    pub raw: String,
    /// Numeric reading, if it parses.
    pub value: Option<f64>,
    /// Grade, for numeric metrics.
    pub quality: Option<Quality>,
}

/// Readings of one WAN device, keyed by metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSignals {
    /// `uid-<device id>`.
    pub uid: String,
    /// Every metric is present, possibly empty.
    pub metrics: BTreeMap<Metric, Vec<SignalSample>>,
}

impl DeviceSignals {
    fn new(uid: String) -> Self {
        Self {
            uid,
            metrics: Metric::ALL.into_iter().map(|m| (m, Vec::new())).collect(),
        }
    }

    /// Readings of `metric`, oldest first.
    #[must_use]
    pub fn samples(&self, metric: Metric) -> &[SignalSample] {
        self.metrics
            .get(&metric)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Extracts signal readings from a log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalQualityParser;

impl SignalQualityParser {
    /// Collects readings per WAN device, devices in first-seen order.
    ///
    /// Every record whose source names a WAN device registers the device,
    /// but only messages containing `signal` contribute readings.
    #[must_use]
    pub fn parse_log(&self, log: &LogFile) -> Vec<DeviceSignals> {
        let mut devices: Vec<DeviceSignals> = Vec::new();
        for record in log.records() {
            let Some(uid) = UID_RE
                .captures(&record.source)
                .and_then(|c| c.get(1))
                .map(|m| format!("uid-{}", m.as_str()))
            else {
                continue;
            };

            let idx = match devices.iter().position(|d| d.uid == uid) {
                Some(idx) => idx,
                None => {
                    tracing::debug!(%uid, source = %record.source, "new WAN device");
                    devices.push(DeviceSignals::new(uid));
                    devices.len().saturating_sub(1)
                }
            };
            let Some(device) = devices.get_mut(idx) else {
                continue;
            };

            if record.message.contains("signal") {
                Self::collect(&record, device);
            }
        }
        devices
    }

    fn collect(record: &LogRecord, device: &mut DeviceSignals) {
        for (metric, re) in METRIC_RES.iter() {
            let Some(raw) = re
                .captures(&record.message)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
            else {
                continue;
            };
            let value = raw.parse::<f64>().ok();
            let quality = value.and_then(|v| metric.grade(v));
            device.metrics.entry(*metric).or_default().push(SignalSample {
                timestamp: record.timestamp.clone(),
                raw,
                value,
                quality,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const LOG: &str = "\
2019-04-19 03:35:51 192.168.0.1 S= INFO WAN:686be2ac -- signal MC400LPE (SIM1) on port modem2: 100%, RSSI:-45(dBm), SINR:15.6(dB), RSRP:-68(dB), RSRQ:-7(dB), RFBAND: Band 13
2019-04-19 03:36:51 192.168.0.1 S= INFO WAN:686be2ac -- signal MC400LPE (SIM1) on port modem2: 60%, RSSI:-75(dBm), ECIO:-31.5(dBm), RFBAND: CDMA Band Class 0 (800 MHz)
2019-04-19 03:37:00 192.168.0.1 S= INFO WAN:685ca069 -- connecting -> connected
2019-04-19 03:37:01 192.168.0.1 S= INFO SYSTEM -- signal from elsewhere RSSI:-10(dBm)
";

    #[test]
    fn grades_against_thresholds() {
        assert_eq!(Metric::Rssi.grade(-67.0), Some(Quality::Excellent));
        assert_eq!(Metric::Rssi.grade(-69.0), Some(Quality::Good));
        assert_eq!(Metric::Rssi.grade(-80.0), Some(Quality::Fair));
        assert_eq!(Metric::Rssi.grade(-80.5), Some(Quality::Poor));
        assert_eq!(Metric::Sinr.grade(15.6), Some(Quality::Good));
        assert_eq!(Metric::RfBand.grade(1.0), None);
    }

    #[test]
    fn collects_per_device() {
        let log = LogFile::from_text("s.log", LOG);
        let devices = SignalQualityParser.parse_log(&log);
        let uids: Vec<_> = devices.iter().map(|d| d.uid.as_str()).collect();
        assert_eq!(uids, vec!["uid-686be2ac", "uid-685ca069"]);

        let Some(modem) = devices.first() else {
            panic!("missing device");
        };
        let rssi = modem.samples(Metric::Rssi);
        assert_eq!(rssi.len(), 2);
        assert_eq!(rssi.first().map(|s| s.raw.as_str()), Some("-45"));
        assert_eq!(rssi.first().and_then(|s| s.quality), Some(Quality::Excellent));
        assert_eq!(rssi.get(1).and_then(|s| s.quality), Some(Quality::Fair));

        let ecio = modem.samples(Metric::Ecio);
        assert_eq!(ecio.len(), 1);
        assert_eq!(ecio.first().and_then(|s| s.quality), Some(Quality::Poor));

        let band = modem.samples(Metric::RfBand);
        assert_eq!(
            band.get(1).map(|s| s.raw.as_str()),
            Some("CDMA Band Class 0 (800 MHz)")
        );
        assert_eq!(band.first().and_then(|s| s.quality), None);
    }

    #[test]
    fn device_without_signal_has_empty_series() {
        let log = LogFile::from_text("s.log", LOG);
        let devices = SignalQualityParser.parse_log(&log);
        let Some(idle) = devices.get(1) else {
            panic!("missing device");
        };
        assert!(Metric::ALL.iter().all(|m| idle.samples(*m).is_empty()));
        assert_eq!(idle.metrics.len(), Metric::ALL.len());
    }
}
