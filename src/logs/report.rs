//! Plain-text rendering of parsed series.

use super::conn_state::WanSeries;
use super::signal::DeviceSignals;

/// Renders connection state series, one `data:` line per event.
#[must_use]
pub fn render_conn_state(series: &[WanSeries]) -> String {
    let mut lines = Vec::new();
    for s in series {
        lines.push(format!("Series, name: {}", s.uid));
        lines.extend(s.events.iter().map(|e| {
            format!(
                "  data: [{}, {}, {}]",
                e.at.format("%Y-%m-%d %H:%M:%S"),
                e.state,
                e.detail_format()
            )
        }));
    }
    terminate(lines)
}

/// Renders signal readings, grouped by device then metric.
#[must_use]
pub fn render_signals(devices: &[DeviceSignals]) -> String {
    let mut lines = Vec::new();
    for d in devices {
        lines.push(format!("Series, name: {}", d.uid));
        for (metric, samples) in &d.metrics {
            lines.push(format!("  sub name: {metric}"));
            lines.extend(samples.iter().map(|s| {
                let quality = s.quality.map_or_else(|| "None".to_string(), |q| q.to_string());
                format!("    [{}, {}, {quality}]", s.timestamp, s.raw)
            }));
        }
    }
    terminate(lines)
}

/// Joins lines, each ending with a newline.
fn terminate(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{ConnStateParser, LogFile, SignalQualityParser};

    const LOG: &str = "\
2019-04-19 03:35:51 192.168.0.1 S= INFO WAN:686be2ac -- signal MC400LPE (SIM1) on port modem2: 100%, RSSI:-45(dBm), RFBAND: Band 13
2019-04-19 03:37:05 192.168.0.1 S= INFO WAN:686be2ac -- connecting -> disconnecting
";

    #[test]
    fn conn_state_report() {
        let log = LogFile::from_text("r.log", LOG);
        let text = render_conn_state(&ConnStateParser.parse_log(&log));
        assert_eq!(
            text,
            "Series, name: 686be2ac\n  data: [2019-04-19 03:37:05, disconnecting, PrevState: connecting, State: disconnecting]\n"
        );
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(render_conn_state(&[]).is_empty());
        assert!(render_signals(&[]).is_empty());
    }

    #[test]
    fn signal_report_lists_every_metric() {
        let log = LogFile::from_text("r.log", LOG);
        let text = render_signals(&SignalQualityParser.parse_log(&log));
        assert!(text.starts_with("Series, name: uid-686be2ac\n  sub name: RSSI\n    [2019-04-19 03:35:51, -45, Excellent]\n"));
        assert!(text.contains("  sub name: RFBAND\n    [2019-04-19 03:35:51, Band 13, None]\n"));
        assert_eq!(text.matches("sub name").count(), 6);
    }
}
