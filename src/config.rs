//! Configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The dashboard server reads
//! [`DashboardConfig`], the plots subscriber reads [`SubscriberConfig`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::{DEFAULT_ENGINE_PATH, PLOTS_EVENT};
use crate::subscriber::{Endpoint, SubscriberError};

/// Dashboard server configuration.
///
/// Loaded once at startup via [`DashboardConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:5000`).
    pub listen_addr: SocketAddr,

    /// Directory uploaded logs are stored in.
    pub log_dir: PathBuf,

    /// Directory holding the dashboard page and its scripts.
    pub static_dir: PathBuf,

    /// Delete `*.log` files in [`Self::log_dir`] at startup.
    pub clear_log_dir_on_start: bool,

    /// Capacity of the plot broadcast channel.
    pub plot_bus_capacity: usize,

    /// Engine.IO settings for every session.
    pub engine: EngineSettings,

    /// Optional JSON message database for problem scans.
    pub log_message_database: Option<PathBuf>,

    /// Publish the placeholder plot at startup.
    pub demo_plot: bool,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

/// Engine.IO session parameters announced in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Interval between server heartbeats.
    pub ping_interval: Duration,
    /// How long to wait for a heartbeat reply.
    pub ping_timeout: Duration,
    /// Largest accepted packet in bytes.
    pub max_payload: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_millis(25_000),
            ping_timeout: Duration::from_millis(20_000),
            max_payload: 1_000_000,
        }
    }
}

impl EngineSettings {
    /// Replaces zero values with the defaults. A zero heartbeat period
    /// cannot drive a timer and a zero payload limit rejects every frame.
    #[must_use]
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            ping_interval: non_zero(self.ping_interval, defaults.ping_interval),
            ping_timeout: non_zero(self.ping_timeout, defaults.ping_timeout),
            max_payload: if self.max_payload == 0 {
                defaults.max_payload
            } else {
                self.max_payload
            },
        }
    }
}

impl DashboardConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
            .parse()?;

        let log_dir = PathBuf::from(
            std::env::var("LOG_DIR").unwrap_or_else(|_| "logFiles".to_string()),
        );
        let static_dir = PathBuf::from(
            std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
        );
        let clear_log_dir_on_start = parse_env_bool("CLEAR_LOG_DIR_ON_START", true);
        let plot_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1024);

        let engine = EngineSettings {
            ping_interval: Duration::from_millis(parse_env("PING_INTERVAL_MS", 25_000)),
            ping_timeout: Duration::from_millis(parse_env("PING_TIMEOUT_MS", 20_000)),
            max_payload: parse_env("MAX_PAYLOAD", 1_000_000),
        }
        .normalized();

        let log_message_database = std::env::var("LOG_MESSAGE_DATABASE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let demo_plot = parse_env_bool("DEMO_PLOT", true);
        let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            listen_addr,
            log_dir,
            static_dir,
            clear_log_dir_on_start,
            plot_bus_capacity,
            engine,
            log_message_database,
            demo_plot,
            json_logs,
        })
    }
}

/// Plots subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Origin of the dashboard, e.g. `http://10.0.0.1:5000`.
    pub origin: String,
    /// Socket.IO namespace to join. `None` keeps the one named by the
    /// origin path.
    pub namespace: Option<String>,
    /// Engine.IO mount path.
    pub engine_path: String,
    /// Event name to log.
    pub event: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl SubscriberConfig {
    /// Loads configuration from environment variables (and `.env`).
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            origin: std::env::var("DASHBOARD_ORIGIN")
                .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string()),
            namespace: std::env::var("SUBSCRIBER_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty()),
            engine_path: std::env::var("ENGINE_PATH")
                .unwrap_or_else(|_| DEFAULT_ENGINE_PATH.to_string()),
            event: std::env::var("SUBSCRIBER_EVENT").unwrap_or_else(|_| PLOTS_EVENT.to_string()),
            json_logs: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    /// Builds the endpoint to dial from the origin, the engine path and
    /// the namespace override, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError::InvalidOrigin`] if the origin is not an
    /// `http`/`https`/`ws`/`wss` URL.
    pub fn endpoint(&self) -> Result<Endpoint, SubscriberError> {
        let endpoint =
            Endpoint::from_origin(&self.origin)?.with_engine_path(self.engine_path.as_str());
        Ok(match &self.namespace {
            Some(namespace) => endpoint.with_namespace(namespace.as_str()),
            None => endpoint,
        })
    }
}

fn non_zero(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        _ => default,
    }
}
