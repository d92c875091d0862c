//! Daemon configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use bus::BusConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Daemon configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `METRICS_ADDR` — Prometheus listener address (default: disabled)
/// - `TICK_INTERVAL_MS` — ticker period in milliseconds (default: `1000`)
/// - `TICK_GROUPS` — comma separated table groups to tick (default: `"clock"`)
/// - `BUS_*` — see [`BusConfig`]
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_addr: Option<SocketAddr>,
    pub tick_interval: Duration,
    pub tick_groups: Vec<String>,
    pub bus: BusConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            metrics_addr: lookup("METRICS_ADDR").and_then(|a| a.parse().ok()),
            tick_interval: lookup("TICK_INTERVAL_MS")
                .and_then(|ms| ms.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            tick_groups: lookup("TICK_GROUPS")
                .map(|groups| {
                    groups
                        .split(',')
                        .map(str::trim)
                        .filter(|g| !g.is_empty())
                        .map(String::from)
                        .collect::<Vec<_>>()
                })
                .filter(|groups| !groups.is_empty())
                .unwrap_or(defaults.tick_groups),
            bus: BusConfig::from_lookup(&lookup),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_addr: None,
            tick_interval: Duration::from_secs(1),
            tick_groups: vec!["clock".to_string()],
            bus: BusConfig::default(),
        }
    }
}
