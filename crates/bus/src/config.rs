//! Bus configuration loaded from environment variables.

/// Inbox sizes and concurrency bounds for the bus.
///
/// Reads from environment variables:
/// - `BUS_COMMAND_INBOX` — command inbox capacity (default: `64`)
/// - `BUS_EVENT_INBOX` — event inbox capacity (default: `64`)
/// - `BUS_MAX_COMMANDS` — concurrent command tasks (default: unlimited)
/// - `BUS_MAX_EVENTS` — concurrent event tasks (default: unlimited)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub command_inbox_capacity: usize,
    pub event_inbox_capacity: usize,
    pub max_concurrent_commands: Option<usize>,
    pub max_concurrent_events: Option<usize>,
}

pub const DEFAULT_INBOX_CAPACITY: usize = 64;

impl BusConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Values that fail to parse fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());
        Self {
            command_inbox_capacity: parse("BUS_COMMAND_INBOX")
                .unwrap_or(DEFAULT_INBOX_CAPACITY)
                .max(1),
            event_inbox_capacity: parse("BUS_EVENT_INBOX")
                .unwrap_or(DEFAULT_INBOX_CAPACITY)
                .max(1),
            max_concurrent_commands: parse("BUS_MAX_COMMANDS"),
            max_concurrent_events: parse("BUS_MAX_EVENTS"),
        }
    }

    /// Bounds the number of command tasks in flight.
    pub fn with_max_concurrent_commands(mut self, max: usize) -> Self {
        self.max_concurrent_commands = Some(max);
        self
    }

    /// Bounds the number of event tasks in flight.
    pub fn with_max_concurrent_events(mut self, max: usize) -> Self {
        self.max_concurrent_events = Some(max);
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            command_inbox_capacity: DEFAULT_INBOX_CAPACITY,
            event_inbox_capacity: DEFAULT_INBOX_CAPACITY,
            max_concurrent_commands: None,
            max_concurrent_events: None,
        }
    }
}
