//! Daemon running the table bus with in-memory storage.
//!
//! Wires a [`Ticker`] command source and a [`Journal`] consumer around
//! [`TickTable`]s kept in an in-memory repository, with structured logging
//! (tracing) and optional Prometheus metrics.

pub mod config;
pub mod error;
pub mod journal;
pub mod ticker;
pub mod ticks;

use bus::{Bus, Shutdown};
use repository::InMemoryRepository;

pub use config::{Config, LogFormat};
pub use error::AppError;
pub use journal::Journal;
pub use ticker::Ticker;
pub use ticks::{TickCommand, TickEvent, TickFactory, TickState, TickTable};

/// Repository type used by the daemon.
pub type TickRepository = InMemoryRepository<TickFactory>;

/// Creates the repository for the configured tick groups.
pub fn create_repository(config: &Config) -> TickRepository {
    InMemoryRepository::new(TickFactory::new(config.tick_groups.iter().cloned()))
}

/// Builds the bus with the default components: the ticker and the journal.
///
/// Command tasks run one at a time unless `BUS_MAX_COMMANDS` says otherwise,
/// which keeps the stale tick rule of [`TickTable`] intact.
pub fn build_bus(
    config: &Config,
    repository: TickRepository,
    journal: Journal,
) -> Bus<TickRepository> {
    let ticker = Ticker::new(config.tick_groups.clone(), config.tick_interval);
    let mut bus_config = config.bus.clone();
    bus_config.max_concurrent_commands = bus_config.max_concurrent_commands.or(Some(1));

    Bus::builder(repository)
        .config(bus_config)
        .register(journal)
        .register(ticker)
        .build()
}

/// Runs the bus until `shutdown` is triggered or a fatal error occurs.
pub async fn run(config: &Config, shutdown: Shutdown) -> Result<(), AppError> {
    let repository = create_repository(config);
    let journal = Journal::new();

    tracing::info!(
        groups = ?config.tick_groups,
        interval_ms = config.tick_interval.as_millis() as u64,
        "starting table bus"
    );

    let handle = build_bus(config, repository, journal.clone()).start(shutdown);
    handle.wait().await?;

    let events = journal.total().await;
    tracing::info!(events, "table bus stopped");
    Ok(())
}
