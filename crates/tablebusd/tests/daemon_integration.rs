//! Integration tests: ticker → bus → tick tables → repository and journal.

use std::time::Duration;

use bus::{Bus, BusError, Capabilities, Shutdown};
use common::TableId;
use domain::channel;
use tablebusd::{
    Config, Journal, TickCommand, TickEvent, TickState, Ticker, build_bus, create_repository,
};

fn config(groups: &[&str]) -> Config {
    Config {
        tick_groups: groups.iter().map(|g| g.to_string()).collect(),
        tick_interval: Duration::from_millis(5),
        ..Config::default()
    }
}

async fn wait_for(journal: &Journal, event_type: &str, count: u64) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while journal.count(event_type).await < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {count} {event_type} events"));
}

#[tokio::test]
async fn test_ticks_are_counted_and_persisted_per_group() {
    let config = config(&["quotes", "index"]);
    let repository = create_repository(&config);
    let journal = Journal::new();

    let ticker = Ticker::new(config.tick_groups.clone(), config.tick_interval).with_limit(3);
    // Serialized command tasks keep every tick newer than the state it loads.
    let handle = Bus::builder(repository.clone())
        .config(config.bus.clone().with_max_concurrent_commands(1))
        .register(journal.clone())
        .register(ticker)
        .build()
        .start(Shutdown::new());

    wait_for(&journal, "Ticked", 6).await;
    wait_for(&journal, "TableUpdated", 6).await;

    for group in ["quotes", "index"] {
        let snapshot = repository
            .snapshot(&TableId::for_group(group))
            .await
            .expect("snapshot saved");
        let state: TickState = snapshot.into_state().unwrap();
        assert!(state.count >= 1 && state.count <= 3);
        assert!(state.last_tick.is_some());
    }

    handle.shutdown();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn test_reset_command_from_external_producer() {
    let config = config(&["clock"]);
    let repository = create_repository(&config);
    let journal = Journal::new();
    let (tx, source) = channel::<TickCommand>();

    let handle = Bus::builder(repository.clone())
        .register(journal.clone())
        .register(Capabilities::<TickCommand, TickEvent>::new().source(source))
        .build()
        .start(Shutdown::new());

    let clock = TableId::for_group("clock");
    tx.send(TickCommand::tick(clock.clone(), chrono::Utc::now()))
        .unwrap();
    wait_for(&journal, "Ticked", 1).await;

    tx.send(TickCommand::reset(clock.clone())).unwrap();
    wait_for(&journal, "Reset", 1).await;
    wait_for(&journal, "TableUpdated", 2).await;

    handle.shutdown();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn test_unknown_group_is_fatal() {
    let config = config(&["clock"]);
    let repository = create_repository(&config);
    let (tx, source) = channel::<TickCommand>();

    let handle = Bus::builder(repository)
        .register(Capabilities::<TickCommand, TickEvent>::new().source(source))
        .build()
        .start(Shutdown::new());

    tx.send(TickCommand::tick(
        TableId::for_group("unknown"),
        chrono::Utc::now(),
    ))
    .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), handle.wait())
        .await
        .expect("bus should stop on its own");
    assert!(matches!(result, Err(BusError::Load { .. })));
}

#[tokio::test]
async fn test_default_wiring_runs_until_shutdown() {
    let config = config(&["clock"]);
    let repository = create_repository(&config);
    let journal = Journal::new();

    let bus = build_bus(&config, repository.clone(), journal.clone());
    assert_eq!(bus.consumer_count(), 1);
    assert_eq!(bus.source_count(), 1);
    assert_eq!(bus.config().max_concurrent_commands, Some(1));

    let shutdown = Shutdown::new();
    let handle = bus.start(shutdown.clone());

    wait_for(&journal, "Ticked", 2).await;
    wait_for(&journal, "TableUpdated", 1).await;
    assert!(handle.is_running());

    shutdown.trigger();
    handle.wait().await.unwrap();
    assert_eq!(repository.len().await, 1);
}

#[test]
fn test_configured_command_bound_is_kept() {
    let mut config = config(&["clock"]);
    config.bus = config.bus.with_max_concurrent_commands(8);

    let bus = build_bus(&config, create_repository(&config), Journal::new());
    assert_eq!(bus.config().max_concurrent_commands, Some(8));
}

#[tokio::test]
async fn test_run_returns_ok_after_shutdown() {
    let config = config(&["clock"]);
    let shutdown = Shutdown::new();

    let runner = tokio::spawn({
        let config = config.clone();
        let shutdown = shutdown.clone();
        async move { tablebusd::run(&config, shutdown).await }
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(2), runner)
        .await
        .expect("run did not return")
        .unwrap();
    assert!(result.is_ok());
}
