use std::sync::Arc;

use async_trait::async_trait;
use bus::{Bus, BusConfig, Capabilities, Shutdown};
use common::TableId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Command, Event, EventConsumer, Table, TableUpdated, channel};
use repository::{InMemoryRepository, TableFactory};
use tokio::sync::mpsc;

#[derive(Debug)]
struct Touch {
    table: TableId,
}

impl Command for Touch {
    fn table_id(&self) -> &TableId {
        &self.table
    }
}

#[derive(Debug, Clone)]
enum Touched {
    Updated(TableUpdated),
    Seen,
}

impl Event for Touched {
    fn event_type(&self) -> &'static str {
        match self {
            Touched::Updated(_) => "TableUpdated",
            Touched::Seen => "Seen",
        }
    }

    fn as_table_updated(&self) -> Option<&TableUpdated> {
        match self {
            Touched::Updated(update) => Some(update),
            Touched::Seen => None,
        }
    }
}

struct TouchTable {
    id: TableId,
    touches: u64,
}

#[async_trait]
impl Table for TouchTable {
    type Command = Touch;
    type Event = Touched;

    fn id(&self) -> &TableId {
        &self.id
    }

    async fn handle_command(&mut self, _command: &Touch) -> Vec<Touched> {
        self.touches += 1;
        vec![
            Touched::Updated(TableUpdated::new(
                self.id.clone(),
                serde_json::json!({ "touches": self.touches }),
            )),
            Touched::Seen,
        ]
    }
}

struct TouchFactory;

impl TableFactory for TouchFactory {
    type Table = TouchTable;

    fn create_table(
        &self,
        id: TableId,
        snapshot: Option<TableUpdated>,
    ) -> repository::Result<TouchTable> {
        let touches = snapshot
            .and_then(|s| s.state.get("touches").and_then(|t| t.as_u64()))
            .unwrap_or(0);
        Ok(TouchTable { id, touches })
    }
}

struct Counter {
    done: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl EventConsumer<Touched> for Counter {
    async fn handle_event(&self, _event: &Touched) {
        let _ = self.done.send(());
    }
}

/// Pushes `n` commands across 10 tables and waits until every event was seen.
async fn dispatch(n: usize, config: BusConfig) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (tx, source) = channel();

    let handle = Bus::builder(InMemoryRepository::new(TouchFactory))
        .config(config)
        .register(
            Capabilities::<Touch, Touched>::new()
                .consumer(Arc::new(Counter { done: done_tx }))
                .source(source),
        )
        .build()
        .start(Shutdown::new());

    for i in 0..n {
        tx.send(Touch {
            table: TableId::new("bench", format!("t{}", i % 10)),
        })
        .unwrap();
    }
    for _ in 0..n * 2 {
        done_rx.recv().await.unwrap();
    }

    handle.shutdown();
    handle.wait().await.unwrap();
}

fn bench_dispatch_unbounded(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("bus/dispatch_1000_commands_unbounded", |b| {
        b.iter(|| rt.block_on(dispatch(1000, BusConfig::default())));
    });
}

fn bench_dispatch_bounded(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = BusConfig::default()
        .with_max_concurrent_commands(4)
        .with_max_concurrent_events(4);

    c.bench_function("bus/dispatch_1000_commands_bounded_4", |b| {
        b.iter(|| rt.block_on(dispatch(1000, config.clone())));
    });
}

criterion_group!(benches, bench_dispatch_unbounded, bench_dispatch_bounded);
criterion_main!(benches);
