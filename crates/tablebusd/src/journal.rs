//! Event consumer that logs and counts everything the bus dispatches.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bus::{Capabilities, Component};
use domain::{Event, EventConsumer};
use tokio::sync::RwLock;

use crate::ticks::{TickCommand, TickEvent};

/// Logs every event and keeps a count per event type.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    counts: Arc<RwLock<HashMap<&'static str, u64>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many events of `event_type` have been seen.
    pub async fn count(&self, event_type: &str) -> u64 {
        self.counts
            .read()
            .await
            .get(event_type)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the total number of events seen.
    pub async fn total(&self) -> u64 {
        self.counts.read().await.values().sum()
    }
}

#[async_trait]
impl EventConsumer<TickEvent> for Journal {
    async fn handle_event(&self, event: &TickEvent) {
        match event {
            TickEvent::Ticked { table, count, at } => {
                tracing::info!(table = %table, count, %at, "tick recorded");
            }
            TickEvent::Reset { table } => {
                tracing::info!(table = %table, "table reset");
            }
            TickEvent::TableUpdated(update) => {
                tracing::debug!(table = %update.table_id, "table snapshot saved");
            }
        }
        *self
            .counts
            .write()
            .await
            .entry(event.event_type())
            .or_insert(0) += 1;
    }
}

impl Component<TickCommand, TickEvent> for Journal {
    fn capabilities(self) -> Capabilities<TickCommand, TickEvent> {
        Capabilities::<TickCommand, TickEvent>::new().consumer(Arc::new(self))
    }
}
