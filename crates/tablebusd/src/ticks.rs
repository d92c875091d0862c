//! Tick tables: one counter per group, advanced by scheduled ticks.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CommandId, TableId};
use domain::{Command, Event, Table, TableUpdated};
use repository::{RepositoryError, TableFactory};
use serde::{Deserialize, Serialize};

/// Commands accepted by [`TickTable`].
#[derive(Debug, Clone)]
pub enum TickCommand {
    /// Records a tick that happened at `at`.
    Tick {
        id: CommandId,
        table: TableId,
        at: DateTime<Utc>,
    },
    /// Clears the counter.
    Reset { id: CommandId, table: TableId },
}

impl TickCommand {
    /// Creates a tick for `table` observed at `at`.
    pub fn tick(table: TableId, at: DateTime<Utc>) -> Self {
        TickCommand::Tick {
            id: CommandId::new(),
            table,
            at,
        }
    }

    /// Creates a reset for `table`.
    pub fn reset(table: TableId) -> Self {
        TickCommand::Reset {
            id: CommandId::new(),
            table,
        }
    }

    /// Returns the command's unique id.
    pub fn id(&self) -> CommandId {
        match self {
            TickCommand::Tick { id, .. } | TickCommand::Reset { id, .. } => *id,
        }
    }
}

impl Command for TickCommand {
    fn table_id(&self) -> &TableId {
        match self {
            TickCommand::Tick { table, .. } | TickCommand::Reset { table, .. } => table,
        }
    }
}

/// Events emitted by [`TickTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    TableUpdated(TableUpdated),
    Ticked {
        table: TableId,
        count: u64,
        at: DateTime<Utc>,
    },
    Reset {
        table: TableId,
    },
}

impl Event for TickEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TickEvent::TableUpdated(_) => "TableUpdated",
            TickEvent::Ticked { .. } => "Ticked",
            TickEvent::Reset { .. } => "Reset",
        }
    }

    fn as_table_updated(&self) -> Option<&TableUpdated> {
        match self {
            TickEvent::TableUpdated(update) => Some(update),
            _ => None,
        }
    }
}

impl TickEvent {
    pub fn table_id(&self) -> &TableId {
        match self {
            TickEvent::TableUpdated(update) => &update.table_id,
            TickEvent::Ticked { table, .. } | TickEvent::Reset { table } => table,
        }
    }
}

/// Persisted state of a tick table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickState {
    pub count: u64,
    pub last_tick: Option<DateTime<Utc>>,
}

/// Counts the ticks a group has seen.
///
/// Ticks that are not newer than the last recorded one are ignored, so a
/// replayed or late tick leaves the table untouched.
///
/// The rule only holds when ticks for one table are handled one at a time.
/// Two concurrent command tasks can load the same snapshot, and the later
/// save wins even if it carries the older tick, so the daemon bounds
/// command tasks to one unless configured otherwise.
#[derive(Debug)]
pub struct TickTable {
    id: TableId,
    state: TickState,
}

impl TickTable {
    pub fn new(id: TableId, state: TickState) -> Self {
        Self { id, state }
    }

    pub fn state(&self) -> &TickState {
        &self.state
    }

    fn snapshot(&self) -> Option<TickEvent> {
        match TableUpdated::from_state(self.id.clone(), &self.state) {
            Ok(update) => Some(TickEvent::TableUpdated(update)),
            Err(e) => {
                tracing::warn!(table = %self.id, error = %e, "failed to serialize tick state");
                None
            }
        }
    }
}

#[async_trait]
impl Table for TickTable {
    type Command = TickCommand;
    type Event = TickEvent;

    fn id(&self) -> &TableId {
        &self.id
    }

    async fn handle_command(&mut self, command: &TickCommand) -> Vec<TickEvent> {
        match command {
            TickCommand::Tick { at, .. } => {
                if self.state.last_tick.is_some_and(|last| *at <= last) {
                    tracing::debug!(table = %self.id, %at, "stale tick ignored");
                    return Vec::new();
                }
                self.state.count += 1;
                self.state.last_tick = Some(*at);

                let mut events: Vec<TickEvent> = self.snapshot().into_iter().collect();
                events.push(TickEvent::Ticked {
                    table: self.id.clone(),
                    count: self.state.count,
                    at: *at,
                });
                events
            }
            TickCommand::Reset { .. } => {
                self.state = TickState::default();
                let mut events: Vec<TickEvent> = self.snapshot().into_iter().collect();
                events.push(TickEvent::Reset {
                    table: self.id.clone(),
                });
                events
            }
        }
    }
}

/// Builds tick tables for a fixed set of groups.
#[derive(Debug, Clone)]
pub struct TickFactory {
    groups: BTreeSet<String>,
}

impl TickFactory {
    pub fn new(groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }
}

impl TableFactory for TickFactory {
    type Table = TickTable;

    fn create_table(
        &self,
        id: TableId,
        snapshot: Option<TableUpdated>,
    ) -> repository::Result<TickTable> {
        if !self.groups.contains(id.group()) {
            return Err(RepositoryError::NotFound(id));
        }
        let state = match snapshot {
            Some(snapshot) if snapshot.table_id != id => {
                return Err(RepositoryError::Factory {
                    reason: format!("snapshot belongs to {}", snapshot.table_id),
                    table: id,
                });
            }
            Some(snapshot) => snapshot.into_state()?,
            None => TickState::default(),
        };
        Ok(TickTable::new(id, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn clock() -> TableId {
        TableId::for_group("clock")
    }

    #[tokio::test]
    async fn tick_advances_counter_and_emits_snapshot_first() {
        let mut table = TickTable::new(clock(), TickState::default());

        let events = table.handle_command(&TickCommand::tick(clock(), at(10))).await;

        assert_eq!(events.len(), 2);
        let update = events[0].as_table_updated().expect("snapshot first");
        let state: TickState = update.clone().into_state().unwrap();
        assert_eq!(
            state,
            TickState {
                count: 1,
                last_tick: Some(at(10)),
            }
        );
        assert_eq!(
            events[1],
            TickEvent::Ticked {
                table: clock(),
                count: 1,
                at: at(10),
            }
        );
    }

    #[tokio::test]
    async fn stale_tick_is_ignored() {
        let mut table = TickTable::new(
            clock(),
            TickState {
                count: 3,
                last_tick: Some(at(100)),
            },
        );

        let events = table.handle_command(&TickCommand::tick(clock(), at(100))).await;
        assert!(events.is_empty());
        let events = table.handle_command(&TickCommand::tick(clock(), at(50))).await;
        assert!(events.is_empty());
        assert_eq!(table.state().count, 3);
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let mut table = TickTable::new(
            clock(),
            TickState {
                count: 7,
                last_tick: Some(at(5)),
            },
        );

        let events = table.handle_command(&TickCommand::reset(clock())).await;

        assert_eq!(table.state(), &TickState::default());
        assert_eq!(events[0].event_type(), "TableUpdated");
        assert_eq!(events[1], TickEvent::Reset { table: clock() });
    }

    #[test]
    fn events_name_their_table() {
        let event = TickEvent::Reset { table: clock() };
        assert_eq!(event.table_id(), &clock());
        assert!(event.as_table_updated().is_none());
    }

    #[test]
    fn commands_target_their_table() {
        let cmd = TickCommand::tick(TableId::new("clock", "fast"), at(1));
        assert_eq!(cmd.group(), "clock");
        assert_eq!(cmd.name(), "fast");
        assert_ne!(cmd.id(), TickCommand::reset(clock()).id());
    }

    #[test]
    fn factory_rejects_unknown_groups() {
        let factory = TickFactory::new(["clock"]);
        let result = factory.create_table(TableId::for_group("quotes"), None);
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn factory_rejects_snapshot_of_another_table() {
        let factory = TickFactory::new(["clock", "quotes"]);
        let snapshot =
            TableUpdated::from_state(TableId::for_group("quotes"), &TickState::default()).unwrap();

        let result = factory.create_table(clock(), Some(snapshot));
        match result {
            Err(RepositoryError::Factory { table, reason }) => {
                assert_eq!(table, clock());
                assert!(reason.contains("quotes"), "{reason}");
            }
            other => panic!("expected factory error, got {other:?}"),
        }
    }

    #[test]
    fn factory_restores_snapshot() {
        let factory = TickFactory::new(["clock"]);
        let state = TickState {
            count: 4,
            last_tick: Some(at(40)),
        };
        let snapshot = TableUpdated::from_state(clock(), &state).unwrap();

        let table = factory.create_table(clock(), Some(snapshot)).unwrap();
        assert_eq!(table.state(), &state);
    }
}
