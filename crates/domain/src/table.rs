//! Table (aggregate) contract.

use async_trait::async_trait;
use common::TableId;

use crate::command::Command;
use crate::event::Event;

/// A state machine for one `(group, name)` pair.
///
/// A table is loaded fresh for every command, handles it in memory and is
/// dropped afterwards. Persisting the new state is delegated to the bus via
/// a [`TableUpdated`](crate::TableUpdated) event.
///
/// Handling must be a pure function of the table's state and the command as
/// far as the bus is concerned, and must only emit events about [`Table::id`].
#[async_trait]
pub trait Table: Send + 'static {
    /// The commands this table accepts.
    type Command: Command;

    /// The events this table emits.
    type Event: Event;

    /// Returns the id of this table.
    fn id(&self) -> &TableId;

    /// Handles a command, returning the resulting events in order.
    async fn handle_command(&mut self, command: &Self::Command) -> Vec<Self::Event>;
}
