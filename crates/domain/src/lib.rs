//! Domain contracts for the table bus.
//!
//! This crate defines what the bus dispatches and who it talks to:
//! - [`Command`] and [`Event`] traits for the messages flowing through the bus
//! - [`TableUpdated`], the snapshot event the bus persists before notifying
//! - [`Table`] trait for aggregates that turn commands into events
//! - [`EventConsumer`] and [`CommandSource`] capabilities for registered components

pub mod capability;
pub mod command;
pub mod event;
pub mod table;

pub use capability::{
    ChannelSource, CommandSender, CommandSource, CommandStream, EventConsumer, StreamSource,
    channel,
};
pub use command::Command;
pub use common::{CommandId, TableId};
pub use event::{Event, TableUpdated};
pub use table::Table;
