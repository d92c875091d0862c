//! In-process command/event dispatch bus.
//!
//! Commands flow from registered [`CommandSource`](domain::CommandSource)s
//! into the command loop, which loads the target table from the
//! [`Repository`](repository::Repository) and lets it handle the command.
//! The resulting events flow into the event loop, which persists table
//! snapshots and then notifies every registered
//! [`EventConsumer`](domain::EventConsumer).
//!
//! - [`BusBuilder`] wires the repository, configuration and components
//! - [`Bus::start`] launches the loops and returns a [`BusHandle`]
//! - [`BusHandle::wait`] surfaces the first fatal load/save error

pub mod bus;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod limit;
pub mod registry;

pub use bus::{Bus, BusBuilder, BusHandle, CommandOf, EventOf};
pub use config::BusConfig;
pub use error::{BusError, Result};
pub use lifecycle::Shutdown;
pub use limit::ConcurrencyLimit;
pub use registry::{Capabilities, Component};
