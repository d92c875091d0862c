//! Shared identity types used across the table bus crates.

pub mod types;

pub use types::{CommandId, TableId};
