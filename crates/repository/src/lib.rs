//! Table storage: the load/save gateway the bus talks to and an
//! in-memory implementation built on a table factory.

pub mod error;
pub mod memory;
pub mod repository;

pub use common::TableId;
pub use error::{RepositoryError, Result};
pub use memory::{InMemoryRepository, TableFactory};
pub use repository::Repository;
