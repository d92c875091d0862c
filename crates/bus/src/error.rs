//! Bus error types.

use common::TableId;
use repository::RepositoryError;
use thiserror::Error;

/// Fatal errors that stop the bus.
///
/// The bus never retries: the first of these halts dispatching and is
/// returned from [`BusHandle::wait`](crate::BusHandle::wait) so a supervisor
/// can restart the process.
#[derive(Debug, Error)]
pub enum BusError {
    /// The repository could not load the table a command targets.
    #[error("Failed to load table {table}: {source}")]
    Load {
        table: TableId,
        #[source]
        source: RepositoryError,
    },

    /// The repository could not persist a table snapshot.
    #[error("Failed to save table {table}: {source}")]
    Save {
        table: TableId,
        #[source]
        source: RepositoryError,
    },

    /// A dispatch loop, or a table or consumer inside a handling task,
    /// panicked.
    #[error("Dispatch task panicked: {0}")]
    TaskPanicked(String),
}

impl BusError {
    /// Returns the table involved in the failure, if any.
    pub fn table(&self) -> Option<&TableId> {
        match self {
            BusError::Load { table, .. } | BusError::Save { table, .. } => Some(table),
            BusError::TaskPanicked(_) => None,
        }
    }
}

/// Convenience type alias for bus results.
pub type Result<T> = std::result::Result<T, BusError>;
