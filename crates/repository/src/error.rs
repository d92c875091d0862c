use thiserror::Error;

use crate::TableId;

/// Errors that can occur when loading or saving tables.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No table can be built for the requested id.
    #[error("Table not found: {0}")]
    NotFound(TableId),

    /// A stored snapshot could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The table factory rejected the stored snapshot.
    #[error("Table factory error for {table}: {reason}")]
    Factory { table: TableId, reason: String },

    /// The underlying storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
