use async_trait::async_trait;
use domain::{Table, TableUpdated};

use crate::{Result, TableId};

/// Persistence gateway used by the bus.
///
/// The bus calls it from many handling tasks at once, so implementations
/// must be safe for unbounded concurrent use.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// The table type this repository builds.
    type Table: Table;

    /// Loads a fresh table instance for the given id.
    async fn load(&self, id: &TableId) -> Result<Self::Table>;

    /// Persists a table snapshot.
    ///
    /// If a snapshot already exists for the table, it is replaced.
    async fn save(&self, update: &TableUpdated) -> Result<()>;
}

#[async_trait]
impl<R: Repository> Repository for std::sync::Arc<R> {
    type Table = R::Table;

    async fn load(&self, id: &TableId) -> Result<Self::Table> {
        (**self).load(id).await
    }

    async fn save(&self, update: &TableUpdated) -> Result<()> {
        (**self).save(update).await
    }
}
