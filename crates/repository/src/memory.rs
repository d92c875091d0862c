use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Table, TableUpdated};
use tokio::sync::RwLock;

use crate::{Repository, Result, TableId};

/// Builds live tables from their last persisted snapshot.
pub trait TableFactory: Send + Sync + 'static {
    /// The table type this factory builds.
    type Table: Table;

    /// Creates a table for `id`, restoring `snapshot` if one was saved.
    fn create_table(&self, id: TableId, snapshot: Option<TableUpdated>) -> Result<Self::Table>;
}

/// In-memory repository keeping the latest snapshot per table.
///
/// Suitable for tests and for running the bus without durable storage.
pub struct InMemoryRepository<F> {
    factory: Arc<F>,
    snapshots: Arc<RwLock<HashMap<TableId, TableUpdated>>>,
}

impl<F> Clone for InMemoryRepository<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            snapshots: Arc::clone(&self.snapshots),
        }
    }
}

impl<F: TableFactory> InMemoryRepository<F> {
    /// Creates an empty repository building tables with `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            snapshots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the latest snapshot saved for a table.
    pub async fn snapshot(&self, id: &TableId) -> Option<TableUpdated> {
        self.snapshots.read().await.get(id).cloned()
    }

    /// Returns the number of tables with a saved snapshot.
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }

    /// Clears all snapshots.
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl<F: TableFactory> Repository for InMemoryRepository<F> {
    type Table = F::Table;

    async fn load(&self, id: &TableId) -> Result<Self::Table> {
        let snapshot = self.snapshots.read().await.get(id).cloned();
        tracing::trace!(table = %id, restored = snapshot.is_some(), "loading table");
        self.factory.create_table(id.clone(), snapshot)
    }

    async fn save(&self, update: &TableUpdated) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(update.table_id.clone(), update.clone());
        metrics::gauge!("repository_tables_stored").set(snapshots.len() as f64);
        Ok(())
    }
}
