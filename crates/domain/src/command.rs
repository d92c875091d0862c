//! Command contract.

use common::TableId;

/// A request to mutate exactly one table.
///
/// The bus only needs to know which table a command targets; the payload
/// is interpreted by the table itself.
pub trait Command: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the id of the table this command targets.
    fn table_id(&self) -> &TableId;

    /// Returns the group of the target table.
    fn group(&self) -> &str {
        self.table_id().group()
    }

    /// Returns the name of the target table.
    fn name(&self) -> &str {
        self.table_id().name()
    }
}
