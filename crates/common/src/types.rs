use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one table (aggregate): a group namespace plus a name within it.
///
/// Every command targets exactly one `TableId`, and a table only emits
/// events about its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId {
    group: String,
    name: String,
}

impl TableId {
    /// Creates a table id from a group and a name.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Creates the id of a group-wide table, whose name equals its group.
    pub fn for_group(group: impl Into<String>) -> Self {
        let group = group.into();
        Self {
            name: group.clone(),
            group,
        }
    }

    /// Returns the group (namespace) of the table.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the name of the table within its group.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Unique identifier attached to every command for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(Uuid);

impl CommandId {
    /// Creates a new random command ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CommandId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
