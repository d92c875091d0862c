//! Event contract and the table snapshot event.

use chrono::{DateTime, Utc};
use common::TableId;
use serde::{Deserialize, Serialize};

/// An outcome produced by a table while handling a command.
///
/// Implementations are closed enums. The bus inspects exactly one variant:
/// whatever [`Event::as_table_updated`] exposes is persisted before any
/// consumer sees the event.
pub trait Event: std::fmt::Debug + Clone + Send + Sync + 'static {
    /// Returns the event type name, used in logs and metrics.
    fn event_type(&self) -> &'static str;

    /// Returns the snapshot carried by this event if it is a table update.
    fn as_table_updated(&self) -> Option<&TableUpdated>;
}

/// The new state of a table after it handled a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableUpdated {
    /// The table this snapshot belongs to.
    pub table_id: TableId,

    /// When the table produced this state.
    pub updated_at: DateTime<Utc>,

    /// The serialized table state.
    pub state: serde_json::Value,
}

impl TableUpdated {
    /// Creates a snapshot from raw JSON state.
    pub fn new(table_id: TableId, state: serde_json::Value) -> Self {
        Self {
            table_id,
            updated_at: Utc::now(),
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(table_id: TableId, state: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            table_id,
            updated_at: Utc::now(),
            state: serde_json::to_value(state)?,
        })
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }

    pub fn group(&self) -> &str {
        self.table_id.group()
    }

    pub fn name(&self) -> &str {
        self.table_id.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rows {
        rows: Vec<u32>,
    }

    #[test]
    fn table_updated_new() {
        let id = TableId::new("quotes", "GAZP");
        let state = serde_json::json!({"close": 161.5});

        let update = TableUpdated::new(id.clone(), state.clone());

        assert_eq!(update.table_id, id);
        assert_eq!(update.group(), "quotes");
        assert_eq!(update.name(), "GAZP");
        assert_eq!(update.state, state);
    }

    #[test]
    fn table_updated_from_state_and_into_state() {
        let original = Rows {
            rows: vec![1, 2, 3],
        };

        let update = TableUpdated::from_state(TableId::for_group("cpi"), &original).unwrap();

        let restored: Rows = update.into_state().unwrap();
        assert_eq!(restored, original);
    }
}
