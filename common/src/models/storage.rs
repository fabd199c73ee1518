//! Storage unit and row models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::connection::Record;

/// Attribute key carrying a table's declared kind.
pub const TABLE_TYPE_ATTRIBUTE: &str = "Table Type";

/// A table, collection or key within a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StorageUnit {
    pub name: String,
    /// Backend-specific metadata in display order.
    pub attributes: Vec<Record>,
}

impl StorageUnit {
    pub fn new(name: impl Into<String>, attributes: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Returns the value of the first attribute named `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.as_str())
    }
}

/// Rectangular grid of stringified cell values.
///
/// Column order follows the backend's projection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RowSet {
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One message of an assisted-query conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub message_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RowSet>,
}
