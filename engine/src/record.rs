//! Entity records.

use crate::{RecordId, SchemaName};
use serde::{Deserialize, Serialize};

/// A content entry belonging to one schema.
///
/// Records are identified by `(schema, id)`; the same `id` may appear under
/// different schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Schema this record belongs to
    pub schema: SchemaName,
    /// Identifier, unique within the schema
    pub id: RecordId,
    /// Field values (JSON object)
    pub data: serde_json::Value,
}

impl EntityRecord {
    /// Create a new record.
    pub fn new(
        schema: impl Into<SchemaName>,
        id: impl Into<RecordId>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            schema: schema.into(),
            id: id.into(),
            data,
        }
    }

    /// The `(schema, id)` identity of this record.
    pub fn key(&self) -> (&str, &str) {
        (&self.schema, &self.id)
    }

    /// Read a single field from the payload.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.as_object()?.get(field)
    }
}
