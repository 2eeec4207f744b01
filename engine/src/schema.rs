//! Schema definitions.
//!
//! A schema describes the shape of one kind of content entry (a "post", an
//! "author", ...). Schemas travel inside every snapshot so the remote store
//! is self-describing.

use crate::{error::Result, Error, SchemaName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Field types supported in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    /// Milliseconds since epoch
    Timestamp,
    /// Arbitrary nested JSON
    Json,
    /// Id of a record in another schema
    Reference,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::Bool => "Bool",
            FieldType::Timestamp => "Timestamp",
            FieldType::Json => "Json",
            FieldType::Reference => "Reference",
        }
    }

    /// Whether a non-null `value` is acceptable for this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String | FieldType::Reference => value.is_string(),
            FieldType::Int | FieldType::Timestamp => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Json => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// Absent or `null` values are rejected when set
    #[serde(default)]
    pub required: bool,
}

impl FieldDef {
    fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
        }
    }

    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, true)
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, false)
    }

    /// Check the value stored under this field in a record payload.
    pub fn validate(&self, value: Option<&Value>) -> Result<()> {
        let value = match value {
            Some(Value::Null) | None if self.required => {
                return Err(Error::MissingRequiredField(self.name.clone()))
            }
            Some(Value::Null) | None => return Ok(()),
            Some(value) => value,
        };

        if self.field_type.accepts(value) {
            return Ok(());
        }
        Err(Error::TypeMismatch {
            field: self.name.clone(),
            expected: self.field_type.to_string(),
            got: kind_of(value).to_string(),
        })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_f64() => "Float",
        Value::Number(_) => "Int",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// A named schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDef {
    /// Schema name, unique within a snapshot
    pub name: SchemaName,
    /// Field definitions in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl SchemaDef {
    pub fn new(name: impl Into<SchemaName>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Builder-style method to add a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check a record payload. Keys not declared here are allowed.
    pub fn validate_payload(&self, payload: &Value) -> Result<()> {
        let Some(object) = payload.as_object() else {
            return Err(Error::InvalidPayload(format!(
                "{} payload must be an object, got {}",
                self.name,
                kind_of(payload)
            )));
        };

        self.fields
            .iter()
            .try_for_each(|field| field.validate(object.get(&field.name)))
    }
}
