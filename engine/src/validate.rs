//! Structural validation of snapshot content.
//!
//! Validation is the application's job, not the orchestrator's: call a
//! [`Validator`] before committing an edit locally or before accepting a push
//! on the server side.

use crate::{error::Result, Error, SnapshotContent};
use std::collections::{HashMap, HashSet};

/// Checks snapshot content for structural problems.
pub trait Validator: Send + Sync {
    fn validate(&self, content: &SnapshotContent) -> Result<()>;
}

impl<F> Validator for F
where
    F: Fn(&SnapshotContent) -> Result<()> + Send + Sync,
{
    fn validate(&self, content: &SnapshotContent) -> Result<()> {
        self(content)
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _content: &SnapshotContent) -> Result<()> {
        Ok(())
    }
}

/// Validates content against the schemas it carries.
///
/// Checks, in order:
/// 1. Schema names are unique
/// 2. Every record names a known schema
/// 3. `(schema, id)` pairs are unique
/// 4. Each payload satisfies its schema's field definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl Validator for SchemaValidator {
    fn validate(&self, content: &SnapshotContent) -> Result<()> {
        let mut schemas = HashMap::with_capacity(content.schemas.len());
        for schema in &content.schemas {
            if schemas.insert(schema.name.as_str(), schema).is_some() {
                return Err(Error::DuplicateSchema(schema.name.clone()));
            }
        }

        let mut seen = HashSet::with_capacity(content.records.len());
        for record in &content.records {
            let schema = schemas
                .get(record.schema.as_str())
                .ok_or_else(|| Error::SchemaNotFound(record.schema.clone()))?;

            if !seen.insert(record.key()) {
                return Err(Error::DuplicateRecord {
                    schema: record.schema.clone(),
                    id: record.id.clone(),
                });
            }

            schema.validate_payload(&record.data)?;
        }

        Ok(())
    }
}
