//! Snapshot types exchanged between the remote store, the local cache and the
//! application.
//!
//! A [`Snapshot`] is the whole dataset at one remote version. Its
//! `version_id` is only ever assigned by the remote store; nothing in this
//! crate mints one.

use crate::{error::Result, EntityRecord, Error, SchemaDef, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Informational annotations. Never consulted for equality or sync decisions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    /// When the snapshot was fetched from the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    /// Number of schemas at fetch time
    pub schema_count: usize,
    /// Number of records at fetch time
    pub record_count: usize,
}

/// Schemas and records without a version: the candidate a push sends.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotContent {
    #[serde(default)]
    pub schemas: Vec<SchemaDef>,
    #[serde(default)]
    pub records: Vec<EntityRecord>,
}

impl SnapshotContent {
    pub fn new(schemas: Vec<SchemaDef>, records: Vec<EntityRecord>) -> Self {
        Self { schemas, records }
    }

    /// Number of entries a push of this content transfers.
    pub fn change_count(&self) -> usize {
        self.schemas.len() + self.records.len()
    }

    /// Attach the version the remote store assigned to this content.
    pub fn into_snapshot(self, version_id: impl Into<VersionId>) -> Snapshot {
        Snapshot {
            version_id: version_id.into(),
            schemas: self.schemas,
            records: self.records,
            meta: None,
        }
    }
}

/// The entire dataset at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Remote-assigned version token (e.g. a commit hash)
    pub version_id: VersionId,
    /// Schema definitions, unique by name
    #[serde(default)]
    pub schemas: Vec<SchemaDef>,
    /// Records, unique by `(schema, id)`
    #[serde(default)]
    pub records: Vec<EntityRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SnapshotMeta>,
}

impl Snapshot {
    /// Create a snapshot at `version_id`.
    pub fn new(
        version_id: impl Into<VersionId>,
        schemas: Vec<SchemaDef>,
        records: Vec<EntityRecord>,
    ) -> Self {
        Self {
            version_id: version_id.into(),
            schemas,
            records,
            meta: None,
        }
    }

    /// An empty dataset at `version_id`.
    pub fn empty(version_id: impl Into<VersionId>) -> Self {
        Self::new(version_id, Vec::new(), Vec::new())
    }

    /// Builder-style method to attach metadata.
    pub fn with_meta(mut self, meta: SnapshotMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Two snapshots describe the same remote state iff their versions match.
    pub fn same_state(&self, other: &Snapshot) -> bool {
        self.version_id == other.version_id
    }

    /// Copy of the schemas and records, without the version.
    pub fn content(&self) -> SnapshotContent {
        SnapshotContent {
            schemas: self.schemas.clone(),
            records: self.records.clone(),
        }
    }

    /// A new snapshot with the same content at `version_id`.
    ///
    /// If metadata is present its counts are recomputed; `fetched_at` is kept.
    pub fn with_version(&self, version_id: impl Into<VersionId>) -> Snapshot {
        let mut next = Snapshot {
            version_id: version_id.into(),
            ..self.clone()
        };
        next.meta = self
            .meta
            .as_ref()
            .map(|meta| next.summary(meta.fetched_at));
        next
    }

    pub fn change_count(&self) -> usize {
        self.schemas.len() + self.records.len()
    }

    /// Find a schema by name.
    pub fn find_schema(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Find a record by `(schema, id)`.
    pub fn find_record(&self, schema: &str, id: &str) -> Option<&EntityRecord> {
        self.records
            .iter()
            .find(|r| r.schema == schema && r.id == id)
    }

    /// All records of one schema, in snapshot order.
    pub fn records_of<'a>(&'a self, schema: &'a str) -> impl Iterator<Item = &'a EntityRecord> {
        self.records.iter().filter(move |r| r.schema == schema)
    }

    /// Counters describing this snapshot, stamped with `fetched_at`.
    pub fn summary(&self, fetched_at: Option<DateTime<Utc>>) -> SnapshotMeta {
        SnapshotMeta {
            fetched_at,
            schema_count: self.schemas.len(),
            record_count: self.records.len(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        if snapshot.version_id.is_empty() {
            return Err(Error::InvalidSnapshot("versionId must not be empty".into()));
        }

        Ok(snapshot)
    }
}

/// What the local cache persists between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Last stored snapshot, absent on first run
    pub snapshot: Option<Snapshot>,
    /// Snapshot holds local edits not confirmed pushed
    pub dirty: bool,
}

impl CacheRecord {
    /// Nothing stored yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(snapshot: Snapshot, dirty: bool) -> Self {
        Self {
            snapshot: Some(snapshot),
            dirty,
        }
    }

    /// Confirmed identical to a remote state.
    pub fn clean(snapshot: Snapshot) -> Self {
        Self::new(snapshot, false)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn version_id(&self) -> Option<&str> {
        self.snapshot.as_ref().map(|s| s.version_id.as_str())
    }
}
