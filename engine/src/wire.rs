//! HTTP wire shapes for the canonical store service.
//!
//! Shared by `canon-server` and the HTTP remote adapter so both sides agree
//! on field names.

use crate::{EntityRecord, SchemaDef, Snapshot, SnapshotContent, VersionId};
use serde::{Deserialize, Serialize};

/// Path of the snapshot resource.
pub const SNAPSHOT_PATH: &str = "/snapshot";

/// Path of the health probe.
pub const HEALTH_PATH: &str = "/health";

/// Path of the commit log.
pub const COMMITS_PATH: &str = "/commits";

/// Body of `GET /snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub version_id: VersionId,
    #[serde(default)]
    pub schemas: Vec<SchemaDef>,
    #[serde(default)]
    pub records: Vec<EntityRecord>,
}

impl From<SnapshotResponse> for Snapshot {
    fn from(response: SnapshotResponse) -> Self {
        Snapshot::new(response.version_id, response.schemas, response.records)
    }
}

impl From<Snapshot> for SnapshotResponse {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            version_id: snapshot.version_id,
            schemas: snapshot.schemas,
            records: snapshot.records,
        }
    }
}

/// Body of `PUT /snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Version the client believes is current
    pub base_version_id: VersionId,
    #[serde(default)]
    pub schemas: Vec<SchemaDef>,
    #[serde(default)]
    pub records: Vec<EntityRecord>,
}

impl PushRequest {
    pub fn new(base_version_id: impl Into<VersionId>, content: SnapshotContent) -> Self {
        Self {
            base_version_id: base_version_id.into(),
            schemas: content.schemas,
            records: content.records,
        }
    }

    pub fn into_content(self) -> SnapshotContent {
        SnapshotContent::new(self.schemas, self.records)
    }
}

/// `200` body of `PUT /snapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub new_version_id: VersionId,
}

/// `409` body of `PUT /snapshot`: the store moved past the base version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResponse {
    pub base_version_id: VersionId,
    pub actual_version_id: VersionId,
}

/// One entry of `GET /commits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub version_id: VersionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<VersionId>,
    /// Milliseconds since epoch
    pub created_at: i64,
    pub schema_count: usize,
    pub record_count: usize,
}
