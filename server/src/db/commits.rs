//! Database operations for the commits and head tables.
//!
//! Every accepted snapshot is an immutable row in `commits`; `head` is a
//! single row naming the current one. Moving the head happens only inside a
//! transaction that holds the head row lock.

use canon_engine::{
    wire::CommitSummary, EntityRecord, SchemaDef, Snapshot, SnapshotContent, VersionId,
};
use sqlx::{types::Json, PgConnection, PgPool, Row};

/// A stored commit row from the database.
#[derive(Debug)]
pub struct StoredCommit {
    pub version_id: String,
    pub parent_id: Option<String>,
    pub schemas: Json<Vec<SchemaDef>>,
    pub records: Json<Vec<EntityRecord>>,
    pub created_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredCommit {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredCommit {
            version_id: row.try_get("version_id")?,
            parent_id: row.try_get("parent_id")?,
            schemas: row.try_get("schemas")?,
            records: row.try_get("records")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl StoredCommit {
    /// Convert database row to a canon-engine Snapshot.
    pub fn into_snapshot(self) -> Snapshot {
        Snapshot::new(self.version_id, self.schemas.0, self.records.0)
    }
}

/// A commit log row without content.
#[derive(Debug)]
struct StoredSummary {
    version_id: String,
    parent_id: Option<String>,
    created_at: i64,
    schema_count: i32,
    record_count: i32,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredSummary {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredSummary {
            version_id: row.try_get("version_id")?,
            parent_id: row.try_get("parent_id")?,
            created_at: row.try_get("created_at")?,
            schema_count: row.try_get("schema_count")?,
            record_count: row.try_get("record_count")?,
        })
    }
}

impl From<StoredSummary> for CommitSummary {
    fn from(row: StoredSummary) -> Self {
        CommitSummary {
            version_id: row.version_id,
            parent_id: row.parent_id,
            created_at: row.created_at,
            schema_count: usize::try_from(row.schema_count).unwrap_or_default(),
            record_count: usize::try_from(row.record_count).unwrap_or_default(),
        }
    }
}

/// Mint a fresh, opaque version id.
pub fn new_version_id() -> VersionId {
    uuid::Uuid::new_v4().to_string()
}

/// Make sure a head exists, creating an empty root commit on first start.
pub async fn ensure_root(pool: &PgPool) -> Result<VersionId, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Serializes concurrent first starts.
    sqlx::query("LOCK TABLE head IN EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let existing: Option<String> = sqlx::query_scalar("SELECT version_id FROM head WHERE id")
        .fetch_optional(&mut *tx)
        .await?;
    if let Some(version_id) = existing {
        tx.commit().await?;
        return Ok(version_id);
    }

    let root = new_version_id();
    insert_commit(&mut tx, &root, None, &SnapshotContent::default()).await?;
    sqlx::query("INSERT INTO head (id, version_id) VALUES (TRUE, $1)")
        .bind(&root)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(version_id = %root, "created root commit");
    Ok(root)
}

/// Load the commit the head points at.
pub async fn load_head(pool: &PgPool) -> Result<StoredCommit, sqlx::Error> {
    sqlx::query_as::<_, StoredCommit>(
        r#"
        SELECT c.version_id, c.parent_id, c.schemas, c.records, c.created_at
        FROM head h
        JOIN commits c ON c.version_id = h.version_id
        WHERE h.id
        "#,
    )
    .fetch_one(pool)
    .await
}

/// Read the head version and hold its row lock until the transaction ends.
pub async fn lock_head(conn: &mut PgConnection) -> Result<VersionId, sqlx::Error> {
    sqlx::query_scalar("SELECT version_id FROM head WHERE id FOR UPDATE")
        .fetch_one(conn)
        .await
}

/// Insert a commit row.
pub async fn insert_commit(
    conn: &mut PgConnection,
    version_id: &str,
    parent_id: Option<&str>,
    content: &SnapshotContent,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO commits (version_id, parent_id, schemas, records, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(version_id)
    .bind(parent_id)
    .bind(Json(&content.schemas))
    .bind(Json(&content.records))
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

/// Point the head at `version_id`.
pub async fn move_head(conn: &mut PgConnection, version_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE head SET version_id = $1 WHERE id")
        .bind(version_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Commit summaries, newest first.
pub async fn list_commits(pool: &PgPool, limit: i64) -> Result<Vec<CommitSummary>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StoredSummary>(
        r#"
        SELECT version_id, parent_id, created_at,
               jsonb_array_length(schemas) AS schema_count,
               jsonb_array_length(records) AS record_count
        FROM commits
        ORDER BY seq DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CommitSummary::from).collect())
}
