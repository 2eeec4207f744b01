//! Snapshot handlers - serve the head and accept conditional replacements.

use crate::db;
use crate::error::{AppError, Result};
use canon_engine::{
    wire::{ConflictResponse, PushRequest, PushResponse, SnapshotResponse},
    Validator,
};
use sqlx::PgPool;

/// Current head snapshot.
pub async fn handle_fetch(pool: &PgPool) -> Result<SnapshotResponse> {
    let head = db::load_head(pool).await?;
    Ok(head.into_snapshot().into())
}

/// Replace the head with the pushed content iff the client's base is current.
///
/// The head row stays locked from the comparison until the new commit is
/// visible, so two pushes on the same base cannot both succeed.
pub async fn handle_replace(
    pool: &PgPool,
    validator: &dyn Validator,
    request: PushRequest,
) -> Result<PushResponse> {
    let mut tx = pool.begin().await?;

    let head = db::lock_head(&mut tx).await?;
    if head != request.base_version_id {
        return Err(AppError::Conflict(ConflictResponse {
            base_version_id: request.base_version_id,
            actual_version_id: head,
        }));
    }

    let content = request.into_content();
    validator.validate(&content)?;

    let new_version_id = db::new_version_id();
    db::insert_commit(&mut tx, &new_version_id, Some(&head), &content).await?;
    db::move_head(&mut tx, &new_version_id).await?;
    tx.commit().await?;

    tracing::info!(
        parent = %head,
        version_id = %new_version_id,
        schemas = content.schemas.len(),
        records = content.records.len(),
        "accepted snapshot"
    );

    Ok(PushResponse { new_version_id })
}
