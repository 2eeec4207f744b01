//! Snapshot and commit log routes.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use canon_engine::wire::{
    PushRequest, PushResponse, SnapshotResponse, COMMITS_PATH, SNAPSHOT_PATH,
};

use crate::auth::Writer;
use crate::error::Result;
use crate::handlers::{
    handle_commits, handle_fetch, handle_replace, CommitsQuery, CommitsResponse,
};
use crate::AppState;

/// Create snapshot routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(SNAPSHOT_PATH, get(fetch_handler).put(replace_handler))
        .route(COMMITS_PATH, get(commits_handler))
}

/// GET /snapshot - Current head.
async fn fetch_handler(State(state): State<AppState>) -> Result<Json<SnapshotResponse>> {
    let response = handle_fetch(&state.pool).await?;
    Ok(Json(response))
}

/// PUT /snapshot - Conditional replace.
async fn replace_handler(
    State(state): State<AppState>,
    _writer: Writer,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>> {
    let response = handle_replace(&state.pool, state.validator.as_ref(), request).await?;
    Ok(Json(response))
}

/// GET /commits - Commit log, newest first.
async fn commits_handler(
    State(state): State<AppState>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<CommitsResponse>> {
    let response = handle_commits(&state.pool, query).await?;
    Ok(Json(response))
}
