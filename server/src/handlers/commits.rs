//! Commit log handler.

use crate::db;
use crate::error::Result;
use canon_engine::wire::CommitSummary;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Query parameters for the commit log.
#[derive(Debug, Default, Deserialize)]
pub struct CommitsQuery {
    /// Maximum number of commits to return
    pub limit: Option<i64>,
}

/// Response for the commit log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitsResponse {
    /// Commits, newest first
    pub commits: Vec<CommitSummary>,
}

/// Default limit for the commit log.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum limit for the commit log.
const MAX_LIMIT: i64 = 500;

impl CommitsQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .map(|l| l.clamp(1, MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }
}

/// List recent commits.
pub async fn handle_commits(pool: &PgPool, query: CommitsQuery) -> Result<CommitsResponse> {
    let commits = db::list_commits(pool, query.effective_limit()).await?;
    Ok(CommitsResponse { commits })
}
