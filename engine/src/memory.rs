//! In-memory implementations of the ports.
//!
//! Useful for tests, demos and as an offline scratch backend. The remote
//! keeps its full commit history and assigns versions deterministically:
//! commit `n` (1-based) is `v{n}`, so a remote seeded at `v1` mints `v2` next.
//! An id already present in the history is never minted again.

use crate::{
    error::Result,
    port::{LocalCache, PushReceipt, RemoteStore},
    CacheRecord, Error, Snapshot, SnapshotContent, VersionId,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A remote store held in memory.
#[derive(Debug)]
pub struct MemoryRemote {
    history: Mutex<Vec<Snapshot>>,
}

impl MemoryRemote {
    /// Create a remote whose first commit is `initial`.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            history: Mutex::new(vec![initial]),
        }
    }

    /// Version of the current head.
    pub async fn head_version(&self) -> VersionId {
        let history = self.history.lock().await;
        history
            .last()
            .map(|s| s.version_id.clone())
            .unwrap_or_default()
    }

    /// Every commit, oldest first.
    pub async fn history(&self) -> Vec<Snapshot> {
        self.history.lock().await.clone()
    }

    /// Commit `content` unconditionally, as another writer would.
    pub async fn commit(&self, content: SnapshotContent) -> VersionId {
        let mut history = self.history.lock().await;
        let version_id = next_version(&history);
        history.push(content.into_snapshot(version_id.clone()));
        version_id
    }
}

/// `v{n}` for the next position, skipping ids the history already holds.
fn next_version(history: &[Snapshot]) -> VersionId {
    (history.len() + 1..)
        .map(|n| format!("v{n}"))
        .find(|candidate| history.iter().all(|s| &s.version_id != candidate))
        .unwrap_or_default()
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self) -> Result<Snapshot> {
        let history = self.history.lock().await;
        history
            .last()
            .cloned()
            .ok_or_else(|| Error::RemoteUnavailable("remote has no commits".into()))
    }

    async fn push(&self, base_version_id: &str, candidate: SnapshotContent) -> Result<PushReceipt> {
        let mut history = self.history.lock().await;
        let head = history
            .last()
            .map(|s| s.version_id.as_str())
            .unwrap_or_default();

        if head != base_version_id {
            return Err(Error::OutOfDate {
                base: base_version_id.to_string(),
                actual: head.to_string(),
            });
        }

        let new_version_id = next_version(&history);
        history.push(candidate.into_snapshot(new_version_id.clone()));
        tracing::trace!(base = base_version_id, new = %new_version_id, "memory remote commit");

        Ok(PushReceipt { new_version_id })
    }

    async fn probe(&self) -> Result<()> {
        Ok(())
    }
}

/// A local cache held in memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    record: Mutex<CacheRecord>,
}

impl MemoryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache pre-populated with `record`.
    pub fn with_record(record: CacheRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    /// Current contents.
    pub async fn snapshot(&self) -> CacheRecord {
        self.record.lock().await.clone()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn load(&self) -> Result<CacheRecord> {
        Ok(self.record.lock().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot, dirty: bool) -> Result<()> {
        *self.record.lock().await = CacheRecord::new(snapshot.clone(), dirty);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.record.lock().await = CacheRecord::empty();
        Ok(())
    }
}
