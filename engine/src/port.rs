//! Ports the orchestrator talks through.
//!
//! Concrete adapters (a Git-hosting API, a filesystem, a browser store, the
//! in-memory doubles in [`crate::memory`]) implement these traits. Methods
//! that not every backend needs have default bodies instead of being
//! optional.

use crate::{error::Result, CacheRecord, Snapshot, SnapshotContent, VersionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of an accepted push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReceipt {
    /// Version the remote assigned to the pushed content
    pub new_version_id: VersionId,
}

/// The canonical store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Current canonical snapshot.
    ///
    /// Fails with `RemoteUnavailable` on connectivity, auth or server problems.
    async fn fetch(&self) -> Result<Snapshot>;

    /// Replace the canonical state with `candidate` if the store is still at
    /// `base_version_id`.
    ///
    /// Must be conditionally atomic: on `OutOfDate` nothing was applied, and
    /// `fetch` never observes a partially applied candidate. Any other
    /// failure is `RemoteUnavailable`.
    async fn push(
        &self,
        base_version_id: &str,
        candidate: SnapshotContent,
    ) -> Result<PushReceipt>;

    /// Cheap reachability check. Defaults to a full fetch.
    async fn probe(&self) -> Result<()> {
        self.fetch().await.map(|_| ())
    }

    /// Prepare adapter resources before first use.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Release adapter resources.
    async fn teardown(&self) -> Result<()> {
        Ok(())
    }
}

/// Durable storage for the working copy.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Last stored record, or [`CacheRecord::empty`] if nothing was stored.
    async fn load(&self) -> Result<CacheRecord>;

    /// Persist `snapshot` with the given dirty flag.
    ///
    /// Returning `Ok` is a commit point: the write must be atomic and durable.
    async fn save(&self, snapshot: &Snapshot, dirty: bool) -> Result<()>;

    /// Reset to the empty state.
    async fn clear(&self) -> Result<()>;

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn fetch(&self) -> Result<Snapshot> {
        (**self).fetch().await
    }

    async fn push(
        &self,
        base_version_id: &str,
        candidate: SnapshotContent,
    ) -> Result<PushReceipt> {
        (**self).push(base_version_id, candidate).await
    }

    async fn probe(&self) -> Result<()> {
        (**self).probe().await
    }

    async fn initialize(&self) -> Result<()> {
        (**self).initialize().await
    }

    async fn teardown(&self) -> Result<()> {
        (**self).teardown().await
    }
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Box<T> {
    async fn fetch(&self) -> Result<Snapshot> {
        (**self).fetch().await
    }

    async fn push(
        &self,
        base_version_id: &str,
        candidate: SnapshotContent,
    ) -> Result<PushReceipt> {
        (**self).push(base_version_id, candidate).await
    }

    async fn probe(&self) -> Result<()> {
        (**self).probe().await
    }

    async fn initialize(&self) -> Result<()> {
        (**self).initialize().await
    }

    async fn teardown(&self) -> Result<()> {
        (**self).teardown().await
    }
}

#[async_trait]
impl<T: LocalCache + ?Sized> LocalCache for Arc<T> {
    async fn load(&self) -> Result<CacheRecord> {
        (**self).load().await
    }

    async fn save(&self, snapshot: &Snapshot, dirty: bool) -> Result<()> {
        (**self).save(snapshot, dirty).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }

    async fn initialize(&self) -> Result<()> {
        (**self).initialize().await
    }

    async fn teardown(&self) -> Result<()> {
        (**self).teardown().await
    }
}

#[async_trait]
impl<T: LocalCache + ?Sized> LocalCache for Box<T> {
    async fn load(&self) -> Result<CacheRecord> {
        (**self).load().await
    }

    async fn save(&self, snapshot: &Snapshot, dirty: bool) -> Result<()> {
        (**self).save(snapshot, dirty).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }

    async fn initialize(&self) -> Result<()> {
        (**self).initialize().await
    }

    async fn teardown(&self) -> Result<()> {
        (**self).teardown().await
    }
}
