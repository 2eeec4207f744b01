//! The sync orchestrator.
//!
//! Reconciles the working snapshot with the remote store under a
//! remote-wins policy.
//!
//! # Algorithm
//!
//! `sync(local)`:
//! 1. Fetch the remote head `R`
//! 2. If `R` is at a different version than `local`, adopt `R` (reset)
//! 3. Otherwise push `local` conditioned on its version, with retries
//! 4. If the push ultimately fails, fetch again and adopt that (reset)
//!
//! Every adopted or pushed snapshot is saved to the cache as clean before
//! the call returns. The orchestrator keeps no state between calls and does
//! not serialize concurrent calls; callers must.

use crate::{
    config::SyncConfig,
    error::{ConfigError, Result},
    port::{LocalCache, RemoteStore},
    retry::RetryPolicy,
    Error, Phase, Snapshot, VersionId,
};
use std::fmt;

/// Why local edits were discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetReason {
    /// Remote moved past the caller's base version before any push
    RemoteAdvanced,
    /// The push failed for good (out of date, or retries exhausted)
    PushFailed(Error),
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetReason::RemoteAdvanced => f.write_str("remote advanced"),
            ResetReason::PushFailed(err) => write!(f, "push failed: {err}"),
        }
    }
}

/// Result of one [`SyncOrchestrator::sync`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Nothing was transferred. Not produced by the current policy, which
    /// always either pushes or resets.
    UpToDate { snapshot: Snapshot },
    /// Local content accepted by the remote under a new version.
    Pushed {
        snapshot: Snapshot,
        previous_version_id: VersionId,
        change_count: usize,
    },
    /// Local content discarded; `snapshot` is exactly what the remote returned.
    ResetToRemote {
        snapshot: Snapshot,
        previous_version_id: VersionId,
        reason: ResetReason,
    },
}

impl SyncOutcome {
    /// The snapshot the caller should continue working from.
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            SyncOutcome::UpToDate { snapshot }
            | SyncOutcome::Pushed { snapshot, .. }
            | SyncOutcome::ResetToRemote { snapshot, .. } => snapshot,
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        match self {
            SyncOutcome::UpToDate { snapshot }
            | SyncOutcome::Pushed { snapshot, .. }
            | SyncOutcome::ResetToRemote { snapshot, .. } => snapshot,
        }
    }

    /// The caller's base version, if a transfer happened.
    pub fn previous_version_id(&self) -> Option<&str> {
        match self {
            SyncOutcome::UpToDate { .. } => None,
            SyncOutcome::Pushed {
                previous_version_id,
                ..
            }
            | SyncOutcome::ResetToRemote {
                previous_version_id,
                ..
            } => Some(previous_version_id),
        }
    }

    pub fn is_pushed(&self) -> bool {
        matches!(self, SyncOutcome::Pushed { .. })
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, SyncOutcome::ResetToRemote { .. })
    }
}

/// Where the snapshot returned by `load_initial` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Empty cache, seeded from the remote
    Bootstrapped,
    /// Remote had moved on; the cache was replaced with it
    RemoteAdvanced,
    /// Cache matched the remote version
    Cache,
    /// Remote unreachable; served from cache
    OfflineCache,
}

/// Working snapshot established at startup, plus whether it carries
/// unpushed edits.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialLoad {
    pub snapshot: Snapshot,
    pub dirty: bool,
    pub source: LoadSource,
}

/// Reconciles a cached snapshot with the canonical remote store.
pub struct SyncOrchestrator<R, C> {
    remote: R,
    cache: C,
    retry: RetryPolicy,
}

impl<R: RemoteStore, C: LocalCache> SyncOrchestrator<R, C> {
    /// Create an orchestrator over the two ports.
    pub fn new(remote: R, cache: C, config: SyncConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            remote,
            cache,
            retry: config.retry_policy(),
        })
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Establish the working snapshot at application start.
    ///
    /// See [`Self::load_initial_with_status`] for the rules.
    pub async fn load_initial(&self) -> Result<Snapshot> {
        self.load_initial_with_status()
            .await
            .map(|loaded| loaded.snapshot)
    }

    /// Establish the working snapshot and report where it came from.
    ///
    /// An empty cache is seeded from the remote, and failing to reach the
    /// remote then is fatal. A populated cache is replaced when the remote
    /// has moved on, and served as-is (dirty or not) when the remote is
    /// unreachable.
    pub async fn load_initial_with_status(&self) -> Result<InitialLoad> {
        self.initial_load()
            .await
            .map_err(|err| Error::sync_failure(Phase::InitialLoad, err))
    }

    async fn initial_load(&self) -> Result<InitialLoad> {
        let (remote_ready, cache_ready) =
            tokio::join!(self.remote.initialize(), self.cache.initialize());
        remote_ready?;
        cache_ready?;

        let record = self.cache.load().await?;
        let Some(cached) = record.snapshot else {
            let remote = self.remote.fetch().await?;
            self.cache.save(&remote, false).await?;
            tracing::info!(version_id = %remote.version_id, "bootstrapped cache from remote");
            return Ok(InitialLoad {
                snapshot: remote,
                dirty: false,
                source: LoadSource::Bootstrapped,
            });
        };

        match self.remote.fetch().await {
            Ok(remote) if !remote.same_state(&cached) => {
                self.cache.save(&remote, false).await?;
                tracing::info!(
                    cached = %cached.version_id,
                    remote = %remote.version_id,
                    discarded_dirty = record.dirty,
                    "remote advanced since last run, cache replaced"
                );
                Ok(InitialLoad {
                    snapshot: remote,
                    dirty: false,
                    source: LoadSource::RemoteAdvanced,
                })
            }
            Ok(_) => {
                tracing::debug!(version_id = %cached.version_id, "cache in sync with remote");
                Ok(InitialLoad {
                    snapshot: cached,
                    dirty: record.dirty,
                    source: LoadSource::Cache,
                })
            }
            Err(err) => {
                tracing::warn!(
                    version_id = %cached.version_id,
                    dirty = record.dirty,
                    error = %err,
                    "remote unreachable, serving cached snapshot"
                );
                Ok(InitialLoad {
                    snapshot: cached,
                    dirty: record.dirty,
                    source: LoadSource::OfflineCache,
                })
            }
        }
    }

    /// Reconcile `local` with the remote store.
    ///
    /// `local.version_id` must be the version the caller last observed. A
    /// `ResetToRemote` outcome is a successful completion; only failures the
    /// orchestrator cannot recover from are returned as errors, tagged
    /// [`Phase::Sync`].
    pub async fn sync(&self, local: &Snapshot) -> Result<SyncOutcome> {
        self.reconcile(local)
            .await
            .map_err(|err| Error::sync_failure(Phase::Sync, err))
    }

    async fn reconcile(&self, local: &Snapshot) -> Result<SyncOutcome> {
        let remote = self.remote.fetch().await?;

        if !remote.same_state(local) {
            self.cache.save(&remote, false).await?;
            tracing::info!(
                base = %local.version_id,
                remote = %remote.version_id,
                "remote advanced, local edits discarded"
            );
            return Ok(SyncOutcome::ResetToRemote {
                snapshot: remote,
                previous_version_id: local.version_id.clone(),
                reason: ResetReason::RemoteAdvanced,
            });
        }

        let base = local.version_id.as_str();
        let pushed = self
            .retry
            .run(|attempt| {
                tracing::debug!(base, attempt, "pushing snapshot");
                self.remote.push(base, local.content())
            })
            .await;

        match pushed {
            Ok(receipt) => {
                let snapshot = local.with_version(receipt.new_version_id);
                self.cache.save(&snapshot, false).await?;
                let change_count = snapshot.change_count();
                tracing::info!(
                    base,
                    version_id = %snapshot.version_id,
                    change_count,
                    "pushed local snapshot"
                );
                Ok(SyncOutcome::Pushed {
                    snapshot,
                    previous_version_id: local.version_id.clone(),
                    change_count,
                })
            }
            Err(err) => {
                tracing::warn!(base, error = %err, "push failed, resetting to remote");
                let latest = self.remote.fetch().await?;
                self.cache.save(&latest, false).await?;
                Ok(SyncOutcome::ResetToRemote {
                    snapshot: latest,
                    previous_version_id: local.version_id.clone(),
                    reason: ResetReason::PushFailed(err),
                })
            }
        }
    }

    /// Whether the remote is reachable right now.
    ///
    /// Advisory only: the answer may be stale by the time `sync` runs.
    pub async fn can_sync(&self, local: &Snapshot) -> bool {
        match self.remote.probe().await {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(base = %local.version_id, error = %err, "remote probe failed");
                false
            }
        }
    }

    /// Release both ports. Both teardowns always run.
    pub async fn destroy(&self) -> Result<()> {
        let (remote_down, cache_down) =
            tokio::join!(self.remote.teardown(), self.cache.teardown());

        match (remote_down, cache_down) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(err), Ok(())) | (Ok(()), Err(err)) => {
                Err(Error::sync_failure(Phase::Destroy, err))
            }
            (Err(remote_err), Err(cache_err)) => {
                tracing::error!(error = %cache_err, "cache teardown also failed");
                Err(Error::sync_failure(Phase::Destroy, remote_err))
            }
        }
    }
}
