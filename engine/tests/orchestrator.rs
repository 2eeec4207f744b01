//! Behavioural tests for the sync orchestrator.

mod common;

use canon_engine::{
    CacheRecord, Error, ErrorKind, LoadSource, Phase, RemoteStore, ResetReason, Snapshot,
    SnapshotContent, SyncConfig, SyncOrchestrator, SyncOutcome,
};
use common::{edited, post, posts_schema, Fault, ScriptedCache, ScriptedRemote};
use std::time::Duration;

fn fast() -> SyncConfig {
    SyncConfig::default().with_retry_base_delay(Duration::ZERO)
}

fn orchestrator(
    remote: ScriptedRemote,
    cache: ScriptedCache,
) -> SyncOrchestrator<ScriptedRemote, ScriptedCache> {
    SyncOrchestrator::new(remote, cache, fast()).unwrap()
}

// ============================================================================
// load_initial
// ============================================================================

#[tokio::test]
async fn first_run_bootstraps_from_remote() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new(),
    );

    let loaded = sync.load_initial_with_status().await.unwrap();

    assert_eq!(loaded.snapshot.version_id, "v1");
    assert_eq!(loaded.source, LoadSource::Bootstrapped);
    assert!(!loaded.dirty);
    assert_eq!(
        sync.cache().stored().await,
        CacheRecord::clean(Snapshot::empty("v1"))
    );
}

#[tokio::test]
async fn initializes_both_ports() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new(),
    );

    sync.load_initial().await.unwrap();

    assert_eq!(sync.remote().inits.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(sync.cache().inits.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn first_run_with_remote_down_is_fatal() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_fetches(Fault::Unavailable),
        ScriptedCache::new(),
    );

    let err = sync.load_initial().await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::InitialLoad));
    assert_eq!(err.root_cause().kind(), ErrorKind::RemoteUnavailable);
    assert!(sync.cache().stored().await.is_empty());
}

#[tokio::test]
async fn offline_fallback_serves_cache() {
    let cached = edited("v1");
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_fetches(Fault::Unavailable),
        ScriptedCache::with_record(CacheRecord::clean(cached.clone())),
    );

    let snapshot = sync.load_initial().await.unwrap();

    assert_eq!(snapshot, cached);
    assert_eq!(sync.cache().save_count(), 0);
}

#[tokio::test]
async fn offline_fallback_reports_dirty() {
    let cached = edited("v1");
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_fetches(Fault::Unavailable),
        ScriptedCache::with_record(CacheRecord::new(cached.clone(), true)),
    );

    let loaded = sync.load_initial_with_status().await.unwrap();

    assert_eq!(loaded.snapshot, cached);
    assert!(loaded.dirty);
    assert_eq!(loaded.source, LoadSource::OfflineCache);
}

#[tokio::test]
async fn remote_advanced_since_last_run_replaces_cache() {
    let remote = ScriptedRemote::new(Snapshot::empty("v1"));
    remote
        .inner()
        .commit(SnapshotContent::new(vec![posts_schema()], vec![]))
        .await;
    let sync = orchestrator(
        remote,
        ScriptedCache::with_record(CacheRecord::new(edited("v1"), true)),
    );

    let loaded = sync.load_initial_with_status().await.unwrap();

    assert_eq!(loaded.snapshot.version_id, "v2");
    assert_eq!(loaded.source, LoadSource::RemoteAdvanced);
    assert!(!loaded.dirty);
    let stored = sync.cache().stored().await;
    assert_eq!(stored.version_id(), Some("v2"));
    assert!(!stored.dirty);
}

#[tokio::test]
async fn matching_cache_is_returned_without_write() {
    let cached = edited("v1");
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::with_record(CacheRecord::new(cached.clone(), true)),
    );

    let loaded = sync.load_initial_with_status().await.unwrap();

    // Same version: the cached (edited) copy wins over the remote content.
    assert_eq!(loaded.snapshot, cached);
    assert_eq!(loaded.source, LoadSource::Cache);
    assert!(loaded.dirty);
    assert_eq!(sync.cache().save_count(), 0);
}

#[tokio::test]
async fn corrupt_cache_is_fatal() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new().fail_load(),
    );

    let err = sync.load_initial().await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::InitialLoad));
    assert_eq!(err.root_cause(), &Error::LocalStorage("corrupt cache".into()));
}

// ============================================================================
// sync
// ============================================================================

#[tokio::test]
async fn successful_push() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::with_record(CacheRecord::clean(Snapshot::empty("v1"))),
    );
    let local = Snapshot::new("v1", vec![posts_schema()], vec![post("r1", "One")]);

    let outcome = sync.sync(&local).await.unwrap();

    match &outcome {
        SyncOutcome::Pushed {
            snapshot,
            previous_version_id,
            change_count,
        } => {
            assert_eq!(snapshot.version_id, "v2");
            assert_eq!(previous_version_id, "v1");
            assert_eq!(*change_count, 2);
            assert_eq!(snapshot.records, local.records);
        }
        other => panic!("expected Pushed, got {other:?}"),
    }

    let head = sync.remote().inner().fetch().await.unwrap();
    assert_eq!(head.version_id, "v2");
    assert_eq!(head.schemas, vec![posts_schema()]);
    assert_eq!(
        sync.cache().stored().await,
        CacheRecord::clean(outcome.into_snapshot())
    );
}

#[tokio::test]
async fn repeated_sync_keeps_pushing() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new(),
    );

    let first = sync.sync(&edited("v1")).await.unwrap();
    let second = sync.sync(first.snapshot()).await.unwrap();

    assert!(second.is_pushed());
    assert_eq!(second.previous_version_id(), Some("v2"));
    assert_eq!(second.snapshot().version_id, "v3");
}

#[tokio::test]
async fn remote_advanced_resets_without_pushing() {
    let remote = ScriptedRemote::new(Snapshot::empty("v1"));
    remote
        .inner()
        .commit(SnapshotContent::new(vec![], vec![post("x", "Remote")]))
        .await;
    let sync = orchestrator(remote, ScriptedCache::new());

    let outcome = sync.sync(&edited("v1")).await.unwrap();

    let direct = sync.remote().inner().fetch().await.unwrap();
    match outcome {
        SyncOutcome::ResetToRemote {
            snapshot,
            previous_version_id,
            reason,
        } => {
            assert_eq!(snapshot.version_id, "v2");
            assert_eq!(snapshot, direct);
            assert_eq!(previous_version_id, "v1");
            assert_eq!(reason, ResetReason::RemoteAdvanced);
        }
        other => panic!("expected ResetToRemote, got {other:?}"),
    }
    assert_eq!(sync.remote().push_count(), 0);
    assert_eq!(sync.cache().stored().await, CacheRecord::clean(direct));
}

#[tokio::test]
async fn out_of_date_push_is_tried_once_then_resets() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_pushes(Fault::OutOfDate),
        ScriptedCache::new(),
    );

    let outcome = sync.sync(&edited("v1")).await.unwrap();

    assert_eq!(sync.remote().push_count(), 1);
    assert_eq!(sync.remote().fetch_count(), 2);
    match outcome {
        SyncOutcome::ResetToRemote { reason, snapshot, .. } => {
            assert!(matches!(reason, ResetReason::PushFailed(Error::OutOfDate { .. })));
            assert_eq!(snapshot.version_id, "v1");
        }
        other => panic!("expected ResetToRemote, got {other:?}"),
    }
}

#[tokio::test]
async fn transient_push_failures_bounded_by_max_retries() {
    for max in 1..=4u32 {
        let sync = SyncOrchestrator::new(
            ScriptedRemote::new(Snapshot::empty("v1")).fail_pushes(Fault::Unavailable),
            ScriptedCache::new(),
            fast().with_max_retries(max),
        )
        .unwrap();

        let outcome = sync.sync(&edited("v1")).await.unwrap();

        assert_eq!(sync.remote().push_count(), max as usize);
        assert!(outcome.is_reset());
        let stored = sync.cache().stored().await;
        assert_eq!(stored.version_id(), Some("v1"));
        assert!(!stored.dirty);
    }
}

#[tokio::test]
async fn transient_failure_then_success_pushes() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1"))
            .script_pushes([Some(Fault::Unavailable), Some(Fault::Unavailable)]),
        ScriptedCache::new(),
    );

    let outcome = sync.sync(&edited("v1")).await.unwrap();

    assert!(outcome.is_pushed());
    assert_eq!(sync.remote().push_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn backoff_is_linear() {
    let sync = SyncOrchestrator::new(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_pushes(Fault::Unavailable),
        ScriptedCache::new(),
        SyncConfig::default(),
    )
    .unwrap();
    let start = tokio::time::Instant::now();

    sync.sync(&edited("v1")).await.unwrap();

    // 1s after the first failure, 2s after the second, none after the third.
    assert_eq!(start.elapsed(), Duration::from_millis(3000));
}

#[tokio::test]
async fn first_fetch_failure_is_fatal() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_fetches(Fault::Unavailable),
        ScriptedCache::new(),
    );

    let err = sync.sync(&edited("v1")).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Sync));
    assert_eq!(err.root_cause().kind(), ErrorKind::RemoteUnavailable);
    assert_eq!(sync.remote().push_count(), 0);
    assert_eq!(sync.cache().save_count(), 0);
}

#[tokio::test]
async fn fallback_fetch_failure_is_fatal() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1"))
            .fail_pushes(Fault::OutOfDate)
            .script_fetches([None])
            .fail_fetches(Fault::Unavailable),
        ScriptedCache::new(),
    );

    let err = sync.sync(&edited("v1")).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Sync));
    assert_eq!(sync.remote().push_count(), 1);
    assert_eq!(sync.remote().fetch_count(), 2);
    assert_eq!(sync.cache().save_count(), 0);
}

#[tokio::test]
async fn cache_save_failure_after_push_is_fatal() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new().fail_save(),
    );

    let err = sync.sync(&edited("v1")).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Sync));
    assert_eq!(err.root_cause().kind(), ErrorKind::LocalStorage);
    // The remote accepted the push even though the cache could not record it.
    assert_eq!(sync.remote().inner().head_version().await, "v2");
}

// ============================================================================
// can_sync / destroy
// ============================================================================

#[tokio::test]
async fn can_sync_reflects_probe() {
    let online = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new(),
    );
    assert!(online.can_sync(&edited("v1")).await);

    let offline = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_fetches(Fault::Unavailable),
        ScriptedCache::new(),
    );
    assert!(!offline.can_sync(&edited("v1")).await);
    assert_eq!(offline.cache().save_count(), 0);
    assert_eq!(offline.remote().push_count(), 0);
}

#[tokio::test]
async fn destroy_tears_down_both() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new(),
    );

    sync.destroy().await.unwrap();

    assert_eq!(sync.remote().teardowns.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(sync.cache().teardowns.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn destroy_attempts_both_even_when_one_fails() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")).fail_teardown(Fault::Unavailable),
        ScriptedCache::new().fail_teardown(),
    );

    let err = sync.destroy().await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Destroy));
    assert_eq!(err.root_cause().kind(), ErrorKind::RemoteUnavailable);
    assert_eq!(sync.remote().teardowns.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(sync.cache().teardowns.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn destroy_reports_cache_failure() {
    let sync = orchestrator(
        ScriptedRemote::new(Snapshot::empty("v1")),
        ScriptedCache::new().fail_teardown(),
    );

    let err = sync.destroy().await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Destroy));
    assert_eq!(err.root_cause().kind(), ErrorKind::LocalStorage);
}
