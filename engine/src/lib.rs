//! # Canon Engine
//!
//! The sync core of a local-first data layer that treats a remote
//! version-controlled store (for example a Git hosting API) as the canonical
//! database and keeps a cached working copy on the client.
//!
//! ## Design Principles
//!
//! - **Remote wins**: on any divergence local edits are discarded, never merged
//! - **Full snapshots**: every exchange moves the whole dataset
//! - **Ports, not adapters**: the core only sees [`RemoteStore`] and [`LocalCache`]
//! - **Stateless**: the orchestrator holds configuration only
//!
//! ## Core Concepts
//!
//! ### Snapshots
//!
//! A [`Snapshot`] is every schema and record at one remote version. The
//! `version_id` is assigned by the remote store and is the only thing the
//! orchestrator compares.
//!
//! ### Cache records
//!
//! The [`LocalCache`] persists a [`CacheRecord`]: the last snapshot plus a
//! `dirty` flag marking edits not yet pushed.
//!
//! ### Orchestration
//!
//! [`SyncOrchestrator::sync`] fetches the remote head and either pushes the
//! local snapshot (when versions match) or resets to the remote (when they do
//! not). Transient push failures are retried with linear backoff; an
//! out-of-date push is never retried.
//!
//! ## Quick Start
//!
//! ```rust
//! use canon_engine::{
//!     EntityRecord, FieldDef, FieldType, MemoryCache, MemoryRemote, SchemaDef,
//!     Snapshot, SyncConfig, SyncOrchestrator, SyncOutcome,
//! };
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let remote = MemoryRemote::new(Snapshot::empty("v1"));
//! let orchestrator =
//!     SyncOrchestrator::new(remote, MemoryCache::new(), SyncConfig::default()).unwrap();
//!
//! // 1. Establish the working copy
//! let mut local = orchestrator.load_initial().await.unwrap();
//!
//! // 2. Edit it
//! local.schemas.push(SchemaDef::new(
//!     "posts",
//!     vec![FieldDef::required("title", FieldType::String)],
//! ));
//! local.records.push(EntityRecord::new("posts", "hello", json!({"title": "Hello"})));
//!
//! // 3. Sync
//! match orchestrator.sync(&local).await.unwrap() {
//!     SyncOutcome::Pushed { snapshot, change_count, .. } => {
//!         assert_eq!(snapshot.version_id, "v2");
//!         assert_eq!(change_count, 2);
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Validation
//!
//! The orchestrator never inspects content. Applications run a [`Validator`]
//! (usually [`SchemaValidator`]) before committing edits.

pub mod config;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod port;
pub mod record;
pub mod retry;
pub mod schema;
pub mod snapshot;
pub mod validate;
pub mod wire;

// Re-export main types at crate root
pub use config::SyncConfig;
pub use error::{ConfigError, Error, ErrorKind, Phase};
pub use memory::{MemoryCache, MemoryRemote};
pub use orchestrator::{InitialLoad, LoadSource, ResetReason, SyncOrchestrator, SyncOutcome};
pub use port::{LocalCache, PushReceipt, RemoteStore};
pub use record::EntityRecord;
pub use retry::RetryPolicy;
pub use schema::{FieldDef, FieldType, SchemaDef};
pub use snapshot::{CacheRecord, Snapshot, SnapshotContent, SnapshotMeta};
pub use validate::{NoopValidator, SchemaValidator, Validator};

/// Type aliases for clarity
pub type VersionId = String;
pub type SchemaName = String;
pub type RecordId = String;
