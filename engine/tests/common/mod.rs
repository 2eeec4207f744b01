//! Scripted port doubles shared by the integration tests.
//!
//! Failures are configured per instance through constructors and builder
//! methods; nothing is global.

#![allow(dead_code)]

use async_trait::async_trait;
use canon_engine::{
    CacheRecord, EntityRecord, Error, LocalCache, MemoryCache, MemoryRemote, PushReceipt,
    RemoteStore, SchemaDef, Snapshot, SnapshotContent,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// How a scripted call should fail.
#[derive(Debug, Clone)]
pub enum Fault {
    Unavailable,
    OutOfDate,
    Storage,
}

impl Fault {
    fn into_error(self, base: &str, actual: &str) -> Error {
        match self {
            Fault::Unavailable => Error::RemoteUnavailable("connection reset".into()),
            Fault::OutOfDate => Error::OutOfDate {
                base: base.to_string(),
                actual: actual.to_string(),
            },
            Fault::Storage => Error::LocalStorage("disk full".into()),
        }
    }
}

/// A [`MemoryRemote`] with scripted failures and call counters.
///
/// Scripted entries are consumed one per call (`None` lets the call
/// through); the `fail_*` fault applies once the script is used up.
pub struct ScriptedRemote {
    inner: MemoryRemote,
    fetch_script: Mutex<VecDeque<Option<Fault>>>,
    push_script: Mutex<VecDeque<Option<Fault>>>,
    fetch_always: Option<Fault>,
    push_always: Option<Fault>,
    teardown_fault: Option<Fault>,
    pub fetches: AtomicUsize,
    pub pushes: AtomicUsize,
    pub probes: AtomicUsize,
    pub inits: AtomicUsize,
    pub teardowns: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            inner: MemoryRemote::new(initial),
            fetch_script: Mutex::new(VecDeque::new()),
            push_script: Mutex::new(VecDeque::new()),
            fetch_always: None,
            push_always: None,
            teardown_fault: None,
            fetches: AtomicUsize::new(0),
            pushes: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            inits: AtomicUsize::new(0),
            teardowns: AtomicUsize::new(0),
        }
    }

    pub fn fail_fetches(mut self, fault: Fault) -> Self {
        self.fetch_always = Some(fault);
        self
    }

    pub fn script_fetches(self, script: impl IntoIterator<Item = Option<Fault>>) -> Self {
        self.fetch_script.lock().unwrap().extend(script);
        self
    }

    pub fn fail_pushes(mut self, fault: Fault) -> Self {
        self.push_always = Some(fault);
        self
    }

    pub fn script_pushes(self, script: impl IntoIterator<Item = Option<Fault>>) -> Self {
        self.push_script.lock().unwrap().extend(script);
        self
    }

    pub fn fail_teardown(mut self, fault: Fault) -> Self {
        self.teardown_fault = Some(fault);
        self
    }

    pub fn inner(&self) -> &MemoryRemote {
        &self.inner
    }

    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next_fault(
        script: &Mutex<VecDeque<Option<Fault>>>,
        always: &Option<Fault>,
    ) -> Option<Fault> {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| always.clone())
    }
}

#[async_trait]
impl RemoteStore for ScriptedRemote {
    async fn fetch(&self) -> canon_engine::error::Result<Snapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = Self::next_fault(&self.fetch_script, &self.fetch_always) {
            let head = self.inner.head_version().await;
            return Err(fault.into_error(&head, &head));
        }
        self.inner.fetch().await
    }

    async fn push(
        &self,
        base_version_id: &str,
        candidate: SnapshotContent,
    ) -> canon_engine::error::Result<PushReceipt> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = Self::next_fault(&self.push_script, &self.push_always) {
            let head = self.inner.head_version().await;
            return Err(fault.into_error(base_version_id, &head));
        }
        self.inner.push(base_version_id, candidate).await
    }

    async fn probe(&self) -> canon_engine::error::Result<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match &self.fetch_always {
            Some(fault) => Err(fault.clone().into_error("", "")),
            None => Ok(()),
        }
    }

    async fn initialize(&self) -> canon_engine::error::Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn teardown(&self) -> canon_engine::error::Result<()> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        match &self.teardown_fault {
            Some(fault) => Err(fault.clone().into_error("", "")),
            None => Ok(()),
        }
    }
}

/// A [`MemoryCache`] with scripted failures and a save counter.
#[derive(Default)]
pub struct ScriptedCache {
    inner: MemoryCache,
    fail_load: bool,
    fail_save: bool,
    fail_teardown: bool,
    pub saves: AtomicUsize,
    pub inits: AtomicUsize,
    pub teardowns: AtomicUsize,
}

impl ScriptedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CacheRecord) -> Self {
        Self {
            inner: MemoryCache::with_record(record),
            ..Self::default()
        }
    }

    pub fn fail_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn fail_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn fail_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> CacheRecord {
        self.inner.snapshot().await
    }
}

#[async_trait]
impl LocalCache for ScriptedCache {
    async fn load(&self) -> canon_engine::error::Result<CacheRecord> {
        if self.fail_load {
            return Err(Error::LocalStorage("corrupt cache".into()));
        }
        self.inner.load().await
    }

    async fn save(&self, snapshot: &Snapshot, dirty: bool) -> canon_engine::error::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save {
            return Err(Error::LocalStorage("quota exceeded".into()));
        }
        self.inner.save(snapshot, dirty).await
    }

    async fn clear(&self) -> canon_engine::error::Result<()> {
        self.inner.clear().await
    }

    async fn initialize(&self) -> canon_engine::error::Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn teardown(&self) -> canon_engine::error::Result<()> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_teardown {
            return Err(Error::LocalStorage("handle already closed".into()));
        }
        Ok(())
    }
}

pub fn posts_schema() -> SchemaDef {
    SchemaDef::new("posts", vec![])
}

pub fn post(id: &str, title: &str) -> EntityRecord {
    EntityRecord::new("posts", id, json!({ "title": title }))
}

/// A snapshot at `version` holding one schema and one record.
pub fn edited(version: &str) -> Snapshot {
    Snapshot::new(version, vec![posts_schema()], vec![post("p-1", "Hello")])
}
