//! JSON file implementation of the local cache port.
//!
//! The whole cache lives in one document:
//!
//! ```json
//! {"formatVersion": 1, "dirty": false, "snapshot": {"versionId": "...", ...}}
//! ```
//!
//! Saves go to a sibling temporary file which is flushed to disk and then
//! renamed over the target, so readers see either the old or the new
//! document, never a torn write. On Unix the parent directory is flushed
//! after the rename so a completed save survives a crash.

use async_trait::async_trait;
use canon_engine::{error::Result, CacheRecord, Error, LocalCache, Snapshot};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Version of the on-disk cache document.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocumentRef<'a> {
    format_version: u32,
    dirty: bool,
    snapshot: Option<&'a Snapshot>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocument {
    format_version: u32,
    #[serde(default)]
    dirty: bool,
    snapshot: Option<Snapshot>,
}

/// A cache stored as a single JSON file.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Persist the directory entry written by `rename`.
    #[cfg(unix)]
    async fn sync_parent_dir(&self) -> std::io::Result<()> {
        tokio::fs::File::open(self.parent_dir()).await?.sync_all().await
    }

    // Directories cannot be opened as files here; rename is the last step.
    #[cfg(not(unix))]
    async fn sync_parent_dir(&self) -> std::io::Result<()> {
        Ok(())
    }

    fn storage_error(&self, action: &str, err: impl std::fmt::Display) -> Error {
        Error::LocalStorage(format!("{action} {}: {err}", self.path.display()))
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn load(&self) -> Result<CacheRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(CacheRecord::empty()),
            Err(err) => return Err(self.storage_error("read", err)),
        };

        let document: CacheDocument =
            serde_json::from_slice(&bytes).map_err(|e| self.storage_error("parse", e))?;

        if document.format_version > CACHE_FORMAT_VERSION {
            return Err(self.storage_error(
                "load",
                format!(
                    "unsupported cache format version: {} (max supported: {})",
                    document.format_version, CACHE_FORMAT_VERSION
                ),
            ));
        }

        Ok(CacheRecord {
            snapshot: document.snapshot,
            dirty: document.dirty,
        })
    }

    async fn save(&self, snapshot: &Snapshot, dirty: bool) -> Result<()> {
        let document = CacheDocumentRef {
            format_version: CACHE_FORMAT_VERSION,
            dirty,
            snapshot: Some(snapshot),
        };
        let bytes = serde_json::to_vec(&document).map_err(|e| self.storage_error("encode", e))?;

        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| self.storage_error("create", e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        file.sync_all()
            .await
            .map_err(|e| self.storage_error("flush", e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.storage_error("replace", e))?;
        self.sync_parent_dir()
            .await
            .map_err(|e| self.storage_error("flush directory of", e))?;

        tracing::debug!(
            path = %self.path.display(),
            version_id = %snapshot.version_id,
            dirty,
            "cache saved"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.storage_error("remove", err)),
        }
    }

    /// Create the parent directory and drop any temporary file left behind
    /// by an interrupted save.
    async fn initialize(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.parent_dir())
            .await
            .map_err(|e| self.storage_error("create directory for", e))?;

        match tokio::fs::remove_file(self.temp_path()).await {
            Ok(()) => {
                tracing::warn!(path = %self.path.display(), "removed stale temporary cache file");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.storage_error("clean up", err)),
        }
    }
}
