//! # Canon Adapters
//!
//! Concrete implementations of the `canon-engine` ports:
//!
//! - [`FileCache`]: the working copy as one JSON file, replaced atomically
//! - [`HttpRemote`]: a `canon-server` instance reached over HTTP
//!
//! ```no_run
//! use canon_adapters::{FileCache, HttpRemote};
//! use canon_engine::{SyncConfig, SyncOrchestrator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = HttpRemote::new("http://localhost:3000")?.with_token("secret");
//! let cache = FileCache::new("data/cache.json");
//! let sync = SyncOrchestrator::new(remote, cache, SyncConfig::from_env()?)?;
//!
//! let snapshot = sync.load_initial().await?;
//! let outcome = sync.sync(&snapshot).await?;
//! println!("now at {}", outcome.snapshot().version_id);
//! # Ok(())
//! # }
//! ```

pub mod file_cache;
pub mod http_remote;

pub use file_cache::{FileCache, CACHE_FORMAT_VERSION};
pub use http_remote::{HttpRemote, DEFAULT_TIMEOUT, UNKNOWN_VERSION};
