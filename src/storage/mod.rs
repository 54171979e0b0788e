//! Key-value blob persistence.
//!
//! The core treats persistence as an opaque capability: single-key `get` and
//! `set`, no transactions spanning keys, no compare-and-swap. Anything that
//! needs read-modify-write safety has to serialize itself above this layer.
//!
//! - [`MemoryBlobStore`] - in-process map, with failure injection for tests
//! - [`FileBlobStore`] - one owner-only file per key under a data directory

mod file;
mod memory;

pub use file::{FileBlobStore, default_data_dir};
pub use memory::MemoryBlobStore;

use async_trait::async_trait;

/// Errors raised by a [`BlobStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Key contains characters the backend cannot represent.
    #[error("invalid blob key '{0}'")]
    InvalidKey(String),
    /// Backend is refusing requests.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
    /// Stored bytes are not valid UTF-8 text.
    #[error("blob '{0}' is not valid UTF-8")]
    Corrupt(String),
}

/// Persistent string storage addressed by key.
///
/// Uses `async_trait` so stores can be shared as `Arc<dyn BlobStore>`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reads the value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, BlobStoreError>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), BlobStoreError>;
}
