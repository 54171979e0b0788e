//! In-memory blob store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BlobStore, BlobStoreError};

/// Blob store backed by a process-local map.
///
/// Failure toggles let tests drive the `StorageUnavailable` paths, and
/// `yield_on_access` forces a scheduler yield before every access so that
/// concurrent callers genuinely interleave.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    yield_on_access: AtomicBool,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `get` fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `set` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Yields to the scheduler before each access.
    pub fn set_yield_on_access(&self, enabled: bool) {
        self.yield_on_access.store(enabled, Ordering::SeqCst);
    }

    /// Returns a copy of the raw value under `key`, bypassing failure toggles.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Overwrites the raw value under `key`, bypassing failure toggles.
    pub async fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    async fn maybe_yield(&self) {
        if self.yield_on_access.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BlobStoreError> {
        self.maybe_yield().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Unavailable("read rejected".to_string()));
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BlobStoreError> {
        self.maybe_yield().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Unavailable("write rejected".to_string()));
        }
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
