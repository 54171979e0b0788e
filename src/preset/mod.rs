//! Named, encrypted cookie presets.
//!
//! The whole `name -> envelope` map lives in one blob and every mutation
//! rewrites it. The blob store has no compare-and-swap, so mutations are
//! funnelled through a [`MutationQueue`]; without it two interleaved saves
//! silently drop one of the updates. Reads skip the queue and may observe
//! the map as it was just before an in-flight mutation lands.

mod lock;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::cookie::{CookieRecord, CookieStore};
use crate::crypto::EnvelopeCipher;
use crate::error::PresetError;
use crate::storage::BlobStore;

pub use lock::{MutationPermit, MutationQueue};

/// Blob key holding the preset map.
pub const PRESETS_BLOB: &str = "presets";

type PresetMap = BTreeMap<String, String>;

/// Trims `name` and rejects it if nothing is left.
fn preset_name(name: &str) -> Result<&str, PresetError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PresetError::invalid_argument("preset name must not be empty"));
    }
    Ok(trimmed)
}

/// Store of named cookie presets.
///
/// Names are case-sensitive and compared after trimming surrounding
/// whitespace. Saving under an existing name overwrites it.
pub struct PresetStore {
    blobs: Arc<dyn BlobStore>,
    cipher: EnvelopeCipher,
    mutations: MutationQueue,
}

impl PresetStore {
    /// Creates a store persisting into `blobs` and encrypting with `cipher`.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>, cipher: EnvelopeCipher) -> Self {
        Self {
            blobs,
            cipher,
            mutations: MutationQueue::new(),
        }
    }

    /// Returns the cipher used for preset envelopes.
    #[must_use]
    pub fn cipher(&self) -> &EnvelopeCipher {
        &self.cipher
    }

    /// Encrypts `cookies` and stores them under `name`, replacing any
    /// existing preset with that name.
    ///
    /// # Errors
    ///
    /// - [`PresetError::InvalidArgument`] for a blank name
    /// - [`PresetError::StorageUnavailable`] if the blob store fails
    #[instrument(skip(self, cookies), fields(cookies = cookies.len()))]
    pub async fn save(&self, name: &str, cookies: &[CookieRecord]) -> Result<(), PresetError> {
        let name = preset_name(name)?;
        let envelope = self.cipher.encrypt(cookies).await?;

        let _permit = self.mutations.admit().await;
        let mut map = self.load_map().await?;
        let replaced = map.insert(name.to_string(), envelope).is_some();
        self.persist_map(&map).await?;

        info!(preset = name, replaced, "preset saved");
        Ok(())
    }

    /// Decrypts and returns the cookies stored under `name`.
    ///
    /// # Errors
    ///
    /// - [`PresetError::NotFound`] if no preset has that name
    /// - [`PresetError::DecryptionError`] if the envelope cannot be opened,
    ///   for example after the master secret was regenerated
    /// - [`PresetError::StorageUnavailable`] if the blob store fails
    #[instrument(skip(self))]
    pub async fn load(&self, name: &str) -> Result<Vec<CookieRecord>, PresetError> {
        let name = preset_name(name)?;
        let map = self.load_map().await?;
        let envelope = map
            .get(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        let cookies: Vec<CookieRecord> = self.cipher.decrypt(envelope).await?;
        debug!(preset = name, cookies = cookies.len(), "preset loaded");
        Ok(cookies)
    }

    /// Returns all preset names in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::StorageUnavailable`] if the blob store fails.
    pub async fn list(&self) -> Result<Vec<String>, PresetError> {
        Ok(self.load_map().await?.into_keys().collect())
    }

    /// Returns true if a preset named `name` exists.
    ///
    /// # Errors
    ///
    /// - [`PresetError::InvalidArgument`] for a blank name
    /// - [`PresetError::StorageUnavailable`] if the blob store fails
    pub async fn exists(&self, name: &str) -> Result<bool, PresetError> {
        let name = preset_name(name)?;
        Ok(self.load_map().await?.contains_key(name))
    }

    /// Removes the preset named `name`.
    ///
    /// # Errors
    ///
    /// - [`PresetError::NotFound`] if no preset has that name
    /// - [`PresetError::StorageUnavailable`] if the blob store fails
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), PresetError> {
        let name = preset_name(name)?;

        let _permit = self.mutations.admit().await;
        let mut map = self.load_map().await?;
        if map.remove(name).is_none() {
            return Err(PresetError::NotFound(name.to_string()));
        }
        self.persist_map(&map).await?;

        info!(preset = name, "preset deleted");
        Ok(())
    }

    /// Moves the preset `old_name` to `new_name` in a single map write.
    ///
    /// The envelope is moved as-is; it is not re-encrypted.
    ///
    /// # Errors
    ///
    /// - [`PresetError::InvalidArgument`] for blank or identical names
    /// - [`PresetError::NotFound`] if `old_name` does not exist
    /// - [`PresetError::AlreadyExists`] if `new_name` is taken
    /// - [`PresetError::StorageUnavailable`] if the blob store fails
    #[instrument(skip(self))]
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<(), PresetError> {
        let old_name = preset_name(old_name)?;
        let new_name = preset_name(new_name)?;
        if old_name == new_name {
            return Err(PresetError::invalid_argument(format!(
                "cannot rename '{old_name}' to itself"
            )));
        }

        let _permit = self.mutations.admit().await;
        let mut map = self.load_map().await?;
        let Some(envelope) = map.remove(old_name) else {
            return Err(PresetError::NotFound(old_name.to_string()));
        };
        if map.contains_key(new_name) {
            return Err(PresetError::AlreadyExists(new_name.to_string()));
        }
        map.insert(new_name.to_string(), envelope);
        self.persist_map(&map).await?;

        info!(from = old_name, to = new_name, "preset renamed");
        Ok(())
    }

    /// Saves every cookie `cookie_store` holds for `domain` (and its
    /// subdomains) as the preset `name`. Returns the number of cookies saved.
    ///
    /// # Errors
    ///
    /// - [`PresetError::InvalidArgument`] for a blank name or domain
    /// - [`PresetError::StorageUnavailable`] if the cookie store or blob store fails
    #[instrument(skip(self, cookie_store))]
    pub async fn capture(
        &self,
        name: &str,
        cookie_store: &dyn CookieStore,
        domain: &str,
    ) -> Result<usize, PresetError> {
        let name = preset_name(name)?;
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(PresetError::invalid_argument("domain must not be empty"));
        }

        let cookies = cookie_store
            .get_all(Some(domain))
            .await
            .map_err(|error| PresetError::StorageUnavailable(format!("cookie store: {error}")))?;
        self.save(name, &cookies).await?;
        Ok(cookies.len())
    }

    async fn load_map(&self) -> Result<PresetMap, PresetError> {
        match self.blobs.get(PRESETS_BLOB).await? {
            None => Ok(PresetMap::new()),
            Some(text) => serde_json::from_str(&text).map_err(|error| {
                PresetError::StorageUnavailable(format!("preset map is unreadable: {error}"))
            }),
        }
    }

    async fn persist_map(&self, map: &PresetMap) -> Result<(), PresetError> {
        let text = serde_json::to_string(map).map_err(|error| {
            PresetError::StorageUnavailable(format!("preset map cannot be encoded: {error}"))
        })?;
        self.blobs.set(PRESETS_BLOB, &text).await?;
        Ok(())
    }
}

impl std::fmt::Debug for PresetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetStore").finish_non_exhaustive()
    }
}
