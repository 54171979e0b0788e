//! Shared handles built once per invocation.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use cookie_presets::{
    BlobStore, EnvelopeCipher, FileBlobStore, KeyManager, NetscapeCookieStore, PresetStore,
};

use crate::app_config::{EffectiveSettings, LoadedConfig};

pub(crate) struct AppContext {
    pub(crate) settings: EffectiveSettings,
    pub(crate) loaded_config: LoadedConfig,
    pub(crate) keys: KeyManager,
    pub(crate) presets: PresetStore,
}

impl AppContext {
    /// Wires the file-backed blob store, key manager, and preset store.
    /// Nothing touches disk until a command runs.
    pub(crate) fn new(settings: EffectiveSettings, loaded_config: LoadedConfig) -> Self {
        let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::new(&settings.data_dir));
        let keys = KeyManager::new(Arc::clone(&blobs));
        let presets = PresetStore::new(blobs, EnvelopeCipher::new(keys.clone()));
        Self {
            settings,
            loaded_config,
            keys,
            presets,
        }
    }

    pub(crate) fn cipher(&self) -> &EnvelopeCipher {
        self.presets.cipher()
    }

    /// Opens the configured cookie file as the live cookie jar.
    pub(crate) fn cookie_store(&self) -> Result<NetscapeCookieStore> {
        let Some(path) = self.settings.cookie_file.as_deref() else {
            bail!("No cookie file configured; pass --cookie-file or set `cookie_file` in config.toml");
        };
        Ok(NetscapeCookieStore::new(path))
    }

    pub(crate) fn data_dir(&self) -> &Path {
        &self.settings.data_dir
    }
}
