//! File-backed blob store.
//!
//! Each key maps to one file under the store root, by default
//! `~/.config/cookie-presets/` (or `$XDG_CONFIG_HOME/cookie-presets/`).

use std::env;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use super::{BlobStore, BlobStoreError};

const APP_DIR_NAME: &str = "cookie-presets";
const TMP_SUFFIX: &str = ".tmp";

/// Blob store persisting each key as an owner-only file.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>, BlobStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| BlobStoreError::Corrupt(key.to_string())),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    #[instrument(level = "debug", skip(self, value), fields(root = %self.root.display(), bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), BlobStoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).await?;

        // Whole-file replacement: write a sibling temp file, then rename over.
        let tmp_path = self.root.join(format!("{key}{TMP_SUFFIX}"));
        if let Err(error) = replace_file(&tmp_path, &path, value.as_bytes()).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await
                && cleanup.kind() != ErrorKind::NotFound
            {
                warn!(key, error = %cleanup, "temp file left behind");
            }
            return Err(error);
        }
        debug!(key, "blob written");
        Ok(())
    }
}

/// Returns the default data directory (`~/.config/cookie-presets`).
///
/// Priority: `$XDG_CONFIG_HOME`, then `$HOME/.config`, then `%APPDATA%`.
/// Blank environment values are ignored.
///
/// # Errors
///
/// Returns [`BlobStoreError::Unavailable`] when none of the sources is set.
pub fn default_data_dir() -> Result<PathBuf, BlobStoreError> {
    resolve_data_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_data_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, BlobStoreError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(BlobStoreError::Unavailable(
        "unable to determine config directory (set XDG_CONFIG_HOME or HOME)".to_string(),
    ))
}

fn validate_key(key: &str) -> Result<(), BlobStoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.ends_with(TMP_SUFFIX)
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(BlobStoreError::InvalidKey(key.to_string()))
    }
}

async fn replace_file(tmp_path: &Path, path: &Path, bytes: &[u8]) -> Result<(), BlobStoreError> {
    // A stale temp file from an interrupted write would keep its old mode.
    match fs::remove_file(tmp_path).await {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(error.into()),
    }

    let mut file = owner_only_options().open(tmp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(tmp_path, path).await?;
    Ok(())
}

/// Files are created `0600` on Unix, so the secret is never readable by others.
fn owner_only_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options
}
