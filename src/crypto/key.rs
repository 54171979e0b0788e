//! Master secret lifecycle.
//!
//! The master secret is 32 printable characters persisted under a single
//! blob key. It is generated once from 24 random bytes (base64, unpadded:
//! exactly 32 characters) and reused for the life of the data directory.
//!
//! A persisted value of the wrong shape is replaced rather than repaired.
//! Everything encrypted under the old secret is then permanently
//! undecryptable; this is logged loudly, never padded over.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD as BASE64_NO_PAD;
use rand::RngCore;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

use crate::error::PresetError;
use crate::storage::BlobStore;

/// Blob key holding the master secret.
pub const MASTER_KEY_BLOB: &str = "master_key";

/// Exact length of a valid master secret, in characters.
pub const MASTER_SECRET_LEN: usize = 32;

const SECRET_ENTROPY_BYTES: usize = 24;

/// The application master secret.
///
/// Wiped from memory on drop and redacted in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterSecret(Zeroizing<String>);

impl MasterSecret {
    /// Wraps `text` if it is a well-formed secret.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        is_valid_secret(text).then(|| Self(Zeroizing::new(text.to_string())))
    }

    /// Generates a fresh random secret.
    #[must_use]
    pub fn generate() -> Self {
        let mut entropy = Zeroizing::new([0_u8; SECRET_ENTROPY_BYTES]);
        rand::thread_rng().fill_bytes(&mut *entropy);
        Self(Zeroizing::new(BASE64_NO_PAD.encode(&*entropy)))
    }

    /// Returns the secret text. Never log the return value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the secret length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed secret.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

fn is_valid_secret(text: &str) -> bool {
    text.len() == MASTER_SECRET_LEN && text.bytes().all(|byte| byte.is_ascii_graphic())
}

/// Owns reading, generating, and persisting the master secret.
///
/// Concurrent first calls are serialized so that only one secret is ever
/// generated for an empty store.
#[derive(Clone)]
pub struct KeyManager {
    blobs: Arc<dyn BlobStore>,
    init_lock: Arc<Mutex<()>>,
}

impl KeyManager {
    /// Creates a key manager over `blobs`.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            init_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the persisted master secret, creating and persisting one if
    /// none exists or the stored value is malformed.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::StorageUnavailable`] if the blob store fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_or_create_key(&self) -> Result<MasterSecret, PresetError> {
        let _guard = self.init_lock.lock().await;

        match self.blobs.get(MASTER_KEY_BLOB).await? {
            Some(stored) => {
                let stored = Zeroizing::new(stored);
                if let Some(secret) = MasterSecret::parse(&stored) {
                    debug!("master secret loaded");
                    return Ok(secret);
                }
                warn!(
                    stored_len = stored.len(),
                    "persisted master secret is malformed; generating a new one \
                     (data encrypted under the old secret is no longer recoverable)"
                );
            }
            None => info!("no master secret found; generating one"),
        }

        self.persist_new_secret().await
    }

    /// Replaces the master secret unconditionally.
    ///
    /// Presets saved under the previous secret can no longer be decrypted.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::StorageUnavailable`] if the blob store fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn reset(&self) -> Result<MasterSecret, PresetError> {
        let _guard = self.init_lock.lock().await;
        warn!("resetting master secret; existing presets become undecryptable");
        self.persist_new_secret().await
    }

    async fn persist_new_secret(&self) -> Result<MasterSecret, PresetError> {
        let secret = MasterSecret::generate();
        self.blobs.set(MASTER_KEY_BLOB, secret.expose()).await?;
        info!("new master secret persisted");
        Ok(secret)
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager").finish_non_exhaustive()
    }
}
