//! Authenticated envelope encryption.
//!
//! An envelope is `base64(nonce || ciphertext || tag)` where the cipher is
//! AES-256-GCM under a work key derived from the master secret with
//! PBKDF2-HMAC-SHA256. The salt is a fixed application constant: the master
//! secret is already uniformly random, so the KDF only stretches it into a
//! key of the right size. Do not reuse this derivation for passwords.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use super::key::{KeyManager, MasterSecret};
use crate::error::PresetError;

const KDF_SALT: &[u8] = b"cookie-presets/work-key/v1";
const KDF_ITERATIONS: u32 = 100_000;
const WORK_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Derives the 256-bit work key for `secret`.
///
/// Deterministic: the same secret always yields the same key.
#[must_use]
pub fn derive_work_key(secret: &MasterSecret) -> Zeroizing<[u8; WORK_KEY_LEN]> {
    let mut key = Zeroizing::new([0_u8; WORK_KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(
        secret.expose().as_bytes(),
        KDF_SALT,
        KDF_ITERATIONS,
        &mut *key,
    );
    key
}

fn cipher_for(secret: &MasterSecret) -> Aes256Gcm {
    let key = derive_work_key(secret);
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]))
}

/// Encrypts `plaintext` under `secret` with a fresh random nonce.
///
/// # Errors
///
/// Returns [`PresetError::InvalidArgument`] if the cipher refuses the input
/// (only possible for payloads beyond the GCM length limit).
pub fn seal(secret: &MasterSecret, plaintext: &[u8]) -> Result<String, PresetError> {
    let cipher = cipher_for(secret);

    let mut nonce = [0_u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| PresetError::invalid_argument("payload cannot be encrypted"))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(output))
}

/// Decrypts an envelope produced by [`seal`].
///
/// Malformed base64, a truncated envelope, a wrong key, and a forged tag all
/// fail identically.
///
/// # Errors
///
/// Returns [`PresetError::DecryptionError`].
pub fn open(secret: &MasterSecret, envelope: &str) -> Result<Vec<u8>, PresetError> {
    let payload = BASE64
        .decode(envelope.trim())
        .map_err(|_| PresetError::DecryptionError)?;
    if payload.len() < NONCE_LEN + TAG_LEN {
        return Err(PresetError::DecryptionError);
    }

    let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
    cipher_for(secret)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| PresetError::DecryptionError)
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Encrypts and decrypts serializable values under the managed master secret.
///
/// Holds no key material between calls: the secret is fetched and the work
/// key derived on every operation.
#[derive(Debug, Clone)]
pub struct EnvelopeCipher {
    keys: KeyManager,
}

impl EnvelopeCipher {
    /// Creates a cipher drawing its secret from `keys`.
    #[must_use]
    pub fn new(keys: KeyManager) -> Self {
        Self { keys }
    }

    /// Serializes `value` to JSON and seals it.
    ///
    /// # Errors
    ///
    /// - [`PresetError::InvalidArgument`] if `value` cannot be serialized
    /// - [`PresetError::StorageUnavailable`] if the master secret cannot be loaded
    #[instrument(level = "debug", skip_all)]
    pub async fn encrypt<T>(&self, value: &T) -> Result<String, PresetError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let plaintext = Zeroizing::new(serde_json::to_vec(value).map_err(|error| {
            PresetError::invalid_argument(format!("value is not serializable: {error}"))
        })?);
        let secret = self.keys.get_or_create_key().await?;
        let envelope = seal(&secret, &plaintext)?;
        debug!(plaintext_len = plaintext.len(), "sealed envelope");
        Ok(envelope)
    }

    /// Opens `envelope` and deserializes the plaintext as `T`.
    ///
    /// Plaintext that is not valid JSON for `T` counts as a malformed
    /// envelope.
    ///
    /// # Errors
    ///
    /// - [`PresetError::DecryptionError`] on any envelope or plaintext defect
    /// - [`PresetError::StorageUnavailable`] if the master secret cannot be loaded
    #[instrument(level = "debug", skip_all)]
    pub async fn decrypt<T: DeserializeOwned>(&self, envelope: &str) -> Result<T, PresetError> {
        let secret = self.keys.get_or_create_key().await?;
        let plaintext = Zeroizing::new(open(&secret, envelope)?);
        serde_json::from_slice(&plaintext).map_err(|_| PresetError::DecryptionError)
    }

    /// Like [`encrypt`](Self::encrypt), but only accepts a JSON object or array.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::InvalidArgument`] for scalars and `null`.
    pub async fn encrypt_json(&self, value: &Value) -> Result<String, PresetError> {
        if !is_container(value) {
            return Err(PresetError::invalid_argument(
                "only JSON objects and arrays can be encrypted",
            ));
        }
        self.encrypt(value).await
    }

    /// Like [`decrypt`](Self::decrypt), but rejects plaintext that is not a
    /// JSON object or array.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::DecryptionError`] for scalar or `null` plaintext.
    pub async fn decrypt_json(&self, envelope: &str) -> Result<Value, PresetError> {
        let value: Value = self.decrypt(envelope).await?;
        if is_container(&value) {
            Ok(value)
        } else {
            Err(PresetError::DecryptionError)
        }
    }
}
