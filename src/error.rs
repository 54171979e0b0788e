//! Error taxonomy shared by the key manager, envelope cipher, preset store,
//! apply protocol, and transfer codec.

use std::fmt;

use thiserror::Error;

use crate::storage::BlobStoreError;

/// Stable classification of a [`PresetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Blob store could not be read or written.
    StorageUnavailable,
    /// Named preset does not exist.
    NotFound,
    /// Rename target already exists.
    AlreadyExists,
    /// Caller supplied an unusable argument.
    InvalidArgument,
    /// Envelope could not be authenticated or parsed.
    DecryptionError,
    /// Import payload is not a JSON array of cookies.
    InvalidFormat,
}

impl ErrorKind {
    /// Returns the stable snake_case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StorageUnavailable => "storage_unavailable",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidArgument => "invalid_argument",
            Self::DecryptionError => "decryption_error",
            Self::InvalidFormat => "invalid_format",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by every public preset operation.
///
/// Decryption failures deliberately carry no detail about *why* the envelope
/// was rejected: a wrong key, a forged tag, and a truncated payload all look
/// the same to the caller.
#[derive(Debug, Clone, Error)]
pub enum PresetError {
    /// Blob store read or write failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Named preset is missing.
    #[error("preset not found: '{0}'")]
    NotFound(String),

    /// A preset with this name already exists.
    #[error("preset already exists: '{0}'")]
    AlreadyExists(String),

    /// Argument rejected before any state was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Envelope failed authentication or could not be parsed.
    #[error("unable to decrypt data (wrong key or corrupted envelope)")]
    DecryptionError,

    /// Import payload had the wrong shape.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl PresetError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::DecryptionError => ErrorKind::DecryptionError,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub(crate) fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat(reason.into())
    }
}

impl From<BlobStoreError> for PresetError {
    fn from(err: BlobStoreError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}
