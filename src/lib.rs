//! Cookie Presets Library
//!
//! Stores named sets of browser cookies encrypted at rest and writes them
//! back into a live cookie jar on demand.
//!
//! # Architecture
//!
//! The library is organized into the following modules, leaves first:
//! - [`storage`] - Key/value blob persistence (file-backed and in-memory)
//! - [`cookie`] - Cookie model and cookie-jar backends
//! - [`crypto`] - Master secret lifecycle and AES-256-GCM envelopes
//! - [`preset`] - Named preset map with serialized mutations
//! - [`apply`] - Best-effort application of cookies to a jar
//! - [`transfer`] - Plain and encrypted export/import

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod apply;
pub mod cookie;
pub mod crypto;
pub mod error;
pub mod preset;
pub mod storage;
pub mod transfer;

// Re-export commonly used types
pub use apply::{
    ApplyFailure, ApplyResult, apply_cookies, apply_import, apply_preset, clear_domain,
};
pub use cookie::{
    CookieErrorKind, CookieRecord, CookieStore, CookieStoreError, MemoryCookieStore,
    NetscapeCookieStore, SameSite,
};
pub use crypto::{EnvelopeCipher, KeyManager, MasterSecret};
pub use error::{ErrorKind, PresetError};
pub use preset::PresetStore;
pub use storage::{BlobStore, BlobStoreError, FileBlobStore, MemoryBlobStore};
pub use transfer::{ImportRejection, ImportedCookies, export_cookies, import_cookies};
