//! Export and import of cookie lists.
//!
//! Plain exports are a 2-space indented JSON array of cookies in the
//! browser-extension shape. Encrypted exports are a single envelope string
//! and only open on an installation holding the same master secret.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::cookie::CookieRecord;
use crate::crypto::EnvelopeCipher;
use crate::error::PresetError;

/// Serializes `cookies` for transfer.
///
/// # Errors
///
/// - [`PresetError::InvalidArgument`] if the cookies cannot be serialized
/// - [`PresetError::StorageUnavailable`] if the master secret cannot be loaded
#[instrument(skip(cipher, cookies), fields(cookies = cookies.len()))]
pub async fn export_cookies(
    cipher: &EnvelopeCipher,
    cookies: &[CookieRecord],
    encrypted: bool,
) -> Result<String, PresetError> {
    if encrypted {
        return cipher.encrypt(cookies).await;
    }
    serde_json::to_string_pretty(cookies)
        .map_err(|error| PresetError::invalid_argument(format!("cookies are not serializable: {error}")))
}

/// An element of an import that could not be turned into a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRejection {
    /// Position of the element in the imported array.
    pub index: usize,
    /// The element's `name`, when it had a readable one.
    pub cookie_name: Option<String>,
    /// Why the element was rejected.
    pub reason: String,
}

impl ImportRejection {
    /// Name used when reporting the rejection: the cookie name, or `#<index>`.
    #[must_use]
    pub fn label(&self) -> String {
        self.cookie_name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.index))
    }
}

/// Result of parsing an import: the usable cookies plus every rejected element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedCookies {
    /// Cookies in input order, bad elements skipped.
    pub cookies: Vec<CookieRecord>,
    /// One entry per element that could not be read.
    pub rejected: Vec<ImportRejection>,
}

/// Parses an export produced by [`export_cookies`] or a browser extension.
///
/// Elements are read one at a time and leniently: missing `path` becomes
/// `/`, missing or unreadable `secure`/`httpOnly` become `false`, and
/// unrecognized `sameSite` values become `unset`. An element without a
/// `name` or `domain`, or one that is not an object, is collected in
/// [`ImportedCookies::rejected`] and the rest of the array still imports.
///
/// # Errors
///
/// - [`PresetError::InvalidFormat`] if the text is not JSON or is not an array
/// - [`PresetError::DecryptionError`] if an encrypted payload cannot be opened
/// - [`PresetError::StorageUnavailable`] if the master secret cannot be loaded
#[instrument(skip(cipher, text), fields(text_len = text.len()))]
pub async fn import_cookies(
    cipher: &EnvelopeCipher,
    text: &str,
    encrypted: bool,
) -> Result<ImportedCookies, PresetError> {
    let decoded: Value = if encrypted {
        cipher.decrypt(text).await?
    } else {
        serde_json::from_str(text)
            .map_err(|error| PresetError::invalid_format(format!("not valid JSON: {error}")))?
    };

    let Value::Array(elements) = decoded else {
        return Err(PresetError::invalid_format("expected a JSON array of cookies"));
    };

    let mut imported = ImportedCookies::default();
    for (index, element) in elements.into_iter().enumerate() {
        let cookie_name = element
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string);
        match serde_json::from_value::<CookieRecord>(element) {
            Ok(cookie) => imported.cookies.push(cookie),
            Err(error) => {
                warn!(index, reason = %error, "import element skipped");
                imported.rejected.push(ImportRejection {
                    index,
                    cookie_name,
                    reason: error.to_string(),
                });
            }
        }
    }

    debug!(
        cookies = imported.cookies.len(),
        rejected = imported.rejected.len(),
        "cookies imported"
    );
    Ok(imported)
}
