//! Cookie record model shared by presets, the apply protocol, and transfer.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// `SameSite` policy of a cookie.
///
/// Unknown labels normalize to [`SameSite::Unset`] instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SameSite {
    /// Sent on cross-site requests (`SameSite=None`).
    NoRestriction,
    /// Sent on top-level cross-site navigation.
    Lax,
    /// Same-site requests only.
    Strict,
    /// No policy recorded.
    #[default]
    Unset,
}

impl SameSite {
    /// Returns the stable wire label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoRestriction => "no_restriction",
            Self::Lax => "lax",
            Self::Strict => "strict",
            Self::Unset => "unset",
        }
    }

    /// Parses a label, normalizing anything unrecognized to `Unset`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "no_restriction" | "none" => Self::NoRestriction,
            "lax" => Self::Lax,
            "strict" => Self::Strict,
            _ => Self::Unset,
        }
    }

    fn from_json(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_str)
            .map_or(Self::Unset, Self::from_label)
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SameSite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single browser cookie.
///
/// The value is redacted in `Debug` output to keep it out of logs.
/// A session cookie never carries an expiration date: constructors and
/// deserialization drop it, and serialization omits it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCookie")]
pub struct CookieRecord {
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive, never log).
    value: String,
    /// Domain the cookie belongs to (e.g. `.example.com`).
    pub domain: String,
    /// URL path scope.
    pub path: String,
    /// HTTPS only.
    pub secure: bool,
    /// Hidden from page scripts.
    pub http_only: bool,
    /// Cross-site policy.
    pub same_site: SameSite,
    /// Expiry as Unix seconds; `None` for session cookies.
    pub expiration_date: Option<u64>,
    /// Session cookie (discarded when the browser closes).
    pub session: bool,
}

impl CookieRecord {
    /// Creates a session cookie with path `/` and no flags set.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            same_site: SameSite::Unset,
            expiration_date: None,
            session: true,
        }
    }

    /// Turns this into a persistent cookie expiring at `expires` (Unix seconds).
    #[must_use]
    pub fn expiring_at(mut self, expires: u64) -> Self {
        self.expiration_date = Some(expires);
        self.session = false;
        self
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the cookie value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Returns the expiration that should actually be written.
    ///
    /// Session cookies ignore any stored expiration.
    #[must_use]
    pub fn effective_expiration(&self) -> Option<u64> {
        if self.session {
            None
        } else {
            self.expiration_date
        }
    }

    /// Returns true when the cookie has a past expiration relative to `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.effective_expiration()
            .is_some_and(|expires| expires <= now)
    }

    /// Returns a copy with the domain replaced.
    #[must_use]
    pub fn rebound_to(&self, domain: &str) -> Self {
        let mut rebound = self.clone();
        rebound.domain = domain.to_string();
        rebound
    }
}

impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("same_site", &self.same_site)
            .field("expiration_date", &self.expiration_date)
            .field("session", &self.session)
            .finish()
    }
}

impl Serialize for CookieRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let expiration = self.effective_expiration();
        let field_count = if expiration.is_some() { 9 } else { 8 };
        let mut state = serializer.serialize_struct("CookieRecord", field_count)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("domain", &self.domain)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("secure", &self.secure)?;
        state.serialize_field("httpOnly", &self.http_only)?;
        state.serialize_field("sameSite", &self.same_site)?;
        if let Some(expires) = expiration {
            state.serialize_field("expirationDate", &expires)?;
        } else {
            state.skip_field("expirationDate")?;
        }
        state.serialize_field("session", &self.session)?;
        state.end()
    }
}

/// Loosely typed cookie as found in browser-extension JSON exports.
///
/// Every field is taken as raw JSON and coerced: booleans may arrive as
/// `"true"`/`"false"` or `0`/`1`, the expiration as a number or numeric
/// string, and text fields as numbers. Values that cannot be coerced fall
/// back to their defaults.
#[derive(Debug, Deserialize)]
struct RawCookie {
    name: Option<Value>,
    value: Option<Value>,
    domain: Option<Value>,
    path: Option<Value>,
    secure: Option<Value>,
    #[serde(rename = "httpOnly")]
    http_only: Option<Value>,
    #[serde(rename = "sameSite")]
    same_site: Option<Value>,
    #[serde(rename = "expirationDate")]
    expiration_date: Option<Value>,
    session: Option<Value>,
}

impl TryFrom<RawCookie> for CookieRecord {
    type Error = String;

    fn try_from(raw: RawCookie) -> Result<Self, Self::Error> {
        let name = lenient_text(raw.name.as_ref()).unwrap_or_default();
        if name.trim().is_empty() {
            return Err("missing required field: name".to_string());
        }

        let domain = lenient_text(raw.domain.as_ref())
            .unwrap_or_default()
            .trim()
            .to_string();
        if domain.is_empty() {
            return Err(format!("cookie '{name}' is missing required field: domain"));
        }

        let path = match lenient_text(raw.path.as_ref()) {
            Some(path) if !path.trim().is_empty() => path,
            _ => "/".to_string(),
        };

        let expiration_date =
            lenient_number(raw.expiration_date.as_ref()).and_then(normalized_expiry);
        let session = lenient_bool(raw.session.as_ref()).unwrap_or(expiration_date.is_none());

        Ok(Self {
            name,
            value: lenient_text(raw.value.as_ref()).unwrap_or_default(),
            domain,
            path,
            secure: lenient_bool(raw.secure.as_ref()).unwrap_or(false),
            http_only: lenient_bool(raw.http_only.as_ref()).unwrap_or(false),
            same_site: SameSite::from_json(raw.same_site.as_ref()),
            expiration_date: if session { None } else { expiration_date },
            session,
        })
    }
}

fn lenient_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn lenient_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_i64().map(|n| n != 0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Strips one leading `.` from a cookie domain.
#[must_use]
pub fn strip_leading_dot(domain: &str) -> &str {
    domain.strip_prefix('.').unwrap_or(domain)
}

/// Builds the store-facing URL for a cookie on `domain`.
///
/// Secure cookies are addressed over `https://`, all others over `http://`.
#[must_use]
pub fn target_url(secure: bool, domain: &str) -> String {
    let scheme = if secure { "https://" } else { "http://" };
    format!("{scheme}{}", strip_leading_dot(domain))
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

// Float-to-int `as` saturates, so values beyond u64 become far-future.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn normalized_expiry(raw_expiry: f64) -> Option<u64> {
    if !raw_expiry.is_finite() || raw_expiry <= 0.0 {
        return None;
    }
    Some(raw_expiry.floor() as u64)
}
