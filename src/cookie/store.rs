//! Cookie jar capability and an in-memory implementation.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use super::record::{CookieRecord, strip_leading_dot};

/// Classification of a single cookie-store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CookieErrorKind {
    /// The target URL could not be parsed or has no host.
    InvalidUrl,
    /// The store refused the cookie (policy, malformed attributes).
    Rejected,
    /// The store itself could not be reached.
    Unavailable,
    /// No cookie matched a removal request.
    NotFound,
}

impl CookieErrorKind {
    /// Returns the stable snake_case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Rejected => "rejected",
            Self::Unavailable => "unavailable",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for CookieErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`CookieStore`] call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {reason}")]
pub struct CookieStoreError {
    /// Failure classification.
    pub kind: CookieErrorKind,
    /// Human-readable reason (never contains cookie values).
    pub reason: String,
}

impl CookieStoreError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: CookieErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`CookieErrorKind::Rejected`] error.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::new(CookieErrorKind::Rejected, reason)
    }

    /// Shorthand for a [`CookieErrorKind::Unavailable`] error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::new(CookieErrorKind::Unavailable, reason)
    }
}

/// A live cookie jar.
///
/// Uses `async_trait` so jars can be shared as `Arc<dyn CookieStore>`.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Returns all cookies, or only those matching `domain` (and its subdomains).
    async fn get_all(&self, domain: Option<&str>) -> Result<Vec<CookieRecord>, CookieStoreError>;

    /// Writes `record`, addressed by `url`, replacing any cookie with the same
    /// domain, path, and name.
    async fn set(&self, url: &str, record: &CookieRecord) -> Result<(), CookieStoreError>;

    /// Removes cookies named `name` that apply to `url`.
    async fn remove(&self, url: &str, name: &str) -> Result<(), CookieStoreError>;
}

/// Returns true when `cookie_domain` equals `filter` or is one of its subdomains.
///
/// Leading dots on either side are ignored and comparison is case-insensitive.
#[must_use]
pub fn domain_matches(cookie_domain: &str, filter: &str) -> bool {
    let cookie_domain = strip_leading_dot(cookie_domain).to_ascii_lowercase();
    let filter = strip_leading_dot(filter).to_ascii_lowercase();
    if filter.is_empty() {
        return false;
    }
    cookie_domain == filter || cookie_domain.ends_with(&format!(".{filter}"))
}

/// Parses a store URL and returns its host.
///
/// # Errors
///
/// Returns [`CookieErrorKind::InvalidUrl`] for unparseable URLs, non-http(s)
/// schemes, or URLs without a host.
pub fn url_host(url: &str) -> Result<String, CookieStoreError> {
    let parsed = Url::parse(url)
        .map_err(|error| CookieStoreError::new(CookieErrorKind::InvalidUrl, error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CookieStoreError::new(
            CookieErrorKind::InvalidUrl,
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| CookieStoreError::new(CookieErrorKind::InvalidUrl, "url has no host"))
}

/// Checks that `record` may be written through `url`.
///
/// The URL must be http(s) with a host that falls inside the cookie's domain,
/// and the cookie must have a name.
///
/// # Errors
///
/// Returns [`CookieErrorKind::InvalidUrl`] or [`CookieErrorKind::Rejected`].
pub fn validate_write(url: &str, record: &CookieRecord) -> Result<(), CookieStoreError> {
    let host = url_host(url)?;
    if record.name.trim().is_empty() {
        return Err(CookieStoreError::rejected("cookie name is empty"));
    }
    if !domain_matches(&host, &record.domain) {
        return Err(CookieStoreError::rejected(format!(
            "cookie domain '{}' does not cover host '{host}'",
            record.domain
        )));
    }
    Ok(())
}

/// Two cookies occupy the same jar slot when name, path, and domain match,
/// ignoring a leading `.` and ASCII case on the domain.
pub(super) fn same_slot(a: &CookieRecord, b: &CookieRecord) -> bool {
    a.name == b.name
        && a.path == b.path
        && strip_leading_dot(&a.domain).eq_ignore_ascii_case(strip_leading_dot(&b.domain))
}

/// In-memory cookie jar.
///
/// `reject_named` makes every write of a cookie with that name fail, which is
/// how bulk partial-failure behavior is exercised.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<Vec<CookieRecord>>,
    rejected_names: RwLock<HashSet<String>>,
    writes: RwLock<Vec<(String, String)>>,
}

impl MemoryCookieStore {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a jar pre-populated with `cookies`.
    #[must_use]
    pub fn with_cookies(cookies: Vec<CookieRecord>) -> Self {
        Self {
            cookies: RwLock::new(cookies),
            ..Self::default()
        }
    }

    /// Rejects all future writes of cookies named `name`.
    pub async fn reject_named(&self, name: &str) {
        self.rejected_names.write().await.insert(name.to_string());
    }

    /// Returns a snapshot of the jar contents.
    pub async fn snapshot(&self) -> Vec<CookieRecord> {
        self.cookies.read().await.clone()
    }

    /// Returns `(url, cookie name)` for every accepted write, in order.
    pub async fn write_log(&self) -> Vec<(String, String)> {
        self.writes.read().await.clone()
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn get_all(&self, domain: Option<&str>) -> Result<Vec<CookieRecord>, CookieStoreError> {
        let cookies = self.cookies.read().await;
        Ok(cookies
            .iter()
            .filter(|cookie| domain.is_none_or(|filter| domain_matches(&cookie.domain, filter)))
            .cloned()
            .collect())
    }

    async fn set(&self, url: &str, record: &CookieRecord) -> Result<(), CookieStoreError> {
        validate_write(url, record)?;
        if self.rejected_names.read().await.contains(&record.name) {
            return Err(CookieStoreError::rejected(format!(
                "cookie '{}' rejected by store",
                record.name
            )));
        }

        let mut cookies = self.cookies.write().await;
        cookies.retain(|existing| !same_slot(existing, record));
        cookies.push(record.clone());
        self.writes
            .write()
            .await
            .push((url.to_string(), record.name.clone()));
        Ok(())
    }

    async fn remove(&self, url: &str, name: &str) -> Result<(), CookieStoreError> {
        let host = url_host(url)?;
        let mut cookies = self.cookies.write().await;
        let before = cookies.len();
        cookies.retain(|cookie| !(cookie.name == name && domain_matches(&host, &cookie.domain)));
        if cookies.len() == before {
            return Err(CookieStoreError::new(
                CookieErrorKind::NotFound,
                format!("no cookie '{name}' for {host}"),
            ));
        }
        Ok(())
    }
}
