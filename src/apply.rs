//! Writing stored cookies back into a live cookie jar.
//!
//! Application is best-effort: every cookie is attempted in order, a failed
//! write is recorded and skipped, and nothing already written is rolled back.
//! Writes are issued one at a time so each failure maps to exactly one cookie.

use tracing::{debug, info, instrument, warn};

use crate::cookie::{CookieErrorKind, CookieRecord, CookieStore, CookieStoreError, target_url};
use crate::error::PresetError;
use crate::preset::PresetStore;
use crate::transfer::ImportedCookies;

/// One cookie that could not be written (or removed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    /// Name of the cookie that failed.
    pub cookie_name: String,
    /// Classification reported by the cookie store.
    pub kind: CookieErrorKind,
    /// Store-provided reason.
    pub reason: String,
}

/// Outcome of a bulk cookie operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyResult {
    /// Cookies written successfully.
    pub applied_count: usize,
    /// Cookies the store refused.
    pub failed_count: usize,
    /// One entry per failed cookie, in processing order.
    pub failures: Vec<ApplyFailure>,
}

impl ApplyResult {
    /// True when no cookie failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_count == 0
    }

    /// True when some cookies were applied and some failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.applied_count > 0 && self.failed_count > 0
    }

    /// Total cookies attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.applied_count + self.failed_count
    }

    fn record_success(&mut self) {
        self.applied_count += 1;
    }

    fn record_failure(&mut self, cookie_name: &str, error: CookieStoreError) {
        self.failed_count += 1;
        self.failures.push(ApplyFailure {
            cookie_name: cookie_name.to_string(),
            kind: error.kind,
            reason: error.reason,
        });
    }

    fn absorb(&mut self, other: Self) {
        self.applied_count += other.applied_count;
        self.failed_count += other.failed_count;
        self.failures.extend(other.failures);
    }
}

/// Loads the preset `name` and writes each of its cookies onto
/// `target_domain`.
///
/// Individual cookie failures are collected in the returned [`ApplyResult`];
/// only failures to load the preset abort the call.
///
/// # Errors
///
/// - [`PresetError::InvalidArgument`] for a blank name or target domain
/// - [`PresetError::NotFound`] / [`PresetError::DecryptionError`] from loading
/// - [`PresetError::StorageUnavailable`] if the blob store fails
#[instrument(skip(presets, cookie_store))]
pub async fn apply_preset(
    presets: &PresetStore,
    cookie_store: &dyn CookieStore,
    name: &str,
    target_domain: &str,
) -> Result<ApplyResult, PresetError> {
    let target_domain = target_domain.trim();
    if target_domain.is_empty() {
        return Err(PresetError::invalid_argument("target domain must not be empty"));
    }

    let cookies = presets.load(name).await?;
    let result = apply_cookies(cookie_store, &cookies, Some(target_domain)).await;
    info!(
        preset = name,
        target = target_domain,
        applied = result.applied_count,
        failed = result.failed_count,
        "preset applied"
    );
    Ok(result)
}

/// Writes `cookies` into `cookie_store` in order.
///
/// With `target` set every cookie is rebound to that domain; with `None`
/// each cookie keeps its own domain. The URL scheme follows each cookie's
/// `secure` flag, and session cookies are written without an expiration.
pub async fn apply_cookies(
    cookie_store: &dyn CookieStore,
    cookies: &[CookieRecord],
    target: Option<&str>,
) -> ApplyResult {
    let mut result = ApplyResult::default();

    for cookie in cookies {
        let mut record = match target {
            Some(domain) => cookie.rebound_to(domain),
            None => cookie.clone(),
        };
        if record.session {
            record.expiration_date = None;
        }
        let url = target_url(record.secure, &record.domain);

        match cookie_store.set(&url, &record).await {
            Ok(()) => {
                debug!(cookie = %record.name, %url, "cookie applied");
                result.record_success();
            }
            Err(error) => {
                warn!(cookie = %record.name, %url, kind = %error.kind, "cookie not applied");
                result.record_failure(&record.name, error);
            }
        }
    }

    result
}

/// Writes an import into `cookie_store`, each cookie onto its own domain.
///
/// Elements the import could not read count as failed cookies of kind
/// [`CookieErrorKind::Rejected`] and are listed first, in input order.
pub async fn apply_import(
    cookie_store: &dyn CookieStore,
    imported: &ImportedCookies,
) -> ApplyResult {
    let mut result = ApplyResult::default();
    for rejection in &imported.rejected {
        result.record_failure(
            &rejection.label(),
            CookieStoreError::rejected(format!(
                "element #{} is not a cookie: {}",
                rejection.index, rejection.reason
            )),
        );
    }
    result.absorb(apply_cookies(cookie_store, &imported.cookies, None).await);
    info!(
        applied = result.applied_count,
        failed = result.failed_count,
        "import applied"
    );
    result
}

/// Removes every cookie `cookie_store` holds for `domain` and its subdomains.
///
/// Cookies that disappear before their turn (for example because an earlier
/// removal of the same name already covered them) count as removed.
///
/// # Errors
///
/// - [`PresetError::InvalidArgument`] for a blank domain
/// - [`PresetError::StorageUnavailable`] if the cookies cannot be listed
#[instrument(skip(cookie_store))]
pub async fn clear_domain(
    cookie_store: &dyn CookieStore,
    domain: &str,
) -> Result<ApplyResult, PresetError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(PresetError::invalid_argument("domain must not be empty"));
    }

    let cookies = cookie_store
        .get_all(Some(domain))
        .await
        .map_err(|error| PresetError::StorageUnavailable(format!("cookie store: {error}")))?;

    let mut result = ApplyResult::default();
    for cookie in &cookies {
        let url = target_url(cookie.secure, &cookie.domain);
        match cookie_store.remove(&url, &cookie.name).await {
            Ok(()) => result.record_success(),
            Err(error) if error.kind == CookieErrorKind::NotFound => {
                debug!(cookie = %cookie.name, %url, "cookie already removed");
                result.record_success();
            }
            Err(error) => {
                warn!(cookie = %cookie.name, %url, kind = %error.kind, "cookie not removed");
                result.record_failure(&cookie.name, error);
            }
        }
    }

    info!(
        domain,
        removed = result.applied_count,
        failed = result.failed_count,
        "domain cleared"
    );
    Ok(result)
}
