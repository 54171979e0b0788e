//! Netscape HTTP Cookie File jar.
//!
//! Lines hold 7 TAB-separated fields: `domain`, `tailmatch`, `path`,
//! `secure`, `expires`, `name`, `value`. Lines prefixed with `#HttpOnly_`
//! (the curl convention) are HttpOnly cookies, not comments. `expires` of `0`
//! marks a session cookie. The format has no `SameSite` column, so cookies
//! read back from a file always carry [`SameSite::Unset`].

use std::fmt::Write as _;
use std::io::{BufRead, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::record::{CookieRecord, SameSite, unix_now};
use super::store::{
    CookieErrorKind, CookieStore, CookieStoreError, domain_matches, same_slot, url_host,
    validate_write,
};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";
const FILE_HEADER: &str = "# Netscape HTTP Cookie File\n";

/// Errors that can occur while parsing a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieFileError {
    /// A line in the cookie file has an invalid format.
    #[error("line {line_number}: {reason} (got: {content})")]
    InvalidLine {
        /// 1-based line number in the cookie file.
        line_number: usize,
        /// The offending line content (value redacted).
        content: String,
        /// Description of what was wrong.
        reason: String,
    },

    /// I/O error reading the cookie file.
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    /// No valid cookies found in a non-empty file.
    #[error("no valid cookies found in file ({malformed_count} lines failed to parse)")]
    NoCookiesFound {
        /// Number of malformed lines encountered.
        malformed_count: usize,
    },
}

/// Result of parsing a cookie file.
#[derive(Debug)]
pub struct ParseResult {
    /// Successfully parsed cookies.
    pub cookies: Vec<CookieRecord>,
    /// Warnings for malformed lines (line number and reason).
    pub warnings: Vec<(usize, String)>,
}

/// Parses a Netscape-format cookie file from a buffered reader.
///
/// Blank lines and `#` comments are skipped; malformed lines are collected as
/// warnings (partial success).
///
/// # Errors
///
/// Returns [`CookieFileError::Io`] on read failure, or
/// [`CookieFileError::NoCookiesFound`] when non-blank data yields zero cookies.
#[instrument(level = "debug", skip(reader))]
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<ParseResult, CookieFileError> {
    let mut cookies = Vec::new();
    let mut warnings = Vec::new();
    let mut non_blank_lines = 0;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result?;
        let line = line.trim_end();

        if line.is_empty() {
            continue;
        }

        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None if line.starts_with('#') => continue,
            None => (line, false),
        };

        non_blank_lines += 1;

        match parse_cookie_line(line, line_number, http_only) {
            Ok(cookie) => {
                debug!(
                    line = line_number,
                    domain = %cookie.domain,
                    name = %cookie.name,
                    "parsed cookie"
                );
                cookies.push(cookie);
            }
            Err(e) => {
                warn!(line = line_number, reason = %e, "skipping malformed cookie line");
                warnings.push((line_number, e.to_string()));
            }
        }
    }

    if cookies.is_empty() && non_blank_lines > 0 {
        return Err(CookieFileError::NoCookiesFound {
            malformed_count: warnings.len(),
        });
    }

    Ok(ParseResult { cookies, warnings })
}

/// Renders cookies in Netscape format, header included.
#[must_use]
pub fn render_netscape_cookies(cookies: &[CookieRecord]) -> String {
    let mut out = String::from(FILE_HEADER);
    for cookie in cookies {
        let prefix = if cookie.http_only { HTTP_ONLY_PREFIX } else { "" };
        let _ = writeln!(
            out,
            "{prefix}{}\t{}\t{}\t{}\t{}\t{}\t{}",
            cookie.domain,
            bool_field(cookie.domain.starts_with('.')),
            cookie.path,
            bool_field(cookie.secure),
            cookie.effective_expiration().unwrap_or(0),
            cookie.name,
            cookie.value(),
        );
    }
    out
}

fn bool_field(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

fn parse_cookie_line(
    line: &str,
    line_number: usize,
    http_only: bool,
) -> Result<CookieRecord, CookieFileError> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() != 7 {
        return Err(invalid_line(
            line,
            line_number,
            format!("expected 7 TAB-separated fields, found {}", fields.len()),
        ));
    }

    let domain = fields[0];
    // Tailmatch is implied by the leading dot; the field is validated only.
    parse_bool_field(fields[1], "tailmatch", line_number, line)?;
    let path = fields[2];
    let secure = parse_bool_field(fields[3], "secure", line_number, line)?;
    let expires = fields[4].parse::<u64>().map_err(|_| {
        invalid_line(
            line,
            line_number,
            format!(
                "expires field must be a non-negative integer, got '{}'",
                fields[4]
            ),
        )
    })?;
    let name = fields[5];

    if domain.is_empty() {
        return Err(invalid_line(line, line_number, "domain field is empty"));
    }
    if name.is_empty() {
        return Err(invalid_line(line, line_number, "cookie name field is empty"));
    }

    let mut cookie = CookieRecord::new(name, fields[6], domain);
    cookie.path = if path.is_empty() { "/".to_string() } else { path.to_string() };
    cookie.secure = secure;
    cookie.http_only = http_only;
    cookie.same_site = SameSite::Unset;
    if expires > 0 {
        cookie = cookie.expiring_at(expires);
    }
    Ok(cookie)
}

fn parse_bool_field(
    value: &str,
    field_name: &str,
    line_number: usize,
    line: &str,
) -> Result<bool, CookieFileError> {
    match value {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(invalid_line(
            line,
            line_number,
            format!("{field_name} field must be TRUE or FALSE, got '{value}'"),
        )),
    }
}

fn invalid_line(line: &str, line_number: usize, reason: impl Into<String>) -> CookieFileError {
    CookieFileError::InvalidLine {
        line_number,
        content: redact_line_for_error(line),
        reason: reason.into(),
    }
}

/// Redacts the cookie value (7th field) from a line for safe error messages.
fn redact_line_for_error(line: &str) -> String {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() >= 7 {
        let mut redacted = fields[..6].join("\t");
        redacted.push_str("\t[REDACTED]");
        redacted
    } else {
        line.to_string()
    }
}

/// Cookie jar persisted as a Netscape cookie file.
///
/// Every write rewrites the whole file; an internal lock keeps this jar's own
/// read-modify-write cycles from interleaving.
#[derive(Debug)]
pub struct NetscapeCookieStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl NetscapeCookieStore {
    /// Opens the jar at `path`. A missing file is an empty jar.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Returns the cookie file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<CookieRecord>, CookieStoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(CookieStoreError::unavailable(error.to_string())),
        };

        let parsed = parse_netscape_cookies(raw.as_bytes())
            .map_err(|error| CookieStoreError::unavailable(error.to_string()))?;
        Ok(parsed.cookies)
    }

    async fn write_all(&self, cookies: &[CookieRecord]) -> Result<(), CookieStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| CookieStoreError::unavailable(error.to_string()))?;
        }
        tokio::fs::write(&self.path, render_netscape_cookies(cookies))
            .await
            .map_err(|error| CookieStoreError::unavailable(error.to_string()))
    }
}

#[async_trait]
impl CookieStore for NetscapeCookieStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn get_all(&self, domain: Option<&str>) -> Result<Vec<CookieRecord>, CookieStoreError> {
        let _guard = self.io_lock.lock().await;
        let now = unix_now();
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|cookie| !cookie.is_expired_at(now))
            .filter(|cookie| domain.is_none_or(|filter| domain_matches(&cookie.domain, filter)))
            .collect())
    }

    #[instrument(level = "debug", skip(self, record), fields(name = %record.name))]
    async fn set(&self, url: &str, record: &CookieRecord) -> Result<(), CookieStoreError> {
        validate_write(url, record)?;
        if [
            record.name.as_str(),
            record.value(),
            record.domain.as_str(),
            record.path.as_str(),
        ]
            .iter()
            .any(|field| field.contains(['\t', '\n', '\r']))
        {
            return Err(CookieStoreError::rejected(format!(
                "cookie '{}' contains characters the cookie file cannot store",
                record.name.escape_debug()
            )));
        }

        let _guard = self.io_lock.lock().await;
        let mut cookies = self.read_all().await?;
        cookies.retain(|existing| !same_slot(existing, record));
        cookies.push(record.clone());
        self.write_all(&cookies).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn remove(&self, url: &str, name: &str) -> Result<(), CookieStoreError> {
        let host = url_host(url)?;
        let _guard = self.io_lock.lock().await;
        let mut cookies = self.read_all().await?;
        let before = cookies.len();
        cookies.retain(|cookie| !(cookie.name == name && domain_matches(&host, &cookie.domain)));
        if cookies.len() == before {
            return Err(CookieStoreError::new(
                CookieErrorKind::NotFound,
                format!("no cookie '{name}' for {host}"),
            ));
        }
        self.write_all(&cookies).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_valid_lines_and_http_only_prefix() {
        let input = "# Netscape HTTP Cookie File\n\
                     .example.com\tTRUE\t/\tTRUE\t4102444800\tsid\tabc\n\
                     #HttpOnly_example.com\tFALSE\t/app\tFALSE\t0\ttoken\txyz\n";
        let result = parse_netscape_cookies(Cursor::new(input)).unwrap();
        assert_eq!(result.cookies.len(), 2);
        assert!(result.warnings.is_empty());

        let sid = &result.cookies[0];
        assert!(sid.secure);
        assert!(!sid.session);
        assert_eq!(sid.expiration_date, Some(4_102_444_800));

        let token = &result.cookies[1];
        assert!(token.http_only);
        assert!(token.session);
        assert_eq!(token.path, "/app");
        assert_eq!(token.value(), "xyz");
    }

    #[test]
    fn test_parse_malformed_line_becomes_warning() {
        let input = "example.com\tTRUE\t/\n.ok.com\tTRUE\t/\tFALSE\t0\ta\tb\n";
        let result = parse_netscape_cookies(Cursor::new(input)).unwrap();
        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].0, 1);
    }

    #[test]
    fn test_parse_only_malformed_lines_fails() {
        let input = "garbage line\n";
        assert!(matches!(
            parse_netscape_cookies(Cursor::new(input)),
            Err(CookieFileError::NoCookiesFound { malformed_count: 1 })
        ));
    }

    #[test]
    fn test_invalid_line_error_redacts_value() {
        let line = "example.com\tMAYBE\t/\tFALSE\t0\tsid\ttop-secret";
        let err = parse_cookie_line(line, 3, false).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(!msg.contains("top-secret"));
        assert!(msg.contains("[REDACTED]"));
    }

    #[test]
    fn test_render_then_parse_preserves_flags() {
        let mut cookie = CookieRecord::new("sid", "abc", ".example.com").expiring_at(4_102_444_800);
        cookie.http_only = true;
        cookie.secure = true;
        let rendered = render_netscape_cookies(&[cookie.clone()]);
        assert!(rendered.starts_with(FILE_HEADER));
        assert!(rendered.contains("#HttpOnly_.example.com\tTRUE\t/\tTRUE\t4102444800\tsid\tabc"));

        let parsed = parse_netscape_cookies(Cursor::new(rendered)).unwrap();
        assert_eq!(parsed.cookies, vec![cookie]);
    }

    #[tokio::test]
    async fn test_store_set_get_remove() {
        let tempdir = TempDir::new().unwrap();
        let store = NetscapeCookieStore::new(tempdir.path().join("cookies.txt"));
        assert!(store.get_all(None).await.unwrap().is_empty());

        store
            .set("http://example.com", &CookieRecord::new("a", "1", "example.com"))
            .await
            .unwrap();
        store
            .set("https://other.org", &CookieRecord::new("b", "2", "other.org"))
            .await
            .unwrap();

        let example = store.get_all(Some("example.com")).await.unwrap();
        assert_eq!(example.len(), 1);
        assert_eq!(example[0].value(), "1");

        store.remove("http://example.com", "a").await.unwrap();
        assert_eq!(store.get_all(None).await.unwrap().len(), 1);
        let err = store.remove("http://example.com", "a").await.unwrap_err();
        assert_eq!(err.kind, CookieErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_store_rejects_tab_in_value() {
        let tempdir = TempDir::new().unwrap();
        let store = NetscapeCookieStore::new(tempdir.path().join("cookies.txt"));
        let err = store
            .set("http://example.com", &CookieRecord::new("a", "x\ty", "example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, CookieErrorKind::Rejected);
    }

    #[tokio::test]
    async fn test_get_all_skips_expired() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("cookies.txt");
        std::fs::write(
            &path,
            "example.com\tFALSE\t/\tFALSE\t1\told\tv\nexample.com\tFALSE\t/\tFALSE\t0\tfresh\tv\n",
        )
        .unwrap();
        let store = NetscapeCookieStore::new(path);
        let cookies = store.get_all(None).await.unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "fresh");
    }

    #[tokio::test]
    async fn test_set_treats_leading_dot_domain_as_same_cookie() {
        let dir = TempDir::new().unwrap();
        let store = NetscapeCookieStore::new(dir.path().join("cookies.txt"));

        let old = CookieRecord::new("sid", "old", "example.com");
        store.set("http://example.com", &old).await.unwrap();
        let new = CookieRecord::new("sid", "new", ".EXAMPLE.com");
        store.set("http://example.com", &new).await.unwrap();

        let all = store.get_all(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value(), "new");
        assert_eq!(all[0].domain, ".EXAMPLE.com");
    }
}
