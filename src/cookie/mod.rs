//! Cookie model and cookie-jar capability.
//!
//! - [`CookieRecord`] / [`SameSite`] - closed, typed cookie representation
//! - [`CookieStore`] - async jar capability consumed by the apply protocol
//! - [`MemoryCookieStore`] - in-process jar for tests and embedding
//! - [`NetscapeCookieStore`] - jar persisted as a Netscape cookie file

mod netscape;
mod record;
mod store;

pub use netscape::{
    CookieFileError, NetscapeCookieStore, ParseResult, parse_netscape_cookies,
    render_netscape_cookies,
};
pub use record::{CookieRecord, SameSite, strip_leading_dot, target_url};
pub use store::{
    CookieErrorKind, CookieStore, CookieStoreError, MemoryCookieStore, domain_matches, url_host,
    validate_write,
};
