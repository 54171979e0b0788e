//! Integration tests: capture, apply, transfer, and clear against a cookie file.

use std::path::Path;
use std::sync::Arc;

use cookie_presets::{
    CookieErrorKind, CookieStore, EnvelopeCipher, ErrorKind, FileBlobStore, KeyManager,
    MemoryBlobStore, NetscapeCookieStore, PresetStore, SameSite, apply_cookies, apply_import,
    apply_preset, clear_domain, export_cookies, import_cookies,
};
use tempfile::TempDir;

const COOKIE_FILE: &str = "# Netscape HTTP Cookie File\n\
.example.com\tTRUE\t/\tTRUE\t4102444800\tsid\tabc123\n\
#HttpOnly_www.example.com\tFALSE\t/app\tFALSE\t0\tcsrf\txyz789\n\
other.org\tFALSE\t/\tFALSE\t0\tunrelated\tnope\n";

fn write_cookie_file(dir: &Path) -> NetscapeCookieStore {
    let path = dir.join("cookies.txt");
    std::fs::write(&path, COOKIE_FILE).unwrap();
    NetscapeCookieStore::new(path)
}

fn presets_in(dir: &Path) -> PresetStore {
    let blobs = Arc::new(FileBlobStore::new(dir.join("data")));
    PresetStore::new(
        blobs.clone(),
        EnvelopeCipher::new(KeyManager::new(blobs)),
    )
}

#[tokio::test]
async fn test_capture_then_apply_to_another_domain() {
    let dir = TempDir::new().unwrap();
    let jar = write_cookie_file(dir.path());
    let presets = presets_in(dir.path());

    let saved = presets.capture("site", &jar, "example.com").await.unwrap();
    assert_eq!(saved, 2);

    let result = apply_preset(&presets, &jar, "site", ".staging.test")
        .await
        .unwrap();
    assert_eq!(result.applied_count, 2);
    assert_eq!(result.failed_count, 0);

    let staged = jar.get_all(Some("staging.test")).await.unwrap();
    assert_eq!(staged.len(), 2);
    let sid = staged.iter().find(|cookie| cookie.name == "sid").unwrap();
    assert_eq!(sid.value(), "abc123");
    assert!(sid.secure);
    assert_eq!(sid.expiration_date, Some(4_102_444_800));
    let csrf = staged.iter().find(|cookie| cookie.name == "csrf").unwrap();
    assert!(csrf.http_only);
    assert!(csrf.session);
    assert_eq!(csrf.path, "/app");

    // The source cookies are untouched.
    assert_eq!(jar.get_all(Some("example.com")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_apply_continues_past_rejected_cookie() {
    let dir = TempDir::new().unwrap();
    let jar = NetscapeCookieStore::new(dir.path().join("cookies.txt"));
    let presets = presets_in(dir.path());

    let cookies = import_cookies(
        presets.cipher(),
        r#"[
            {"name": "first", "value": "1", "domain": "source.test"},
            {"name": "second", "value": "has\ttab", "domain": "source.test"},
            {"name": "third", "value": "3", "domain": "source.test"}
        ]"#,
        false,
    )
    .await
    .unwrap()
    .cookies;
    presets.save("mixed", &cookies).await.unwrap();

    let result = apply_preset(&presets, &jar, "mixed", "target.test")
        .await
        .unwrap();
    assert_eq!(result.applied_count, 2);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.failures[0].cookie_name, "second");
    assert_eq!(result.failures[0].kind, CookieErrorKind::Rejected);

    let names: Vec<_> = jar
        .get_all(None)
        .await
        .unwrap()
        .into_iter()
        .map(|cookie| cookie.name)
        .collect();
    assert_eq!(names, vec!["first", "third"]);
}

#[tokio::test]
async fn test_encrypted_export_imports_on_same_installation() {
    let dir = TempDir::new().unwrap();
    let jar = write_cookie_file(dir.path());
    let presets = presets_in(dir.path());
    presets.capture("site", &jar, "example.com").await.unwrap();

    let cookies = presets.load("site").await.unwrap();
    let envelope = export_cookies(presets.cipher(), &cookies, true).await.unwrap();
    assert!(!envelope.contains("abc123"));

    let reopened = presets_in(dir.path());
    let imported = import_cookies(reopened.cipher(), &envelope, true)
        .await
        .unwrap();
    assert_eq!(imported.cookies, cookies);
}

#[tokio::test]
async fn test_encrypted_export_fails_on_other_installation() {
    let dir = TempDir::new().unwrap();
    let jar = write_cookie_file(dir.path());
    let presets = presets_in(dir.path());
    presets.capture("site", &jar, "example.com").await.unwrap();
    let cookies = presets.load("site").await.unwrap();
    let envelope = export_cookies(presets.cipher(), &cookies, true).await.unwrap();

    let foreign = EnvelopeCipher::new(KeyManager::new(Arc::new(MemoryBlobStore::new())));
    let err = import_cookies(&foreign, &envelope, true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionError);
}

#[tokio::test]
async fn test_browser_extension_import_applies_per_record_domain() {
    let dir = TempDir::new().unwrap();
    let jar = NetscapeCookieStore::new(dir.path().join("cookies.txt"));
    let cipher = EnvelopeCipher::new(KeyManager::new(Arc::new(MemoryBlobStore::new())));

    let exported = r#"[
        {"domain": ".alpha.test", "name": "a", "value": "1", "secure": true,
         "sameSite": "unexpected", "session": true, "expirationDate": 4102444800.5,
         "hostOnly": false, "storeId": "0"},
        {"domain": "beta.test", "name": "b", "value": "2", "sameSite": "strict",
         "expirationDate": 4102444800}
    ]"#;
    let cookies = import_cookies(&cipher, exported, false).await.unwrap().cookies;
    assert_eq!(cookies[0].same_site, SameSite::Unset);
    assert_eq!(cookies[0].effective_expiration(), None);
    assert_eq!(cookies[1].same_site, SameSite::Strict);

    let result = apply_cookies(&jar, &cookies, None).await;
    assert!(result.is_complete());
    assert_eq!(jar.get_all(Some("alpha.test")).await.unwrap().len(), 1);
    let beta = jar.get_all(Some("beta.test")).await.unwrap();
    assert_eq!(beta[0].expiration_date, Some(4_102_444_800));

    let written = std::fs::read_to_string(jar.path()).unwrap();
    assert!(written.contains(".alpha.test\tTRUE\t/\tTRUE\t0\ta\t1"));
}

#[tokio::test]
async fn test_clear_domain_leaves_other_domains() {
    let dir = TempDir::new().unwrap();
    let jar = write_cookie_file(dir.path());

    let result = clear_domain(&jar, "example.com").await.unwrap();
    assert_eq!(result.applied_count, 2);
    assert!(result.is_complete());

    let left = jar.get_all(None).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].name, "unrelated");
}

#[tokio::test]
async fn test_import_with_one_bad_element_applies_the_others() {
    let dir = TempDir::new().unwrap();
    let jar = NetscapeCookieStore::new(dir.path().join("cookies.txt"));
    let cipher = EnvelopeCipher::new(KeyManager::new(Arc::new(MemoryBlobStore::new())));

    let exported = r#"[
        {"name": "a", "value": "1", "domain": "alpha.test"},
        {"name": "b", "value": "2", "domain": "alpha.test", "expirationDate": {"bad": true},
         "secure": ["yes"]},
        {"name": "c", "value": "3"},
        {"name": "d", "value": "4", "domain": "alpha.test"}
    ]"#;
    let imported = import_cookies(&cipher, exported, false).await.unwrap();
    assert_eq!(imported.cookies.len(), 3);
    assert_eq!(imported.rejected.len(), 1);
    assert_eq!(imported.rejected[0].index, 2);

    let result = apply_import(&jar, &imported).await;
    assert_eq!(result.applied_count, 3);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.failures[0].cookie_name, "c");

    let names: Vec<_> = jar
        .get_all(Some("alpha.test"))
        .await
        .unwrap()
        .into_iter()
        .map(|cookie| cookie.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "d"]);
}
