//! End-to-end CLI tests for the cookie-presets binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const COOKIE_FILE: &str = "# Netscape HTTP Cookie File\n\
.example.com\tTRUE\t/\tTRUE\t4102444800\tsid\tabc123\n\
#HttpOnly_www.example.com\tFALSE\t/\tFALSE\t0\tcsrf\txyz789\n\
other.org\tFALSE\t/\tFALSE\t0\tunrelated\tnope\n";

struct Sandbox {
    _tempdir: TempDir,
    config_home: PathBuf,
    cookie_file: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let tempdir = TempDir::new().unwrap();
        let config_home = tempdir.path().join("xdg-config");
        std::fs::create_dir_all(&config_home).unwrap();
        let cookie_file = tempdir.path().join("cookies.txt");
        std::fs::write(&cookie_file, COOKIE_FILE).unwrap();
        Self {
            _tempdir: tempdir,
            config_home,
            cookie_file,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
        cmd.env("XDG_CONFIG_HOME", &self.config_home)
            .env_remove("RUST_LOG")
            .arg("--cookie-file")
            .arg(&self.cookie_file);
        cmd
    }

    fn data_dir(&self) -> PathBuf {
        self.config_home.join("cookie-presets")
    }

    fn write_config(&self, contents: &str) {
        std::fs::create_dir_all(self.data_dir()).unwrap();
        std::fs::write(self.data_dir().join("config.toml"), contents).unwrap();
    }

    fn save_work_preset(&self) {
        self.cmd()
            .args(["save", "work", "--domain", "example.com"])
            .assert()
            .success()
            .stdout(predicate::str::contains("saved 'work' (2 cookies)"));
    }
}

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn test_binary_help_displays_usage_and_exit_codes() {
    let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypted sets of browser cookies"))
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("1 = partial success"));
}

#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cookie-presets"));
}

#[test]
fn test_save_list_show_round_trip() {
    let sandbox = Sandbox::new();
    sandbox.save_work_preset();

    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout("work\n");

    sandbox
        .cmd()
        .args(["show", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"sid\""))
        .stdout(predicate::str::contains("\"httpOnly\": true"))
        .stdout(predicate::str::contains("unrelated").not());

    assert!(sandbox.data_dir().join("master_key").is_file());
    assert!(sandbox.data_dir().join("presets").is_file());
}

#[test]
fn test_apply_writes_cookies_for_target_domain() {
    let sandbox = Sandbox::new();
    sandbox.save_work_preset();

    let assert = sandbox
        .cmd()
        .args(["apply", "work", ".staging.test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("applied=2 failed=0"));
    assert_eq!(assert.get_output().status.code(), Some(0));

    let written = std::fs::read_to_string(&sandbox.cookie_file).unwrap();
    assert!(written.contains(".staging.test\tTRUE\t/\tTRUE\t4102444800\tsid\tabc123"));
    assert!(written.contains("#HttpOnly_.staging.test\tTRUE\t/\tFALSE\t0\tcsrf\txyz789"));
}

#[test]
fn test_apply_missing_preset_is_complete_failure() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .cmd()
        .args(["apply", "missing", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("preset not found: 'missing'"));
    assert_eq!(assert.get_output().status.code(), Some(2));
}

#[test]
fn test_rename_and_delete() {
    let sandbox = Sandbox::new();
    sandbox.save_work_preset();

    sandbox
        .cmd()
        .args(["rename", "work", "main"])
        .assert()
        .success();
    sandbox.cmd().arg("list").assert().success().stdout("main\n");

    sandbox.save_work_preset();
    sandbox
        .cmd()
        .args(["rename", "work", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("preset already exists: 'main'"));

    sandbox.cmd().args(["delete", "main"]).assert().success();
    sandbox.cmd().arg("list").assert().success().stdout("work\n");
}

#[test]
fn test_encrypted_export_then_import() {
    let sandbox = Sandbox::new();
    sandbox.save_work_preset();
    let export_path = sandbox.config_home.join("work.envelope");

    sandbox
        .cmd()
        .args(["export", "work", "--encrypted", "-o"])
        .arg(&export_path)
        .assert()
        .success();
    let envelope = std::fs::read_to_string(&export_path).unwrap();
    assert!(!envelope.contains("abc123"));

    sandbox
        .cmd()
        .arg("clear")
        .arg("example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains("applied=2 failed=0"));

    sandbox
        .cmd()
        .arg("import")
        .arg(&export_path)
        .arg("--encrypted")
        .assert()
        .success()
        .stdout(predicate::str::contains("applied=2 failed=0"));

    let written = std::fs::read_to_string(&sandbox.cookie_file).unwrap();
    assert!(written.contains("sid\tabc123"));
    assert!(written.contains("csrf\txyz789"));
}

#[test]
fn test_plain_import_from_stdin_with_rejected_cookie_is_partial() {
    let sandbox = Sandbox::new();
    let input = r#"[
        {"name": "ok", "value": "1", "domain": "a.test"},
        {"name": "bad", "value": "x\ty", "domain": "a.test"}
    ]"#;

    let assert = sandbox
        .cmd()
        .args(["import", "-"])
        .write_stdin(input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("applied=1 failed=1"))
        .stdout(predicate::str::contains("failed: bad (rejected)"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_import_skips_unreadable_element_and_reports_it() {
    let sandbox = Sandbox::new();
    let input = r#"[
        {"name": "one", "value": "1", "domain": "b.test"},
        {"name": "two", "value": "2", "secure": "true"},
        {"name": "three", "value": "3", "domain": "b.test", "secure": "true"}
    ]"#;

    let assert = sandbox
        .cmd()
        .args(["import", "-"])
        .write_stdin(input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("applied=2 failed=1"))
        .stdout(predicate::str::contains("failed: two (rejected)"));
    assert_eq!(assert.get_output().status.code(), Some(1));

    let written = std::fs::read_to_string(&sandbox.cookie_file).unwrap();
    assert!(written.contains("b.test\tFALSE\t/\tFALSE\t0\tone\t1"));
    assert!(written.contains("b.test\tFALSE\t/\tTRUE\t0\tthree\t3"));
}

#[test]
fn test_import_rejects_non_array() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["import", "-"])
        .write_stdin("{\"name\": \"a\"}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid format"));
}

#[test]
fn test_apply_without_cookie_file_fails() {
    let sandbox = Sandbox::new();
    let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
    cmd.env("XDG_CONFIG_HOME", &sandbox.config_home)
        .args(["apply", "work", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No cookie file configured"));
}

#[test]
fn test_key_reset_requires_confirmation_and_invalidates_presets() {
    let sandbox = Sandbox::new();
    sandbox.save_work_preset();

    sandbox
        .cmd()
        .args(["key", "reset"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    sandbox.cmd().args(["show", "work"]).assert().success();

    sandbox
        .cmd()
        .args(["key", "reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("master secret regenerated"));
    sandbox
        .cmd()
        .args(["show", "work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to decrypt"));
}

#[test]
fn test_config_show_missing_file_uses_defaults() {
    let sandbox = Sandbox::new();
    let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
    cmd.env("XDG_CONFIG_HOME", &sandbox.config_home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file = not found (using defaults)"))
        .stdout(predicate::str::contains(format!(
            "data_dir = {}",
            sandbox.data_dir().display()
        )))
        .stdout(predicate::str::contains("cookie_file = <unset>"))
        .stdout(predicate::str::contains("verbosity = default"));
}

#[test]
fn test_config_file_supplies_cookie_file_and_verbosity() {
    let sandbox = Sandbox::new();
    sandbox.write_config(&format!(
        "cookie_file = \"{}\"\nverbosity = \"quiet\"\n",
        toml_path(&sandbox.cookie_file)
    ));

    let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
    cmd.env("XDG_CONFIG_HOME", &sandbox.config_home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file = loaded"))
        .stdout(predicate::str::contains(format!(
            "cookie_file = {}",
            sandbox.cookie_file.display()
        )))
        .stdout(predicate::str::contains("verbosity = quiet"));

    let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
    cmd.env("XDG_CONFIG_HOME", &sandbox.config_home)
        .args(["save", "work", "-d", "example.com"])
        .assert()
        .success();
}

#[test]
fn test_invalid_config_file_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.write_config("colour = \"always\"\n");

    let mut cmd = Command::cargo_bin("cookie-presets").unwrap();
    cmd.env("XDG_CONFIG_HOME", &sandbox.config_home)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key: 'colour'"));
}
