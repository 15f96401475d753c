use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use pwsafe_core::Document;
use tempfile::{tempdir, TempDir};

const PASSPHRASE: &str = "correct horse";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pwsafe"))
}

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempdir().expect("create temp dir"),
        }
    }

    fn safe_path(&self) -> PathBuf {
        self.dir.path().join("personal.psafe3")
    }

    fn command(&self, passphrase: &str) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("XDG_DATA_HOME", self.dir.path().join("data"))
            .env("PWSAFE_PATH", self.safe_path())
            .env("PWSAFE_PASSPHRASE", passphrase)
            .env_remove("PWSAFE_CONFIG")
            .env_remove("PWSAFE_NEW_PASSPHRASE")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(PASSPHRASE)
            .args(args)
            .output()
            .expect("run pwsafe")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn open(path: &Path, passphrase: &str) -> Document {
    Document::open(path, passphrase).expect("open should succeed")
}

#[test]
fn test_init_add_list_show() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["init", "--name", "Personal"]));
    assert!(sandbox.safe_path().exists());

    assert_success(&sandbox.run(&[
        "add",
        "Mail",
        "--group",
        "Work",
        "--user",
        "me@example.com",
        "--password",
        "hunter2",
    ]));

    let list = sandbox.run(&["list", "--json"]);
    assert_success(&list);
    let rows: serde_json::Value = serde_json::from_str(&stdout(&list)).expect("valid json");
    assert_eq!(rows[0]["group"], "Work");
    assert_eq!(rows[0]["title"], "Mail");
    assert_eq!(rows[0]["user"], "me@example.com");

    let hidden = sandbox.run(&["show", "Mail", "--json"]);
    assert_success(&hidden);
    let detail: serde_json::Value = serde_json::from_str(&stdout(&hidden)).expect("valid json");
    assert!(detail.get("password").is_none());

    let revealed = sandbox.run(&["show", "Mail", "--group", "Work", "--reveal", "--json"]);
    assert_success(&revealed);
    let detail: serde_json::Value = serde_json::from_str(&stdout(&revealed)).expect("valid json");
    assert_eq!(detail["password"], "hunter2");

    let document = open(&sandbox.safe_path(), PASSPHRASE);
    assert_eq!(document.name().unwrap(), "Personal");
    assert_eq!(document.entries().len(), 1);
}

#[test]
fn test_wrong_passphrase_exit_code() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["init"]));

    let output = sandbox
        .command("not it")
        .args(["list"])
        .output()
        .expect("run pwsafe");
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_missing_safe_exit_code() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["info"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_remove_and_missing_entry() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["init"]));
    assert_success(&sandbox.run(&["add", "Bank", "--password", "x"]));
    assert_success(&sandbox.run(&["remove", "bank"]));

    let output = sandbox.run(&["remove", "Bank"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(open(&sandbox.safe_path(), PASSPHRASE).entries().is_empty());
}

#[test]
fn test_passwd_changes_passphrase() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["init"]));

    let output = sandbox
        .command(PASSPHRASE)
        .env("PWSAFE_NEW_PASSPHRASE", "battery staple")
        .args(["passwd"])
        .output()
        .expect("run pwsafe");
    assert_success(&output);

    assert!(Document::open(sandbox.safe_path(), PASSPHRASE).is_err());
    open(&sandbox.safe_path(), "battery staple");
}

#[test]
fn test_init_respects_iterations() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["init", "--iterations", "5000"]));
    assert_eq!(open(&sandbox.safe_path(), PASSPHRASE).iterations(), 5000);
}

#[test]
fn test_autotype_default_sequence() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["init"]));
    assert_success(&sandbox.run(&["add", "Site", "--user", "me", "--password", "pw"]));

    let output = sandbox.run(&["autotype", "Site"]);
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end(), "me{Tab}pw{Enter}");
}
