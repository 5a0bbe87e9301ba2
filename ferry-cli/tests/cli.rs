use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const DOCS_SECRET: &str = "It's a Secret to Everybody";
const DOCS_SHA256: &str =
    "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

fn ferry_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ferry"));
    cmd.current_dir(cwd)
        .env_remove("FERRY_CONFIG")
        .env_remove("FERRY_ENV_FILE")
        .env_remove("DEMO_SECRET")
        .env("NO_COLOR", "1");
    cmd
}

fn write_hooks(dir: &Path, setup: &str) -> std::path::PathBuf {
    let workspace = dir.join("demo");
    fs::create_dir_all(&workspace).expect("create workspace");
    let hooks = dir.join("hooks.json");
    fs::write(
        &hooks,
        format!(
            r#"{{"demo": {{"workspace": {:?}, "setup": [{setup}]}}}}"#,
            workspace.display().to_string()
        ),
    )
    .expect("write hooks");
    workspace
}

#[test]
fn check_reports_each_repository_as_json() {
    let dir = TempDir::new().expect("tempdir");
    write_hooks(dir.path(), r#"["make", "build"]"#);

    let assert = ferry_cmd(dir.path())
        .args(["check", "--json"])
        .env("DEMO_SECRET", "s3cret")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let checks: serde_json::Value = serde_json::from_str(&stdout).expect("json");

    let demo = &checks[0];
    assert_eq!(demo["repository"], "demo");
    assert_eq!(demo["workspace_exists"], true);
    assert_eq!(demo["working_copy"], false);
    assert_eq!(demo["setup_commands"], 1);
    assert_eq!(demo["secret_var"], "DEMO_SECRET");
    assert_eq!(demo["secret_set"], true);
    assert!(!stdout.contains("s3cret"), "secret value leaked");
}

#[test]
fn check_table_flags_missing_secret() {
    let dir = TempDir::new().expect("tempdir");
    write_hooks(dir.path(), "");

    ferry_cmd(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(contains("demo"))
        .stdout(contains("DEMO_SECRET (unset)"));
}

#[test]
fn check_fails_on_malformed_document() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("hooks.json"), "{ not json").expect("write");

    ferry_cmd(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(contains("not usable"));
}

#[test]
fn config_is_taken_from_environment() {
    let dir = TempDir::new().expect("tempdir");
    let elsewhere = TempDir::new().expect("tempdir");
    let yaml = dir.path().join("hooks.yaml");
    fs::write(&yaml, "site:\n  workspace: /srv/site\n").expect("write");

    ferry_cmd(elsewhere.path())
        .args(["check", "--json"])
        .env("FERRY_CONFIG", &yaml)
        .assert()
        .success()
        .stdout(contains("\"site\""));
}

#[test]
fn sign_matches_github_reference_vector() {
    let dir = TempDir::new().expect("tempdir");
    let body = dir.path().join("body.txt");
    fs::write(&body, "Hello, World!").expect("write body");

    ferry_cmd(dir.path())
        .args(["sign", "demo", "--body"])
        .arg(&body)
        .env("DEMO_SECRET", DOCS_SECRET)
        .assert()
        .success()
        .stdout(contains(format!("X-Hub-Signature-256: {DOCS_SHA256}")));
}

#[test]
fn sign_reads_stdin_for_sha1() {
    let dir = TempDir::new().expect("tempdir");
    let expected = ferry_deploy::signature::sign(
        DOCS_SECRET,
        b"payload",
        ferry_deploy::SignatureScheme::Sha1,
    )
    .expect("sign");

    let mut cmd = ferry_cmd(dir.path());
    cmd.args(["sign", "demo", "--sha1"])
        .env("DEMO_SECRET", DOCS_SECRET);
    assert_cmd::Command::from_std(cmd)
        .write_stdin("payload")
        .assert()
        .success()
        .stdout(contains(format!("X-Hub-Signature: {expected}")));
}

#[test]
fn sign_without_secret_names_the_variable() {
    let dir = TempDir::new().expect("tempdir");
    let mut cmd = ferry_cmd(dir.path());
    cmd.args(["sign", "demo"]);
    assert_cmd::Command::from_std(cmd)
        .write_stdin("payload")
        .assert()
        .failure()
        .stderr(contains("DEMO_SECRET"));
}

#[cfg(unix)]
#[test]
fn deploy_runs_setup_in_workspace() {
    let dir = TempDir::new().expect("tempdir");
    let workspace = write_hooks(dir.path(), r#"["touch", "deployed"]"#);

    let assert = ferry_cmd(dir.path())
        .args(["deploy", "demo", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json");

    assert!(workspace.join("deployed").exists());
    assert_eq!(report["repository"], "demo");
    assert_eq!(report["setup_commands"], 1);
    assert_eq!(report["sync"]["attempted"], false);
}

#[test]
fn deploy_of_unknown_repository_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_hooks(dir.path(), "");

    ferry_cmd(dir.path())
        .args(["deploy", "ghost"])
        .assert()
        .failure()
        .stderr(contains("'ghost' is not configured"));
}

#[cfg(unix)]
#[test]
fn failing_setup_fails_the_deploy() {
    let dir = TempDir::new().expect("tempdir");
    write_hooks(dir.path(), r#"["false"], ["touch", "after"]"#);

    ferry_cmd(dir.path())
        .args(["deploy", "demo"])
        .assert()
        .failure()
        .stderr(contains("deploy failed for 'demo'"));
    assert!(!dir.path().join("demo").join("after").exists());
}

#[test]
fn dotenv_in_working_directory_supplies_secrets() {
    let dir = TempDir::new().expect("tempdir");
    write_hooks(dir.path(), "");
    fs::write(dir.path().join(".env"), "DEMO_SECRET=from-dotenv\n").expect("write .env");

    let assert = ferry_cmd(dir.path())
        .args(["check", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let checks: serde_json::Value = serde_json::from_str(&stdout).expect("json");
    assert_eq!(checks[0]["secret_set"], true);
    assert!(!stdout.contains("from-dotenv"), "secret value leaked");
}

#[test]
fn explicit_env_file_is_used_for_signing() {
    let dir = TempDir::new().expect("tempdir");
    let env_file = dir.path().join("secrets.env");
    fs::write(&env_file, format!("DEMO_SECRET=\"{DOCS_SECRET}\"\n")).expect("write env file");
    let body = dir.path().join("body.txt");
    fs::write(&body, "Hello, World!").expect("write body");

    ferry_cmd(dir.path())
        .args(["sign", "demo", "--body"])
        .arg(&body)
        .arg("--env-file")
        .arg(&env_file)
        .assert()
        .success()
        .stdout(contains(format!("X-Hub-Signature-256: {DOCS_SHA256}")));
}

#[test]
fn missing_explicit_env_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_hooks(dir.path(), "");
    ferry_cmd(dir.path())
        .args(["check", "--env-file", "absent.env"])
        .assert()
        .failure()
        .stderr(contains("failed to load env file"));
}
