use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ghp_clitesttoken000000";

fn reposync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("reposync"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("GITHUB_TOKEN")
        .env_remove("REPOSYNC_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_manifest(dir: &Path, api_url: &str) -> PathBuf {
    let manifest = dir.join("reposync.yaml");
    fs::write(
        &manifest,
        format!(
            r#"repository: {{ owner: octo, name: demo }}
settings:
  api_url: {api_url}
  settle_delay_ms: 0
  file_delay_ms: 0
files:
  - path: .github/workflows/ci.yml
    content: "token: ghp_leaked\n"
    message: Add CI
"#
        ),
    )
    .unwrap();
    manifest
}

fn ledger_path(home: &Path) -> PathBuf {
    home.join(".reposync/ledger/octo/demo.json")
}

#[test]
fn init_writes_manifest_once() {
    let home = TempDir::new().unwrap();
    let manifest = home.path().join("reposync.yaml");

    reposync_cmd(home.path())
        .args(["init", manifest.to_str().unwrap(), "--owner", "octo", "--repo", "demo"])
        .assert()
        .success()
        .stdout(contains("octo/demo"));
    let yaml = fs::read_to_string(&manifest).unwrap();
    assert!(yaml.contains("README.md"));

    reposync_cmd(home.path())
        .args(["init", manifest.to_str().unwrap(), "--owner", "octo", "--repo", "demo"])
        .assert()
        .failure()
        .stderr(contains("already exists"));
}

#[test]
fn dry_run_needs_no_token_and_writes_nothing() {
    let home = TempDir::new().unwrap();
    let manifest = write_manifest(home.path(), "http://127.0.0.1:9");

    reposync_cmd(home.path())
        .args(["sync", manifest.to_str().unwrap(), "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]").and(contains(".github/workflows/ci.yml")));
    assert!(!ledger_path(home.path()).exists());
}

#[test]
fn status_json_lists_new_files() {
    let home = TempDir::new().unwrap();
    let manifest = write_manifest(home.path(), "http://127.0.0.1:9");

    let output = reposync_cmd(home.path())
        .args(["status", manifest.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["repository"], "octo/demo");
    assert_eq!(report["last_sync_at"], Value::Null);
    assert_eq!(report["summary"]["new"], 1);
    assert_eq!(report["files"][0]["path"], ".github/workflows/ci.yml");
    assert_eq!(report["files"][0]["state"], "new");
}

#[test]
fn sync_without_token_fails() {
    let home = TempDir::new().unwrap();
    let manifest = write_manifest(home.path(), "http://127.0.0.1:9");

    reposync_cmd(home.path())
        .args(["sync", manifest.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("GITHUB_TOKEN"));
}

#[test]
fn malformed_token_is_rejected_before_any_request() {
    let home = TempDir::new().unwrap();
    reposync_cmd(home.path())
        .args(["whoami", "--api-url", "http://127.0.0.1:9", "--token", "hunter2"])
        .assert()
        .failure()
        .stderr(contains("invalid GitHub token format"));
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_bypasses_secret_scanning_and_records_ledger() {
    let server = MockServer::start().await;
    let contents = "/repos/octo/demo/contents/.github/workflows/ci.yml";
    Mock::given(method("GET"))
        .and(path(contents))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(contents))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Secret detected in content",
            "metadata": {"secret_scanning": {"bypass_placeholders": [
                {"placeholder_id": "ph-1", "token_type": "GITHUB_PERSONAL_ACCESS_TOKEN"}
            ]}}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/demo/secret-scanning/push-protection-bypasses"))
        .and(body_json(json!({"reason": "false_positive", "placeholder_id": "ph-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reason": "false_positive"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(contents))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"path": ".github/workflows/ci.yml", "sha": "blob1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let manifest = write_manifest(home.path(), &server.uri());

    let output = reposync_cmd(home.path())
        .env("GITHUB_TOKEN", TOKEN)
        .args(["sync", manifest.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 written"), "stdout: {stdout}");
    assert!(stdout.contains("bypass"), "stdout: {stdout}");
    assert!(!stdout.contains(TOKEN));

    let ledger: Value = serde_json::from_str(&fs::read_to_string(ledger_path(home.path())).unwrap())
        .unwrap();
    assert_eq!(ledger["branches"]["HEAD"][".github/workflows/ci.yml"]["version"], "blob1");
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_exits_non_zero_when_a_file_fails() {
    let server = MockServer::start().await;
    let contents = "/repos/octo/demo/contents/.github/workflows/ci.yml";
    Mock::given(method("GET"))
        .and(path(contents))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(contents))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let manifest = write_manifest(home.path(), &server.uri());

    reposync_cmd(home.path())
        .args(["sync", manifest.to_str().unwrap(), "--token", TOKEN])
        .assert()
        .failure()
        .stdout(contains("Server Error"))
        .stderr(contains("1 of 1 file(s) failed"));
    assert!(!ledger_path(home.path()).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn api_url_from_environment_overrides_the_manifest() {
    let server = MockServer::start().await;
    let contents = "/repos/octo/demo/contents/.github/workflows/ci.yml";
    Mock::given(method("GET"))
        .and(path(contents))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(contents))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"path": ".github/workflows/ci.yml", "sha": "blob9"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    // Nothing listens here; the run only succeeds if the override wins.
    let manifest = write_manifest(home.path(), "http://127.0.0.1:9");

    let output = reposync_cmd(home.path())
        .env("GITHUB_TOKEN", TOKEN)
        .env("REPOSYNC_API_URL", server.uri())
        .args(["sync", manifest.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}
