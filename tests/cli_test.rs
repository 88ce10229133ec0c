//! CLI integration tests
//!
//! End-to-end tests for the codepulse command-line interface and its
//! stdout protocol.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the codepulse binary, isolated in `dir`
fn codepulse(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("codepulse").expect("Failed to find codepulse binary");
    cmd.current_dir(dir)
        .env_remove("CODEPULSE_BASELINE")
        .env_remove("CODEPULSE_CALL_GRAPH")
        .env_remove("RUST_LOG");
    cmd
}

/// Create a temporary Python project with one caller/callee pair
fn setup_project() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("pyproject.toml"), "").expect("Failed to write marker");
    fs::create_dir(dir.path().join("app")).expect("Failed to create app dir");
    fs::write(
        dir.path().join("app/core.py"),
        "def price(x):\n    return x * 2\n\ndef total(items):\n    return sum(price(i) for i in items)\n",
    )
    .expect("Failed to write test file");
    dir
}

#[test]
fn test_help_output() {
    let dir = TempDir::new().unwrap();
    codepulse(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("changed Python functions"));
}

#[test]
fn test_version_output() {
    let dir = TempDir::new().unwrap();
    codepulse(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("codepulse"));
}

#[test]
fn test_no_inputs() {
    let dir = TempDir::new().unwrap();
    codepulse(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No input files provided."));
}

#[test]
fn test_first_run_creates_baseline_silently() {
    let dir = setup_project();
    codepulse(dir.path())
        .arg("app")
        .assert()
        .success()
        .stdout(predicate::str::contains("NOTIFY_FUNCTIONS").not());

    let baseline = dir.path().join(".codepulse/function_hashes.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(baseline).unwrap()).unwrap();
    assert!(json.get("price").is_some());
    assert!(json.get("total").is_some());
}

#[test]
fn test_change_prints_notify_line() {
    let dir = setup_project();
    codepulse(dir.path()).arg("app").assert().success();

    fs::write(
        dir.path().join("app/core.py"),
        "def price(x):\n    return x * 3 + x\n\ndef total(items):\n    return sum(price(i) for i in items)\n",
    )
    .unwrap();

    let output = codepulse(dir.path()).arg("app").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let line = stdout
        .lines()
        .find_map(|l| l.strip_prefix("NOTIFY_FUNCTIONS: "))
        .expect("missing NOTIFY_FUNCTIONS line");
    let entries: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["function"], "total");
    assert!(entries[0]["file"].as_str().unwrap().ends_with("core.py"));
}

#[test]
fn test_cosmetic_change_prints_nothing() {
    let dir = setup_project();
    codepulse(dir.path()).arg("app").assert().success();

    fs::write(
        dir.path().join("app/core.py"),
        "def price(x):\n    # doubled\n    print(\"pricing\", x)\n    return (x * 7)\n\ndef total(items):\n    return sum(price(i) for i in items)\n",
    )
    .unwrap();
    codepulse(dir.path())
        .arg("app")
        .assert()
        .success()
        .stdout(predicate::str::contains("NOTIFY_FUNCTIONS").not());
}

#[test]
fn test_syntax_invalid_stops_and_keeps_baseline() {
    let dir = setup_project();
    codepulse(dir.path()).arg("app").assert().success();
    let baseline = dir.path().join(".codepulse/function_hashes.json");
    let before = fs::read(&baseline).unwrap();

    fs::write(dir.path().join("app/core.py"), "def price(x:\n    return x\n").unwrap();
    codepulse(dir.path())
        .arg("app")
        .assert()
        .success()
        .stdout(predicate::str::contains("SYNTAX_INVALID"))
        .stdout(predicate::str::contains("NOTIFY_FUNCTIONS").not());
    assert_eq!(fs::read(&baseline).unwrap(), before);
}

#[test]
fn test_keep_going_lists_invalid_files() {
    let dir = setup_project();
    fs::write(dir.path().join("app/bad.py"), "def oops(:\n").unwrap();
    codepulse(dir.path())
        .args(["--keep-going", "app"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("UNPARSED_FILES: [")
                .and(predicate::str::contains("bad.py"))
                // Editor integrations treat any SYNTAX_INVALID as an aborted run
                .and(predicate::str::contains("SYNTAX_INVALID").not()),
        );
}

#[test]
fn test_deeply_nested_file_is_syntax_invalid() {
    let dir = setup_project();
    let chain = vec!["x"; 3000].join(" + ");
    fs::write(
        dir.path().join("app/deep.py"),
        format!("def f(x):\n    return {chain}\n"),
    )
    .unwrap();
    codepulse(dir.path())
        .arg("app")
        .assert()
        .success()
        .stdout(predicate::str::contains("SYNTAX_INVALID"));
    assert!(!dir.path().join(".codepulse/function_hashes.json").exists());
}

#[test]
fn test_invalid_path_is_skipped() {
    let dir = setup_project();
    codepulse(dir.path())
        .args(["missing.py", "app/core.py"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping invalid path"));
    assert!(dir.path().join(".codepulse/function_hashes.json").exists());
}

#[test]
fn test_baseline_flag_and_dry_run() {
    let dir = setup_project();
    let custom = dir.path().join("state/hashes.json");

    codepulse(dir.path())
        .args(["--dry-run", "--baseline"])
        .arg(&custom)
        .arg("app")
        .assert()
        .success();
    assert!(!custom.exists());

    codepulse(dir.path())
        .arg("--baseline")
        .arg(&custom)
        .arg("app")
        .assert()
        .success();
    assert!(custom.exists());
    assert!(!dir.path().join(".codepulse").exists());
}

#[test]
fn test_call_graph_written_when_configured() {
    let dir = setup_project();
    fs::write(
        dir.path().join(".codepulse.toml"),
        "call_graph = \"out/calls.json\"\n",
    )
    .unwrap();
    codepulse(dir.path()).arg("app").assert().success();

    let graph: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("out/calls.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(graph["price"][0]["caller"], "total");
}

#[test]
fn test_corrupt_baseline_fails() {
    let dir = setup_project();
    fs::create_dir_all(dir.path().join(".codepulse")).unwrap();
    fs::write(dir.path().join(".codepulse/function_hashes.json"), "{oops").unwrap();
    codepulse(dir.path())
        .arg("app")
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}
