//! CLI subprocess integration tests.
//!
//! These tests invoke the `lambda-builder` binary as a subprocess against the
//! mock engine and verify exit codes, stdout content, and JSON output.

use std::path::Path;
use std::process::Command;

fn lambda_builder_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lambda-builder"));
    // The mock engine never talks to docker.
    cmd.env("LAMBDA_BUILDER_ENGINE", "mock");
    cmd.env_remove("LAMBDA_BUILDER_LOG");
    cmd
}

fn python_project(dir: &Path) {
    std::fs::write(dir.join("requirements.txt"), "requests\n").unwrap();
    std::fs::write(dir.join("app.py"), "def handler(event, context):\n    return {}\n").unwrap();
}

#[test]
fn cli_version_exits_zero() {
    let output = lambda_builder_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lambda-builder"), "{stdout}");
}

#[test]
fn cli_help_lists_subcommands() {
    let output = lambda_builder_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["build", "detect", "doctor"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}': {stdout}");
    }
}

#[test]
fn cli_build_succeeds_with_mock() {
    let dir = tempfile::tempdir().unwrap();
    python_project(dir.path());

    let output = lambda_builder_bin()
        .args(["build", "--write-procfile", "--working-directory"])
        .arg(dir.path())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stdout: {stdout}\nstderr: {stderr}");

    assert!(stdout.contains("=====> Detecting builder"));
    assert!(stdout.contains("Detected python builder"));
    assert!(stdout.contains("Building app with image mlupin/docker-lambda:python3.12-build"));
    assert!(stdout.contains("Current zip file size:"));
    assert!(dir.path().join("lambda.zip").is_file());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Procfile")).unwrap(),
        "web: app.handler\n"
    );
}

#[test]
fn cli_build_json_output() {
    let dir = tempfile::tempdir().unwrap();
    python_project(dir.path());

    let output = lambda_builder_bin()
        .args(["--json", "build", "--generate-image", "-t", "fn/app:ci", "--working-directory"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["builder"], "python");
    assert_eq!(json["handler"], "app.handler");
    assert_eq!(json["image"], "fn/app:ci");
    assert_eq!(json["procfile_written"], false);
    assert!(json["artifact_size"].as_u64().unwrap() > 0);
}

#[test]
fn cli_build_without_builder_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "nothing here\n").unwrap();

    let output = lambda_builder_bin()
        .args(["build", "--working-directory"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: no builder detected"), "{stderr}");
    assert!(!dir.path().join("lambda.zip").exists());
}

#[test]
fn cli_build_rejects_bad_env_assignment() {
    let dir = tempfile::tempdir().unwrap();
    python_project(dir.path());

    let output = lambda_builder_bin()
        .args(["build", "--build-env", "NOEQUALS", "--working-directory"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NOEQUALS"), "{stderr}");
}

#[test]
fn cli_build_unknown_engine_fails() {
    let dir = tempfile::tempdir().unwrap();
    python_project(dir.path());

    let output = lambda_builder_bin()
        .env("LAMBDA_BUILDER_ENGINE", "podman-remote")
        .args(["build", "--working-directory"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_detect_json_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("go.mod"), "module example.com/fn\n").unwrap();

    let output = lambda_builder_bin()
        .args(["detect", "--json", "--working-directory"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["builder"], "go");
    assert_eq!(json["handlers"][0]["file"], "bootstrap");
    assert_eq!(json["handlers"][0]["handler"], "bootstrap");
}

#[test]
fn cli_detect_honours_builder_flag() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("go.mod"), "module example.com/fn\n").unwrap();
    std::fs::write(dir.path().join("Gemfile.lock"), "").unwrap();

    let output = lambda_builder_bin()
        .args(["detect", "--builder", "ruby", "--working-directory"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("builder:     ruby"), "{stdout}");
}

#[test]
fn cli_detect_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = lambda_builder_bin()
        .args(["detect", "--working-directory"])
        .arg(dir.path().join("absent"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}
