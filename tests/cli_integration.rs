//! CLI integration tests
//!
//! These tests run the built binary against the checked-in fixtures and check:
//! - Command parsing and help output
//! - Files written by `build`
//! - Exit codes for full, partial and failed builds

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "PRINTERDB_OUTPUT_DIR",
    "PRINTERDB_ORCA_PATH",
    "PRINTERDB_UVTOOLS_PATH",
    "PRINTERDB_SOURCES",
    "PRINTERDB_RESOLVE_IMAGES",
    "PRINTERDB_REQUEST_TIMEOUT",
    "PRINTERDB_FETCH_RETRIES",
    "PRINTERDB_LOG_LEVEL",
    "PRINTERDB_LOG_JSON",
    "RUST_LOG",
];

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Command with a clean `PRINTERDB_*` environment
fn printerdb() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_printerdb"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to execute printerdb")
}

#[test]
fn test_cli_help() {
    let output = run(printerdb().arg("--help"));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("printerdb"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("extract"));
}

#[test]
fn test_cli_version() {
    let output = run(printerdb().arg("--version"));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_build_writes_both_files() {
    let out = TempDir::new().unwrap();
    let output = run(printerdb()
        .arg("build")
        .arg("--output-dir")
        .arg(out.path())
        .arg("--orca-path")
        .arg(fixture("orcaslicer"))
        .arg("--uvtools-path")
        .arg(fixture("uvtools")));

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Printer Database Built"));

    let printers: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("printers.json")).unwrap())
            .unwrap();
    assert_eq!(printers.as_array().unwrap().len(), 3);
    assert_eq!(printers[2]["brand"], "Resinator");
    assert_eq!(printers[2]["technology"], "SLA");
    assert_eq!(printers[2]["source"], "UVtools");

    let metadata: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("metadata.json")).unwrap())
            .unwrap();
    assert_eq!(metadata["total_printers"], 3);
}

#[test]
fn test_bare_invocation_reads_env() {
    let out = TempDir::new().unwrap();
    let output = run(printerdb()
        .env("PRINTERDB_OUTPUT_DIR", out.path())
        .env("PRINTERDB_ORCA_PATH", fixture("orcaslicer"))
        .env("PRINTERDB_UVTOOLS_PATH", fixture("uvtools"))
        .env("PRINTERDB_RESOLVE_IMAGES", "false"));

    assert_eq!(output.status.code(), Some(0));
    assert!(out.path().join("printers.json").exists());
    assert!(out.path().join("metadata.json").exists());
}

#[test]
fn test_build_json_summary() {
    let out = TempDir::new().unwrap();
    let output = run(printerdb()
        .args(["-q", "build", "--only", "sla", "--format", "json", "--output-dir"])
        .arg(out.path())
        .arg("--uvtools-path")
        .arg(fixture("uvtools")));

    assert_eq!(output.status.code(), Some(0));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["sla_count"], 1);
    assert_eq!(summary["fdm_count"], 0);
    assert_eq!(summary["sources"]["OrcaSlicer"]["status"], "skipped");
}

#[test]
fn test_partial_build_exits_zero() {
    let out = TempDir::new().unwrap();
    let missing = TempDir::new().unwrap();
    let output = run(printerdb()
        .arg("build")
        .arg("--output-dir")
        .arg(out.path())
        .arg("--orca-path")
        .arg(missing.path().join("orca"))
        .arg("--uvtools-path")
        .arg(fixture("uvtools")));

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(Degraded)"));

    let metadata: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("metadata.json")).unwrap())
            .unwrap();
    assert_eq!(metadata["sources"]["OrcaSlicer"]["status"], "failed");
    assert_eq!(metadata["sources"]["UVtools"]["status"], "success");
}

#[test]
fn test_no_data_exits_one_and_keeps_files() {
    let out = TempDir::new().unwrap();
    let missing = TempDir::new().unwrap();
    fs::write(out.path().join("printers.json"), "[]\n").unwrap();

    let output = run(printerdb()
        .arg("build")
        .arg("--output-dir")
        .arg(out.path())
        .arg("--orca-path")
        .arg(missing.path().join("orca"))
        .arg("--uvtools-path")
        .arg(missing.path().join("uvtools")));

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        fs::read_to_string(out.path().join("printers.json")).unwrap(),
        "[]\n"
    );
    assert!(!out.path().join("metadata.json").exists());
}

#[test]
fn test_invalid_config_exits_two() {
    let out = TempDir::new().unwrap();
    let output = run(printerdb()
        .arg("build")
        .arg("--output-dir")
        .arg(out.path())
        .args(["--timeout", "0"]));

    assert_eq!(output.status.code(), Some(2));
    assert!(!out.path().join("printers.json").exists());
}

#[test]
fn test_extract_prints_entries_without_writing() {
    let workdir = TempDir::new().unwrap();
    let output = run(printerdb()
        .current_dir(workdir.path())
        .args(["-q", "extract", "fdm", "--no-images", "--orca-path"])
        .arg(fixture("orcaslicer")));

    assert_eq!(output.status.code(), Some(0));
    let extraction: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(extraction["source"], "OrcaSlicer");

    let models: Vec<&str> = extraction["printers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["model"].as_str().unwrap())
        .collect();
    assert!(models.contains(&"X1"));
    assert!(models.contains(&"Mini"));
    assert!(!workdir.path().join("data").exists());
}

#[test]
fn test_extract_missing_upstream_exits_one() {
    let missing = TempDir::new().unwrap();
    let output = run(printerdb()
        .args(["-q", "extract", "sla", "--uvtools-path"])
        .arg(missing.path().join("uvtools")));

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_source_is_rejected() {
    let output = run(printerdb().args(["extract", "sls"]));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sls"));
}
