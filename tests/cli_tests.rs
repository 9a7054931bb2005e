//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub regression_csv: NamedTempFile,
    pub classification_libsvm: NamedTempFile,
    pub test_libsvm: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        let mut regression_csv = NamedTempFile::with_suffix(".csv")?;
        writeln!(regression_csv, "x,y")?;
        for i in 0..20 {
            writeln!(regression_csv, "{},{}", i, 3 * i + 1)?;
        }
        regression_csv.flush()?;

        let mut classification_libsvm = NamedTempFile::with_suffix(".libsvm")?;
        writeln!(classification_libsvm, "+1 1:2.0 2:1.0")?;
        writeln!(classification_libsvm, "-1 1:-2.0 2:-1.0")?;
        writeln!(classification_libsvm, "+1 1:1.5 2:0.8")?;
        writeln!(classification_libsvm, "-1 1:-1.5 2:-0.8")?;
        writeln!(classification_libsvm, "+1 1:1.8 2:0.9")?;
        writeln!(classification_libsvm, "-1 1:-1.8 2:-0.9")?;
        classification_libsvm.flush()?;

        let mut test_libsvm = NamedTempFile::with_suffix(".libsvm")?;
        writeln!(test_libsvm, "+1 1:1.6 2:0.7")?;
        writeln!(test_libsvm, "-1 1:-1.6 2:-0.7")?;
        test_libsvm.flush()?;

        Ok(TestDataFiles {
            regression_csv,
            classification_libsvm,
            test_libsvm,
        })
    }
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_svmeta"))
        .args(args)
        .output()
        .expect("Failed to run CLI binary")
}

#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("regress"));
    assert!(stdout.contains("classify"));
    assert!(stdout.contains("kernel"));
}

#[test]
fn test_cli_regress_with_report() {
    let files = TestDataFiles::new().expect("Failed to create test files");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let report = dir.path().join("report.json");

    let output = run_cli(&[
        "regress",
        "--data",
        files.regression_csv.path().to_str().unwrap(),
        "--kernel",
        "linear",
        "-C",
        "1,10",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "regress failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Output 0"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["residuals"].as_array().unwrap().len(), 1);
    assert!(json["residuals"][0].as_f64().unwrap() < 1e-2);
    assert_eq!(json["selections"][0]["evaluated"], 2);
}

#[test]
fn test_cli_regress_with_config_file() {
    let files = TestDataFiles::new().expect("Failed to create test files");
    let mut config = NamedTempFile::with_suffix(".json").unwrap();
    writeln!(config, r#"{{ "folds": 2, "parallel": true }}"#).unwrap();
    config.flush().unwrap();

    let output = run_cli(&[
        "regress",
        "--data",
        files.regression_csv.path().to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
        "-p",
        "0.5,1,2",
    ]);
    assert!(
        output.status.success(),
        "regress failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_cli_classify_with_predictions() {
    let files = TestDataFiles::new().expect("Failed to create test files");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let predictions = dir.path().join("predictions.txt");

    let output = run_cli(&[
        "classify",
        "--data",
        files.classification_libsvm.path().to_str().unwrap(),
        "--kernel",
        "linear",
        "--test",
        files.test_libsvm.path().to_str().unwrap(),
        "--output",
        predictions.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "classify failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Training accuracy: 100.00%"));

    let content = std::fs::read_to_string(&predictions).unwrap();
    let labels: Vec<&str> = content
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split_whitespace().nth(1).unwrap())
        .collect();
    assert_eq!(labels, vec!["1", "-1"]);
}

#[test]
fn test_cli_classify_clustered() {
    let files = TestDataFiles::new().expect("Failed to create test files");
    let output = run_cli(&[
        "classify",
        "--data",
        files.classification_libsvm.path().to_str().unwrap(),
        "--clusters",
        "2",
    ]);
    assert!(
        output.status.success(),
        "classify failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Training accuracy"));
}

#[test]
fn test_cli_kernel_evaluation() {
    let output = run_cli(&[
        "kernel",
        "--kernel",
        "normal-rbf",
        "--parameters",
        "1",
        "--x",
        "0,0",
        "--y",
        "0,0",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Value: 1.0000000000"));
    assert!(stdout.contains("Hessian:"));
}

#[test]
fn test_cli_kernel_dimension_mismatch() {
    let output = run_cli(&["kernel", "--kernel", "linear", "--x", "1,2", "--y", "1"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_missing_file() {
    let output = run_cli(&["regress", "--data", "/nonexistent/file.csv"]);
    assert!(!output.status.success());
}
