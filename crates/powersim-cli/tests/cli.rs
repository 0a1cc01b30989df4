use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn powersim() -> Command {
    Command::cargo_bin("powersim").unwrap()
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_no_arguments_fails() {
    powersim().assert().failure();
}

#[test]
fn test_missing_sweep_argument_fails_without_artifact() {
    let tmp_dir = TempDir::new().unwrap();
    let output = tmp_dir.path().join("power.json");
    powersim()
        .args(["one-sample", "--runs", "10", "--effect-from", "0", "--steps", "3"])
        .args(["--subjects", "10", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--effect-to"));
    assert!(!output.exists());
}

#[test]
fn test_negative_sd_fails_without_artifact() {
    let tmp_dir = TempDir::new().unwrap();
    let output = tmp_dir.path().join("power.json");
    powersim()
        .args(["one-sample", "--runs", "5", "--effect-from", "0", "--effect-to", "1"])
        .args(["--steps", "2", "--subjects", "10", "--sd=-1", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("setting 0, trial 0 failed"))
        .stderr(predicate::str::contains("invalid normal distribution").count(1));
    assert!(!output.exists());
}

#[test]
fn test_one_sample_sweep_writes_table() {
    let tmp_dir = TempDir::new().unwrap();
    let output = tmp_dir.path().join("power.json");
    powersim()
        .args(["one-sample", "--runs", "30", "--effect-from", "0", "--effect-to", "1"])
        .args(["--steps", "3", "--subjects", "10,20", "--seed", "1451", "--output"])
        .arg(&output)
        .assert()
        .success();

    let table = read_json(&output);
    assert_eq!(table["design"], "one-sample");
    assert_eq!(table["runs"], 30);
    assert_eq!(table["seed"], "000000000000000000000000000005ab");
    let rows = table["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 6);
    // effect-major: both sample sizes for effect 0 come first
    assert_eq!(rows[0]["effect"], 0.0);
    assert_eq!(rows[0]["n_subjects"], 10);
    assert_eq!(rows[1]["effect"], 0.0);
    assert_eq!(rows[1]["n_subjects"], 20);
    assert_eq!(rows[5]["effect"], 1.0);
    for row in rows {
        assert_eq!(row["n_total"], 30);
        let power = row["power"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&power));
        assert!(row.get("trials").is_none());
    }
}

#[test]
fn test_same_seed_same_artifact() {
    let tmp_dir = TempDir::new().unwrap();
    let run = |name: &str| {
        let output = tmp_dir.path().join(name);
        powersim()
            .args(["single-factor", "--runs", "5", "--effect-from", "0", "--effect-to", "0.5"])
            .args(["--steps", "2", "--subjects", "6", "--trials", "4", "--seed", "42"])
            .arg("--output")
            .arg(&output)
            .assert()
            .success();
        fs::read(output).unwrap()
    };
    assert_eq!(run("a.json"), run("b.json"));
}

#[test]
fn test_sweep_to_stdout() {
    let assert = powersim()
        .args(["one-sample", "--runs", "5", "--effect-from", "0.5", "--effect-to", "0.5"])
        .args(["--steps", "1", "--subjects", "8", "--seed", "7", "--output", "-"])
        .args(["--jobs", "2", "--keep-trials"])
        .assert()
        .success();
    let table: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let rows = table["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["trials"].as_array().unwrap().len(), 5);
}

#[test]
fn test_odd_item_count_is_fatal() {
    let tmp_dir = TempDir::new().unwrap();
    let output = tmp_dir.path().join("power.json");
    powersim()
        .args(["crossed", "--runs", "2", "--effect-from", "0", "--effect-to", "80"])
        .args(["--steps", "2", "--subjects", "6", "--items", "5", "--seed", "1", "--output"])
        .arg(&output)
        .assert()
        .failure();
    assert!(!output.exists());
}

#[test]
fn test_simulate_crossed_dataset() {
    let tmp_dir = TempDir::new().unwrap();
    let output = tmp_dir.path().join("data.json");
    powersim()
        .args(["simulate", "--subjects", "4", "--items", "6", "--seed", "1451", "--output"])
        .arg(&output)
        .assert()
        .success();
    let data = read_json(&output);
    assert_eq!(data["observations"].as_array().unwrap().len(), 24);
}

#[test]
fn test_fit_reports_estimates() {
    let tmp_dir = TempDir::new().unwrap();
    let params = tmp_dir.path().join("params.json");
    fs::write(
        &params,
        r#"{"mu": 10.0, "item_intercept_sd": 1.0, "subject_intercept_sd": 2.0,
            "subject_slope_sd": 1.0, "error_sd": 1.0}"#,
    )
    .unwrap();
    let output = tmp_dir.path().join("fit.json");
    powersim()
        .arg("fit")
        .arg("--params")
        .arg(&params)
        .args(["--subjects", "12", "--items", "8", "--effect", "5", "--seed", "3", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Fixed effects:"));

    let report = read_json(&output);
    assert_eq!(report["fixed_effects"][1]["term"], "condition");
    assert_eq!(report["variance_components"].as_array().unwrap().len(), 2);
    assert_eq!(report["reml"], true);
}
