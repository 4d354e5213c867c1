use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const CONFIG: &str = r#"
run_id: "cli_check"
games:
  seed: 7
  count: 1
agents:
  - name: "greedy"
    kind: "max_probability"
  - name: "entropy"
    kind: "max_entropy"
outputs:
  jsonl: "out/games.jsonl"
  summary_md: "out/summary.md"
  plots_dir: "out/plots"
metrics:
  baseline: "greedy"
"#;

#[test]
fn validate_only_reports_the_loaded_config() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("bench.yaml");
    fs::write(&path, CONFIG).expect("write config");

    Command::cargo_bin("algo-bench")
        .expect("binary built")
        .current_dir(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded configuration 'cli_check'"))
        .stdout(predicate::str::contains("Validation-only mode"));
}

#[test]
fn invalid_baseline_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("bench.yaml");
    fs::write(&path, CONFIG.replace("baseline: \"greedy\"", "baseline: \"nobody\""))
        .expect("write config");

    Command::cargo_bin("algo-bench")
        .expect("binary built")
        .arg("--config")
        .arg(&path)
        .arg("--validate-only")
        .assert()
        .failure()
        .stderr(predicate::str::contains("metrics.baseline"));
}

#[test]
fn missing_config_fails() {
    Command::cargo_bin("algo-bench")
        .expect("binary built")
        .arg("--config")
        .arg("does/not/exist.yaml")
        .assert()
        .failure();
}
