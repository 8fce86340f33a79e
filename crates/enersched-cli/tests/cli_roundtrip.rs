//! CLI integration tests: exit codes and result files.

use std::fs;
use std::path::Path;
use std::process::Command;

fn enersched() -> Command {
    Command::new(env!("CARGO_BIN_EXE_enersched"))
}

fn write_instance(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("instance.json");
    fs::write(
        &path,
        r#"{
            "numOperations": 3,
            "releaseTimes": [0, 0, 0],
            "dueDates": [4, 5, 6],
            "processingTimes": 3,
            "powerConsumptions": 1.0,
            "maxDeviation": 0,
            "numMeteringIntervals": 2,
            "lengthMeteringInterval": 5,
            "maxEnergyConsumptions": 10.0
        }"#,
    )
    .unwrap();
    path
}

fn write_prescription(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("prescription.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn solves_and_writes_an_optimal_result() {
    let dir = tempfile::tempdir().unwrap();
    let instance = write_instance(dir.path());
    let prescription = write_prescription(
        dir.path(),
        r#"{ "timeLimitInMilliseconds": 60000,
             "solverStage": { "name": "BranchAndBoundOnOrder", "cfg": {} } }"#,
    );
    let result_path = dir.path().join("result.json");

    let output = enersched()
        .arg(&prescription)
        .arg(&instance)
        .arg(&result_path)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("status: optimal"), "stdout: {stdout}");
    assert!(stdout.contains("objective: 4"), "stdout: {stdout}");

    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result_path).unwrap()).unwrap();
    assert_eq!(result["status"], 1);
    assert_eq!(result["startTimes"], serde_json::json!([0, 3, 6]));
    assert_eq!(result["objectiveValue"], 4.0);
}

#[test]
fn missing_arguments_exit_with_one() {
    let status = enersched().status().unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn unknown_solver_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let instance = write_instance(dir.path());
    let prescription = write_prescription(
        dir.path(),
        r#"{ "solverStage": { "name": "SimulatedAnnealing", "cfg": {} } }"#,
    );

    let status = enersched()
        .arg(&prescription)
        .arg(&instance)
        .arg(dir.path().join("result.json"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn malformed_instance_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let instance = dir.path().join("instance.json");
    fs::write(&instance, "{ not json").unwrap();
    let prescription = write_prescription(
        dir.path(),
        r#"{ "solverStage": { "name": "GreedyHeuristics", "cfg": {} } }"#,
    );

    let status = enersched()
        .arg(&prescription)
        .arg(&instance)
        .arg(dir.path().join("result.json"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn previous_stage_result_warm_starts_the_next_one() {
    let dir = tempfile::tempdir().unwrap();
    let instance = write_instance(dir.path());

    // Stage 1: greedy.
    let greedy_prescription = write_prescription(
        dir.path(),
        r#"{ "solverStage": { "name": "GreedyHeuristics",
                              "cfg": { "rule": "due_dates" } } }"#,
    );
    let greedy_result = dir.path().join("greedy-result.json");
    let status = enersched()
        .arg(&greedy_prescription)
        .arg(&instance)
        .arg(&greedy_result)
        .status()
        .unwrap();
    assert!(status.success());

    // Stage 2: branch and bound warm-started from the greedy result.
    let bb_prescription = dir.path().join("bb-prescription.json");
    fs::write(
        &bb_prescription,
        format!(
            r#"{{ "previousStage": "{}",
                  "solverStage": {{ "name": "BranchAndBoundOnOrder", "cfg": {{}} }} }}"#,
            greedy_result.display()
        ),
    )
    .unwrap();
    let bb_result_path = dir.path().join("bb-result.json");
    let output = enersched()
        .arg(&bb_prescription)
        .arg(&instance)
        .arg(&bb_result_path)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&bb_result_path).unwrap()).unwrap();
    assert_eq!(result["status"], 1);
    assert_eq!(result["objectiveValue"], 4.0);
}
