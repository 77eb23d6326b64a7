// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! End-to-end tests for the convoy binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const EXAMPLE: &str = r#"{
    "pipelineName": "p1",
    "defaultBuildImage": "repoA",
    "sourceRepo": "org/app",
    "codeStarConnectionArn": "arn:1",
    "serviceRole": "arn:role",
    "workflow": [
        {"stageName": "unit", "buildspec": "buildspec-unit.yml", "type": "test"},
        {"stageName": "package", "buildspec": "buildspec-pkg.yml", "outputName": "PkgOut"}
    ]
}"#;

fn convoy(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("convoy").unwrap();
    cmd.current_dir(dir)
        .env_remove("CONVOY_PIPELINE_DEFINITION")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn workspace(definition: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pipeline.json"), definition).unwrap();
    dir
}

#[test]
fn synth_prints_manifest() {
    let dir = workspace(EXAMPLE);

    convoy(dir.path())
        .args(["synth", "--definition", "pipeline.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pipelineName\": \"p1\""))
        .stdout(predicate::str::contains("Build_unit_Action"))
        .stdout(predicate::str::contains("PkgOut"))
        .stderr(predicate::str::contains("Read pipeline definition as"));
}

#[test]
fn synth_reads_definition_from_env() {
    let dir = workspace(EXAMPLE);

    convoy(dir.path())
        .env("CONVOY_PIPELINE_DEFINITION", "pipeline.json")
        .args(["synth", "--format", "yaml", "--out", "manifest.yaml"])
        .assert()
        .success();

    let manifest = std::fs::read_to_string(dir.path().join("manifest.yaml")).unwrap();
    assert!(manifest.contains("pipelineName: p1"));
    assert!(manifest.contains("projectName: CdkBuildpackage"));
}

#[test]
fn synth_applies_settings_file() {
    let dir = workspace(EXAMPLE);
    std::fs::write(dir.path().join(".convoy.yaml"), "source_branch: release\n").unwrap();

    convoy(dir.path())
        .args(["synth", "-d", "pipeline.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"branchName\": \"release\""));
}

#[test]
fn synth_rejects_duplicate_stages() {
    let dir = workspace(
        r#"{
            "pipelineName": "p1",
            "defaultBuildImage": "repoA",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": [
                {"stageName": "unit", "buildspec": "a.yml"},
                {"stageName": "unit", "buildspec": "b.yml"}
            ]
        }"#,
    );

    convoy(dir.path())
        .args(["synth", "-d", "pipeline.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Build_unit_Action").not())
        .stderr(predicate::str::contains("duplicate_stage_name"));
}

#[test]
fn synth_reports_error_once() {
    let dir = workspace(
        r#"{
            "pipelineName": "p1",
            "defaultBuildImage": "repoA",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": [
                {"stageName": "unit", "buildspec": "a.yml"},
                {"stageName": "unit", "buildspec": "b.yml"}
            ]
        }"#,
    );

    let output = convoy(dir.path())
        .args(["synth", "-d", "pipeline.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("is used by workflow entries 0 and 1").count(), 1);
}

#[test]
fn synth_rejects_malformed_json() {
    let dir = workspace("{\"pipelineName\": \"p1\",");

    convoy(dir.path())
        .args(["synth", "-d", "pipeline.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed_input"));
}

#[test]
fn synth_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    convoy(dir.path())
        .args(["synth", "-d", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file_read_error"));
}

#[test]
fn graph_renders_mermaid() {
    let dir = workspace(EXAMPLE);

    convoy(dir.path())
        .args(["graph", "pipeline.json", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"))
        .stdout(predicate::str::contains("-->|SourceOutput|"));
}

#[test]
fn graph_dumps_compiled_graph_as_json() {
    let dir = workspace(EXAMPLE);

    let output = convoy(dir.path())
        .args(["graph", "pipeline.json", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(graph["pipeline_name"], "p1");
    assert_eq!(graph["build"]["actions"][1]["name"], "Build_package_Action");
}

#[test]
fn validate_reports_warnings() {
    let dir = workspace(
        r#"{
            "pipelineName": "p1",
            "defaultBuildImage": "repoA",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": [{"stageName": "e2e", "buildspec": "e2e.yml", "type": "integration"}]
        }"#,
    );

    convoy(dir.path())
        .args(["validate", "pipeline.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown type 'integration'"))
        .stdout(predicate::str::contains("valid but has warnings"));
}

#[test]
fn validate_fails_on_bad_image() {
    let dir = workspace(
        r#"{
            "pipelineName": "p1",
            "defaultBuildImage": "repoA",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": [{"stageName": "unit", "buildspec": "u.yml", "buildImageOverride": "arn:aws:s3:::nope"}]
        }"#,
    );

    convoy(dir.path())
        .args(["validate", "pipeline.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("cannot resolve build image"));
}
