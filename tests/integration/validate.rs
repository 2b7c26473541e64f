//! Integration tests for `atref validate` and configuration handling.

use atref_cli::test_utils::TestWorkspace;
use predicates::prelude::*;

use super::atref;

#[test]
fn test_validate_clean_folder() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("docs/a.md", "@./b.md\n")
        .with_file("docs/b.md", "B\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .args(["validate", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 documents, 1 references, no problems"));
}

#[test]
fn test_validate_reports_broken_reference_with_suggestion() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("readme.md", "# Readme\n\nSee @./instal.md\n")
        .with_file("install.md", "# Install\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .arg("validate")
        .arg(ws.path("readme.md"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("readme.md:3:5"))
        .stdout(predicate::str::contains("File not found"))
        .stdout(predicate::str::contains("did you mean @./install.md?"));
}

#[test]
fn test_validate_never_writes() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_config("output_dir = \"dist\"\n")
        .with_file("a.md", "@./b.md\n")
        .with_file("b.md", "B\n")
        .build()
        .unwrap();

    atref(&ws.root).args(["validate", "."]).assert().success();

    assert_eq!(ws.read_file("a.md").unwrap(), "@./b.md\n");
    assert!(!ws.file_exists("dist"));
}

#[test]
fn test_validate_strict_cycles() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "@./b.md\n")
        .with_file("b.md", "@./a.md\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .args(["validate", ".", "--strict"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Dependency cycle"))
        .stdout(predicate::str::contains("Circular reference"));
}

#[test]
fn test_validate_json() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "@./gone.md and @./dir\n")
        .with_file("dir/readme.md", "not an index\n")
        .build()
        .unwrap();

    let output = atref(&ws.root).args(["validate", ".", "--format", "json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    let problems = report["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2);
    assert!(problems[0]["message"].as_str().unwrap().starts_with("File not found"));
    assert!(problems[1]["message"].as_str().unwrap().starts_with("Path is a directory"));
}

#[test]
fn test_depth_limit_from_config() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_config("max_depth = 1\n")
        .with_file("a.md", "@./b.md\n")
        .with_file("b.md", "@./c.md\n")
        .with_file("c.md", "@./d.md\n")
        .with_file("d.md", "D\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .arg("validate")
        .arg(ws.path("a.md"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Maximum reference depth of 1 exceeded"));
}

#[test]
fn test_explicit_config_flag() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("settings/ci.toml", "extensions = [\".txt\"]\n")
        .with_file("a.md", "@./notes/b\n")
        .with_file("notes/b.txt", "B\n")
        .build()
        .unwrap();

    atref(&ws.root).arg("validate").arg(ws.path("a.md")).assert().code(1);

    atref(&ws.root)
        .arg("--config")
        .arg(ws.path("settings/ci.toml"))
        .arg("validate")
        .arg(ws.path("a.md"))
        .assert()
        .success();
}

#[test]
fn test_invalid_config_is_reported() {
    let ws = TestWorkspace::new().unwrap();
    ws.write_file("atref.toml", "max_depth = \"deep\"\n").unwrap();
    ws.write_file("a.md", "A\n").unwrap();

    atref(&ws.root)
        .args(["validate", "a.md"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration file syntax"));
}

#[test]
fn test_usage_errors_exit_two() {
    let ws = TestWorkspace::new().unwrap();
    atref(&ws.root).args(["validate"]).assert().code(2);
    atref(&ws.root).args(["--verbose", "--quiet", "refs", "a.md"]).assert().code(2);
}
