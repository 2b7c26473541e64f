//! Integration tests for `atref refs`.

use atref_cli::markdown::{ExtractOptions, extract_references};
use atref_cli::test_utils::TestWorkspace;
use predicates::prelude::*;

use super::atref;

const DOC: &str = "# Notes\n\nMail user@example.com, run `cat @src/main.rs`.\n\n\
                   Read @./src/main.rs and @./missing.md.\n";

fn workspace() -> TestWorkspace {
    TestWorkspace::builder()
        .unwrap()
        .with_file("notes.md", DOC)
        .with_file("src/main.rs", "fn main() {}\n")
        .build()
        .unwrap()
}

#[test]
fn test_extraction_skips_code_and_email() {
    let refs = extract_references(DOC, &ExtractOptions::default());
    let targets: Vec<&str> = refs.iter().map(|r| r.target_path.as_str()).collect();
    assert_eq!(targets, vec!["./src/main.rs", "./missing.md"]);
    assert_eq!(refs, extract_references(DOC, &ExtractOptions::default()));
}

#[test]
fn test_refs_text() {
    let ws = workspace();

    atref(&ws.root)
        .arg("refs")
        .arg(ws.path("notes.md"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("5:6 @./src/main.rs"))
        .stdout(predicate::str::contains("@./missing.md (File not found"));
}

#[test]
fn test_refs_json() {
    let ws = workspace();

    let output = atref(&ws.root)
        .args(["refs", "--format", "json"])
        .arg(ws.path("notes.md"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let refs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let refs = refs.as_array().unwrap();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0]["target_path"], "./src/main.rs");
    assert_eq!(refs[0]["line"], 5);
    assert_eq!(refs[0]["column"], 6);
    assert_eq!(refs[0]["resolved"]["exists"], true);
    assert_eq!(refs[1]["resolved"]["exists"], false);
}

#[test]
fn test_refs_zero_based_positions() {
    let ws = workspace();
    ws.write_file("atref.toml", "one_based_positions = false\n").unwrap();

    atref(&ws.root)
        .arg("refs")
        .arg(ws.path("notes.md"))
        .assert()
        .stdout(predicate::str::contains("4:5 @./src/main.rs"));
}

#[test]
fn test_refs_without_references() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("plain.md", "Nothing here.\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .args(["refs", "plain.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No references in plain.md"));
}
