//! Integration tests for `atref compile` on single documents.

use atref_cli::test_utils::TestWorkspace;
use predicates::prelude::*;

use super::atref;

fn handbook() -> TestWorkspace {
    TestWorkspace::builder()
        .unwrap()
        .with_file("readme.md", "# Readme\n\n## Setup\n\n@./setup/install.md\n")
        .with_file(
            "setup/install.md",
            "# Install\n\nRun the installer.\n\n## Verify\n\nCheck it.\n",
        )
        .build()
        .unwrap()
}

#[test]
fn test_compile_prints_to_stdout() {
    let ws = handbook();
    let install = ws.path("setup/install.md");

    atref(&ws.root)
        .arg("compile")
        .arg(ws.path("readme.md"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Readme\n\n## Setup\n\n"))
        .stdout(predicate::str::contains(format!("<file path=\"{}\">", install.display())))
        .stdout(predicate::str::contains("### Install"))
        .stdout(predicate::str::contains("#### Verify"))
        .stdout(predicate::str::contains("</file>"))
        .stdout(predicate::str::contains("@./setup/install.md").not());

    // Source untouched
    assert!(ws.read_file("readme.md").unwrap().contains("@./setup/install.md"));
}

#[test]
fn test_compile_additive_heading_mode() {
    let ws = handbook();

    atref(&ws.root)
        .args(["compile", "--heading-mode", "additive"])
        .arg(ws.path("readme.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("### Install"))
        .stdout(predicate::str::contains("#### Verify"));
}

#[test]
fn test_compile_to_output_file() {
    let ws = handbook();
    let out = ws.path("build/readme.md");

    atref(&ws.root)
        .arg("compile")
        .arg(ws.path("readme.md"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Wrote"));

    let compiled = std::fs::read_to_string(out).unwrap();
    assert!(compiled.contains("Run the installer."));
}

#[test]
fn test_compile_write_in_place() {
    let ws = handbook();

    atref(&ws.root).arg("compile").arg(ws.path("readme.md")).arg("--write").assert().success();

    let compiled = ws.read_file("readme.md").unwrap();
    assert!(compiled.contains("Run the installer."));
    assert!(!compiled.contains("@./setup/install.md"));
}

#[test]
fn test_duplicates_are_stubbed_unless_disabled() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("root.md", "@./shared.md\n\n@./shared.md\n")
        .with_file("shared.md", "shared body\n")
        .build()
        .unwrap();
    let stub = format!("<file path=\"{}\" />", ws.path("shared.md").display());

    let output = atref(&ws.root).arg("compile").arg(ws.path("root.md")).output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(output.status.success());
    assert_eq!(stdout.matches("shared body").count(), 1);
    assert!(stdout.contains(&stub));

    let output =
        atref(&ws.root).arg("compile").arg(ws.path("root.md")).arg("--no-dedup").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("shared body").count(), 2);
    assert!(!stdout.contains(&stub));
}

#[test]
fn test_missing_reference_fails_with_position() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("readme.md", "# Readme\n\nSee @./nope.md for more.\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .arg("compile")
        .arg(ws.path("readme.md"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("See @./nope.md for more."))
        .stderr(predicate::str::contains("readme.md:3:5"))
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_circular_reference_terminates() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "A text\n@./b.md\n")
        .with_file("b.md", "B text\n@./a.md\n")
        .build()
        .unwrap();

    let output = atref(&ws.root).arg("compile").arg(ws.path("a.md")).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("A text").count(), 1);
    assert_eq!(stdout.matches("B text").count(), 1);
    assert!(String::from_utf8(output.stderr).unwrap().contains("Circular reference"));
}

#[test]
fn test_front_matter_is_stripped() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("doc.md", "---\ntitle: Doc\n---\n# Doc\n\n@./part.md\n")
        .with_file("part.md", "---\ntitle: Part\n---\nPart body\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .arg("compile")
        .arg(ws.path("doc.md"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Doc"))
        .stdout(predicate::str::contains("Part body"))
        .stdout(predicate::str::contains("title:").not());
}

#[test]
fn test_directory_reference_uses_index() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("root.md", "@./guide\n")
        .with_file("guide/index.md", "Guide index\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .arg("compile")
        .arg(ws.path("root.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Guide index"));
}

#[test]
fn test_json_report() {
    let ws = handbook();

    let output = atref(&ws.root)
        .args(["compile", "--format", "json"])
        .arg(ws.path("readme.md"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report["content"].as_str().unwrap().contains("### Install"));
    let references = report["references"].as_array().unwrap();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0]["reference"]["target_path"], "./setup/install.md");
    assert_eq!(references[0]["reference"]["line"], 5);
    assert_eq!(references[0]["found"], true);
    assert_eq!(references[0]["stub"], false);
}

#[test]
fn test_missing_document_is_an_error() {
    let ws = TestWorkspace::new().unwrap();

    atref(&ws.root)
        .arg("compile")
        .arg(ws.path("absent.md"))
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_extension_fallback() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("root.md", "@./notes/today\n")
        .with_file("notes/today.markdown", "Today's notes\n")
        .build()
        .unwrap();

    atref(&ws.root).arg("compile").arg(ws.path("root.md")).assert().code(1);

    atref(&ws.root)
        .args(["compile", "--ext", "md", "--ext", "markdown"])
        .arg(ws.path("root.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Today's notes"));
}
