//! Integration tests for folder compilation.

use atref_cli::compiler::{CompileOptions, FolderCompileOptions, compile_folder};
use atref_cli::test_utils::TestWorkspace;
use predicates::prelude::*;

use super::atref;

fn shared_docs() -> TestWorkspace {
    TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "# A\n\n@./common.md\n")
        .with_file("b.md", "# B\n\n@./common.md\n")
        .with_file("common.md", "Common body\n")
        .build()
        .unwrap()
}

#[test]
fn test_dependencies_compile_first() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "@./b.md\n")
        .with_file("b.md", "@./c.md\n")
        .with_file("c.md", "leaf\n")
        .build()
        .unwrap();

    let result = compile_folder(&ws.root, &FolderCompileOptions::default()).unwrap();
    let order: Vec<String> = result
        .order()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(order, vec!["c.md", "b.md", "a.md"]);
    assert_eq!(result.total_documents, 3);
    assert!(!result.has_failures());
}

#[test]
fn test_dedup_spans_documents() {
    let ws = shared_docs();

    let result = compile_folder(&ws.root, &FolderCompileOptions::default()).unwrap();
    let content_of = |name: &str| {
        result
            .documents
            .iter()
            .find(|d| d.path.ends_with(name))
            .and_then(|d| d.result.as_ref())
            .map(|r| r.content.clone())
            .unwrap()
    };

    let inlined = [content_of("a.md"), content_of("b.md")]
        .iter()
        .filter(|c| c.contains("Common body"))
        .count();
    assert_eq!(inlined, 1);
    assert!(content_of("b.md").contains(" />"));
    assert_eq!(result.stats.duplicates, vec![ws.path("common.md")]);
}

#[test]
fn test_no_dedup_inlines_everywhere() {
    let ws = shared_docs();
    let options = FolderCompileOptions::default()
        .with_compile_options(CompileOptions::default().with_optimize_duplicates(false));

    let result = compile_folder(&ws.root, &options).unwrap();
    for doc in result.documents.iter().filter(|d| !d.path.ends_with("common.md")) {
        assert!(doc.result.as_ref().unwrap().content.contains("Common body"));
    }
}

#[test]
fn test_cli_mirrors_into_output_dir() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("docs/index.md", "# Docs\n\n@./guide/start.md\n")
        .with_file("docs/guide/start.md", "Start here\n")
        .build()
        .unwrap();

    atref(&ws.root)
        .args(["compile", "docs", "-o", "dist"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Compiled 2 documents"));

    assert!(ws.read_file("dist/index.md").unwrap().contains("Start here"));
    assert_eq!(ws.read_file("dist/guide/start.md").unwrap(), "Start here\n");
    // Sources untouched
    assert!(ws.read_file("docs/index.md").unwrap().contains("@./guide/start.md"));
}

#[test]
fn test_cli_write_in_place() {
    let ws = shared_docs();

    atref(&ws.root).args(["compile", ".", "--write"]).assert().success();

    let a = ws.read_file("a.md").unwrap();
    let b = ws.read_file("b.md").unwrap();
    assert!(!a.contains("@./common.md"));
    assert!(!b.contains("@./common.md"));
    assert_eq!(a.contains("Common body") as usize + b.contains("Common body") as usize, 1);
}

#[test]
fn test_cli_excludes_documents() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("docs/a.md", "A\n")
        .with_file("docs/drafts/wip.md", "@./missing.md\n")
        .build()
        .unwrap();

    atref(&ws.root).args(["compile", "docs"]).assert().code(1);

    atref(&ws.root)
        .args(["compile", "docs", "--exclude", "drafts/**"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Compiled 1 documents"));
}

#[test]
fn test_cli_config_output_dir() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_config("output_dir = \"build\"\nexclude = [\"skip.md\"]\n")
        .with_file("docs/a.md", "@./b.md\n")
        .with_file("docs/b.md", "B body\n")
        .with_file("docs/skip.md", "@./nowhere.md\n")
        .build()
        .unwrap();

    atref(&ws.root).args(["compile", "docs"]).assert().success();

    assert!(ws.read_file("build/a.md").unwrap().contains("B body"));
    assert!(!ws.file_exists("build/skip.md"));
}

#[test]
fn test_cycle_is_reported_but_compiled() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "A text\n@./b.md\n")
        .with_file("b.md", "B text\n@./a.md\n")
        .build()
        .unwrap();

    let result = compile_folder(&ws.root, &FolderCompileOptions::default()).unwrap();
    assert_eq!(result.total_documents, 2);
    assert_eq!(result.cycles, vec![vec![ws.path("a.md"), ws.path("b.md")]]);
    assert!(result.documents.iter().all(|d| d.cyclic && d.result.is_some()));

    atref(&ws.root)
        .args(["compile", "."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Dependency cycle"));
}

#[test]
fn test_json_report() {
    let ws = shared_docs();

    let output = atref(&ws.root).args(["compile", ".", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_documents"], 3);
    assert_eq!(report["total_references"], 2);
    assert_eq!(report["total_failures"], 0);
    assert_eq!(report["documents"].as_array().unwrap().len(), 3);
}
