//! Integration tests for `atref graph`.

use atref_cli::resolver::{GraphOptions, build_dependency_graph, topological_sort};
use atref_cli::test_utils::TestWorkspace;
use predicates::prelude::*;
use std::collections::BTreeSet;

use super::atref;

fn chain() -> TestWorkspace {
    TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "@./b.md and @../outside.md\n")
        .with_file("b.md", "@./c.md\n")
        .with_file("c.md", "leaf\n")
        .build()
        .unwrap()
}

#[test]
fn test_graph_over_real_files() {
    let ws = chain();
    let paths = vec![ws.path("a.md"), ws.path("b.md"), ws.path("c.md")];

    let graph = build_dependency_graph(&paths, &GraphOptions::default());
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.root_files, BTreeSet::from([ws.path("c.md")]));

    let order = topological_sort(&graph);
    assert_eq!(order.sorted, vec![ws.path("c.md"), ws.path("b.md"), ws.path("a.md")]);
    assert!(order.cyclic_nodes.is_empty());
}

#[test]
fn test_graph_text() {
    let ws = chain();

    atref(&ws.root)
        .args(["graph", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compile order:"))
        .stdout(predicate::str::contains("1. c.md"))
        .stdout(predicate::str::contains("3. a.md"))
        .stdout(predicate::str::contains("Roots: c.md"));
}

#[test]
fn test_graph_tree() {
    let ws = chain();

    atref(&ws.root)
        .arg("graph")
        .arg(&ws.root)
        .args(["--format", "tree"])
        .assert()
        .success()
        .stdout("a.md\n└── b.md\n    └── c.md\n");
}

#[test]
fn test_graph_json_with_cycle() {
    let ws = TestWorkspace::builder()
        .unwrap()
        .with_file("a.md", "@./b.md\n")
        .with_file("b.md", "@./a.md\n")
        .with_file("c.md", "alone\n")
        .build()
        .unwrap();

    let output = atref(&ws.root)
        .arg("graph")
        .arg(&ws.root)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["order"].as_array().unwrap().len(), 1);
    assert_eq!(report["cyclic"].as_array().unwrap().len(), 2);
    assert_eq!(report["cycles"].as_array().unwrap().len(), 1);
}

#[test]
fn test_graph_rejects_files() {
    let ws = chain();

    atref(&ws.root)
        .arg("graph")
        .arg(ws.path("a.md"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Not a directory"));
}
