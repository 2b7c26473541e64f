//! Show how the documents of a folder depend on each other.
//!
//! # Examples
//!
//! ```bash
//! atref graph docs                 # compile order, roots and cycles
//! atref graph docs --format tree   # one dependency tree per entry document
//! atref graph docs --format json
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::common::{CommandContext, Outcome, print_json};
use crate::core::AtrefError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::markdown::list_markdown_files;
use crate::resolver::{
    DependencyGraph, GraphError, GraphNode, GraphOptions, build_dependency_graph_with,
    find_cycles, topological_sort,
};
use crate::utils::fs::{FileKind, FileSystem, OsFileSystem, absolutize};

/// Output format for the graph command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// Compile order, roots and cycles
    #[default]
    Text,
    /// Full graph as JSON
    Json,
    /// Dependency tree of every entry document
    Tree,
}

/// Command to print the document dependency graph.
#[derive(Args, Debug)]
pub struct GraphCommand {
    /// Folder to analyze
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: GraphFormat,

    /// Skip documents matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,
}

/// JSON view of the graph.
#[derive(Debug, Serialize)]
pub struct GraphReport<'a> {
    /// Analyzed folder
    pub root: &'a Path,
    /// Adjacency of every document
    pub nodes: &'a BTreeMap<PathBuf, GraphNode>,
    /// Documents without dependencies
    pub roots: &'a BTreeSet<PathBuf>,
    /// Documents nothing references
    pub entry_points: Vec<PathBuf>,
    /// Dependencies-first order
    pub order: &'a [PathBuf],
    /// Documents left unordered by cycles
    pub cyclic: &'a [PathBuf],
    /// The cycles themselves
    pub cycles: Vec<Vec<PathBuf>>,
    /// Documents that could not be scanned
    pub errors: &'a [GraphError],
}

impl GraphCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails when `dir` is not a directory or an exclude pattern is invalid.
    pub fn execute(self, ctx: &CommandContext) -> Result<Outcome> {
        let (root, graph) = self.build(&OsFileSystem, ctx)?;
        let order = topological_sort(&graph);
        let cycles = find_cycles(&graph);

        match self.format {
            GraphFormat::Json => print_json(&GraphReport {
                root: &root,
                nodes: &graph.nodes,
                roots: &graph.root_files,
                entry_points: graph.entry_points(),
                order: &order.sorted,
                cyclic: &order.cyclic_nodes,
                cycles,
                errors: &graph.errors,
            })?,
            GraphFormat::Tree => print!("{}", render_trees(&graph, &order.cyclic_nodes, &root)),
            GraphFormat::Text => {
                println!("{}", "Compile order:".bold());
                for (i, path) in order.sorted.iter().enumerate() {
                    println!("  {}. {}", i + 1, ctx.display(path));
                }
                let roots: Vec<String> = graph.root_files.iter().map(|p| ctx.display(p)).collect();
                println!("{} {}", "Roots:".bold(), roots.join(", "));

                if !order.cyclic_nodes.is_empty() {
                    println!("{}", "Unordered (cyclic):".yellow().bold());
                    for path in &order.cyclic_nodes {
                        println!("  {}", ctx.display(path));
                    }
                }
                for cycle in &cycles {
                    let members: Vec<String> = cycle.iter().map(|p| ctx.display(p)).collect();
                    println!("{} Dependency cycle: {}", "⚠".yellow(), members.join(" → "));
                }
                for error in &graph.errors {
                    eprintln!("{} {}: {}", "⚠".yellow(), ctx.display(&error.path), error.message);
                }
            }
        }

        Ok(Outcome::Success)
    }

    fn build(
        &self,
        fs: &dyn FileSystem,
        ctx: &CommandContext,
    ) -> Result<(PathBuf, DependencyGraph)> {
        let root = absolutize(&self.dir).with_file_context(
            FileOperation::Metadata,
            &self.dir,
            "locating folder",
            "cli::graph",
        )?;
        if fs.kind(&root) != Some(FileKind::Directory) {
            return Err(AtrefError::NotADirectory {
                path: root.display().to_string(),
            }
            .into());
        }

        let mut exclude = ctx.config.exclude.clone();
        exclude.extend(self.exclude.iter().cloned());
        let documents = list_markdown_files(fs, &root, &exclude)?;
        let graph = build_dependency_graph_with(
            fs,
            &documents,
            &GraphOptions {
                extensions: ctx.compile_options().extensions,
            },
        );
        Ok((root, graph))
    }
}

/// One tree per entry document. Documents only reachable through a cycle get
/// a tree of their own, since no entry document leads to them.
fn render_trees(graph: &DependencyGraph, cyclic: &[PathBuf], base: &Path) -> String {
    let mut out = String::new();
    let mut covered = BTreeSet::new();

    for entry in graph.entry_points() {
        collect_reachable(graph, &entry, &mut covered);
        out.push_str(&graph.to_tree_string(&entry, base));
    }
    for node in cyclic {
        if covered.contains(node) {
            continue;
        }
        collect_reachable(graph, node, &mut covered);
        out.push_str(&graph.to_tree_string(node, base));
    }
    out
}

fn collect_reachable(graph: &DependencyGraph, start: &Path, seen: &mut BTreeSet<PathBuf>) {
    let mut stack = vec![start.to_path_buf()];
    while let Some(path) = stack.pop() {
        if !seen.insert(path.clone()) {
            continue;
        }
        if let Some(node) = graph.nodes.get(&path) {
            stack.extend(node.dependencies.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fs::MemoryFileSystem;

    fn command(dir: &str) -> GraphCommand {
        GraphCommand {
            dir: PathBuf::from(dir),
            format: GraphFormat::Tree,
            exclude: Vec::new(),
        }
    }

    #[test]
    fn test_trees_cover_entry_documents() -> Result<()> {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "@./b.md")
            .with_file("/d/b.md", "@./c.md")
            .with_file("/d/c.md", "leaf")
            .with_file("/d/notes.md", "standalone");

        let (root, graph) = command("/d").build(&fs, &CommandContext::new("/d"))?;
        let order = topological_sort(&graph);
        let rendered = render_trees(&graph, &order.cyclic_nodes, &root);

        assert_eq!(rendered, "a.md\n└── b.md\n    └── c.md\nnotes.md\n");
        Ok(())
    }

    #[test]
    fn test_pure_cycle_still_rendered() -> Result<()> {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "@./b.md")
            .with_file("/d/b.md", "@./a.md");

        let (root, graph) = command("/d").build(&fs, &CommandContext::new("/d"))?;
        let order = topological_sort(&graph);
        let rendered = render_trees(&graph, &order.cyclic_nodes, &root);

        assert_eq!(rendered, "a.md\n└── b.md\n    └── a.md (circular reference)\n");
        Ok(())
    }

    #[test]
    fn test_excludes_apply() -> Result<()> {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "A")
            .with_file("/d/drafts/b.md", "B");

        let mut cmd = command("/d");
        cmd.exclude = vec!["drafts/**".to_string()];
        let (_, graph) = cmd.build(&fs, &CommandContext::new("/d"))?;
        assert_eq!(graph.node_count(), 1);
        Ok(())
    }

    #[test]
    fn test_file_argument_is_rejected() {
        let fs = MemoryFileSystem::new().with_file("/d/a.md", "A");
        let err = command("/d/a.md").build(&fs, &CommandContext::new("/d")).unwrap_err();
        assert!(matches!(err.downcast_ref::<AtrefError>(), Some(AtrefError::NotADirectory { .. })));
    }
}
