//! Document dependency graph for folder compilation.
//!
//! Nodes are the documents being compiled. An edge `a → b` means `a` holds a
//! reference that resolves to `b`. Targets outside the document set are not
//! nodes, so the graph only orders work the folder compiler actually does.
//!
//! [`topological_sort`] orders nodes dependencies-first using Kahn's
//! algorithm. Nodes it cannot place are cycle members; [`find_cycles`] reports
//! the cycles themselves.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::path_resolver::{ResolveOptions, resolve_path_with};
use crate::constants::DEFAULT_EXTENSIONS;
use crate::markdown::frontmatter::strip_frontmatter;
use crate::markdown::reference_extractor::{ExtractOptions, extract_references};
use crate::utils::fs::{FileSystem, OsFileSystem, normalize_path, read_document};

/// Adjacency of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Documents this one references
    pub dependencies: BTreeSet<PathBuf>,
    /// Documents referencing this one
    pub dependents: BTreeSet<PathBuf>,
}

/// A document that could not be scanned while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphError {
    /// The document
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
}

/// Dependencies between the documents of one folder compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    /// Every document, with its adjacency
    pub nodes: BTreeMap<PathBuf, GraphNode>,
    /// Documents with no dependencies inside the set
    pub root_files: BTreeSet<PathBuf>,
    /// Documents that could not be read
    pub errors: Vec<GraphError>,
}

/// Options for [`build_dependency_graph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphOptions {
    /// Fallback extensions used when resolving references
    pub extensions: Vec<String>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        }
    }
}

/// Result of [`topological_sort`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologicalOrder {
    /// Documents in dependency-first order
    pub sorted: Vec<PathBuf>,
    /// Documents that could not be ordered because they sit on or behind a
    /// cycle, in path order
    pub cyclic_nodes: Vec<PathBuf>,
}

impl TopologicalOrder {
    /// Sorted documents followed by the cyclic ones.
    pub fn compile_order(&self) -> impl Iterator<Item = &PathBuf> {
        self.sorted.iter().chain(self.cyclic_nodes.iter())
    }
}

/// Build the graph over `paths` using the real file system.
pub fn build_dependency_graph(paths: &[PathBuf], options: &GraphOptions) -> DependencyGraph {
    build_dependency_graph_with(&OsFileSystem, paths, options)
}

/// Build the graph over `paths`.
///
/// Each document's references resolve against the document's own directory.
/// Unreadable documents stay in the graph without edges and are listed in
/// [`DependencyGraph::errors`].
pub fn build_dependency_graph_with(
    fs: &dyn FileSystem,
    paths: &[PathBuf],
    options: &GraphOptions,
) -> DependencyGraph {
    let mut graph = DependencyGraph::default();
    let documents: BTreeSet<PathBuf> = paths.iter().map(|p| normalize_path(p)).collect();

    for doc in &documents {
        graph.nodes.entry(doc.clone()).or_default();
    }

    for doc in &documents {
        let content = match read_document(fs, doc, "scanning references", "dependency_graph") {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Cannot scan {}: {}", doc.display(), e.source);
                graph.errors.push(GraphError {
                    path: doc.clone(),
                    message: e.user_message(),
                });
                continue;
            }
        };

        let base = doc.parent().map(Path::to_path_buf).unwrap_or_default();
        let resolve = ResolveOptions::new(base).with_extensions(&options.extensions);

        for reference in extract_references(strip_frontmatter(&content), &ExtractOptions::default())
        {
            let resolved = resolve_path_with(fs, &reference.target_path, &resolve);
            if !resolved.is_file() || !documents.contains(&resolved.absolute_path) {
                continue;
            }
            graph.add_edge(doc, &resolved.absolute_path);
        }
    }

    graph.root_files = graph
        .nodes
        .iter()
        .filter(|(_, node)| node.dependencies.is_empty())
        .map(|(path, _)| path.clone())
        .collect();

    tracing::debug!(
        "Built dependency graph: {} documents, {} edges, {} roots",
        graph.node_count(),
        graph.edge_count(),
        graph.root_files.len()
    );
    graph
}

impl DependencyGraph {
    fn add_edge(&mut self, from: &Path, to: &Path) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.dependencies.insert(to.to_path_buf());
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.dependents.insert(from.to_path_buf());
        }
    }

    /// Number of documents.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.dependencies.len()).sum()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Documents nothing else in the set references: where reading starts.
    pub fn entry_points(&self) -> Vec<PathBuf> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.dependents.is_empty())
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Build a human-readable dependency tree below `root`.
    ///
    /// Paths are shown relative to `base` where possible. A document already
    /// shown on the current branch is marked instead of expanded again.
    pub fn to_tree_string(&self, root: &Path, base: &Path) -> String {
        let mut result = String::new();
        result.push_str(&format!("{}\n", display_relative(root, base)));
        let mut branch = vec![root.to_path_buf()];
        self.build_tree_string(root, base, &mut result, "", &mut branch);
        result
    }

    fn build_tree_string(
        &self,
        node: &Path,
        base: &Path,
        result: &mut String,
        prefix: &str,
        branch: &mut Vec<PathBuf>,
    ) {
        let Some(entry) = self.nodes.get(node) else {
            return;
        };
        let deps: Vec<&PathBuf> = entry.dependencies.iter().collect();

        for (i, dep) in deps.iter().enumerate() {
            let is_last = i == deps.len() - 1;
            let connector = if is_last {
                "└── "
            } else {
                "├── "
            };
            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };

            if branch.contains(dep) {
                result.push_str(&format!(
                    "{}{}{} (circular reference)\n",
                    prefix,
                    connector,
                    display_relative(dep, base)
                ));
                continue;
            }

            result.push_str(&format!("{}{}{}\n", prefix, connector, display_relative(dep, base)));
            branch.push((*dep).clone());
            self.build_tree_string(dep, base, result, &child_prefix, branch);
            branch.pop();
        }
    }
}

/// Order documents so every document follows its dependencies.
///
/// Kahn's algorithm over intra-set edges. Among documents that become ready
/// at the same time the smallest path goes first, so the order is stable
/// across runs. Documents never reaching in-degree zero are returned in
/// `cyclic_nodes`.
pub fn topological_sort(graph: &DependencyGraph) -> TopologicalOrder {
    let mut in_degree: HashMap<&PathBuf, usize> =
        graph.nodes.iter().map(|(path, node)| (path, node.dependencies.len())).collect();

    let mut ready: BTreeSet<&PathBuf> =
        in_degree.iter().filter(|(_, d)| **d == 0).map(|(p, _)| *p).collect();
    let mut sorted = Vec::with_capacity(graph.nodes.len());

    while let Some(next) = ready.pop_first() {
        sorted.push(next.clone());
        if let Some(node) = graph.nodes.get(next) {
            for dependent in &node.dependents {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }
    }

    let placed: HashSet<&PathBuf> = sorted.iter().collect();
    let cyclic_nodes: Vec<PathBuf> =
        graph.nodes.keys().filter(|p| !placed.contains(p)).cloned().collect();

    if !cyclic_nodes.is_empty() {
        tracing::warn!("{} document(s) could not be ordered because of cycles", cyclic_nodes.len());
    }

    TopologicalOrder {
        sorted,
        cyclic_nodes,
    }
}

/// Every dependency cycle, each as its member paths in path order.
///
/// A cycle is a strongly connected component with more than one document, or a
/// document referencing itself.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<PathBuf>> {
    let mut digraph: DiGraph<&PathBuf, ()> = DiGraph::new();
    let mut index: HashMap<&PathBuf, NodeIndex> = HashMap::new();

    for path in graph.nodes.keys() {
        index.insert(path, digraph.add_node(path));
    }
    for (path, node) in &graph.nodes {
        for dep in &node.dependencies {
            if let (Some(&from), Some(&to)) = (index.get(path), index.get(dep)) {
                digraph.add_edge(from, to, ());
            }
        }
    }

    let mut cycles: Vec<Vec<PathBuf>> = tarjan_scc(&digraph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component.first().is_some_and(|&n| digraph.contains_edge(n, n))
        })
        .map(|component| {
            let mut members: Vec<PathBuf> =
                component.into_iter().map(|n| digraph[n].clone()).collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();
    cycles
}

/// `path` relative to `base`, or as-is when it lies elsewhere.
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
