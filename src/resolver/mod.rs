//! Reference resolution and document ordering.
//!
//! - [`path_resolver`] maps reference paths to absolute file system paths
//! - [`dependency_graph`] builds the document graph used by folder compilation
//!   and orders it dependencies-first

pub mod dependency_graph;
pub mod path_resolver;

pub use dependency_graph::{
    DependencyGraph, GraphError, GraphNode, GraphOptions, TopologicalOrder, build_dependency_graph,
    build_dependency_graph_with, find_cycles, topological_sort,
};
pub use path_resolver::{ResolveOptions, ResolvedPath, resolve_path, resolve_path_with};
