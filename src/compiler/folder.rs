//! Folder compilation.
//!
//! Every markdown document below a directory is compiled in dependency order
//! with one [`CompilationSession`] shared by the whole run, so a document
//! referenced from several places is inlined in full once and stubbed
//! everywhere after. Documents caught in a dependency cycle are compiled after
//! the ordered ones and flagged.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::engine::{CompileOptions, CompileResult, compile_document};
use super::session::{CompilationSession, ImportStats};
use crate::core::AtrefError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::markdown::list_markdown_files;
use crate::resolver::dependency_graph::{
    GraphError, GraphOptions, build_dependency_graph_with, find_cycles, topological_sort,
};
use crate::utils::fs::{FileKind, FileSystem, OsFileSystem, absolutize};

/// Options for [`compile_folder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderCompileOptions {
    /// Per-document options; `base_path`, `output` and `write` are ignored
    pub compile: CompileOptions,
    /// Mirror compiled documents into this directory
    pub output_dir: Option<PathBuf>,
    /// Glob patterns, relative to the folder, of documents to skip
    pub exclude: Vec<String>,
    /// Overwrite documents in place when no output directory is given
    pub write: bool,
}

impl FolderCompileOptions {
    /// Use `compile` for every document.
    #[must_use]
    pub fn with_compile_options(mut self, compile: CompileOptions) -> Self {
        self.compile = compile;
        self
    }

    /// Write compiled documents below `dir`.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Skip documents matching these globs.
    #[must_use]
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Overwrite documents in place.
    #[must_use]
    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }
}

/// Outcome for one document of a folder run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResult {
    /// The document
    pub path: PathBuf,
    /// Compilation result, when the document could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CompileResult>,
    /// Why the document failed as a whole
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the document sits on or behind a dependency cycle
    pub cyclic: bool,
}

/// Result of a folder run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FolderCompileResult {
    /// The compiled folder
    pub root: PathBuf,
    /// Per-document outcomes, in compile order
    pub documents: Vec<DocumentResult>,
    /// Documents that could not be ordered because of cycles
    pub cyclic: Vec<PathBuf>,
    /// Dependency cycles between documents
    pub cycles: Vec<Vec<PathBuf>>,
    /// Documents that could not be scanned while ordering
    pub graph_errors: Vec<GraphError>,
    /// Number of documents compiled
    pub total_documents: usize,
    /// References seen across all documents
    pub total_references: usize,
    /// Failed references plus documents that failed as a whole
    pub total_failures: usize,
    /// Targets reported as circular anywhere in the run
    pub circular_paths: BTreeSet<PathBuf>,
    /// Import counts for the whole run
    pub stats: ImportStats,
    /// Files written
    pub written: Vec<PathBuf>,
}

impl FolderCompileResult {
    /// Whether any reference or document failed.
    pub fn has_failures(&self) -> bool {
        self.total_failures > 0
    }

    /// Compile order, as paths.
    pub fn order(&self) -> Vec<&Path> {
        self.documents.iter().map(|d| d.path.as_path()).collect()
    }
}

/// Progress notifications from [`compile_folder_with`].
pub trait FolderObserver {
    /// Called once the document set is known.
    fn on_start(&mut self, _total: usize) {}
    /// Called after each document.
    fn on_document(&mut self, _path: &Path) {}
    /// Called when the run is over.
    fn on_finish(&mut self) {}
}

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FolderObserver for NoopObserver {}

/// Compile a folder on disk.
///
/// # Errors
///
/// Fails when `dir` is not a directory, an exclude pattern is invalid, or the
/// folder cannot be listed.
pub fn compile_folder(dir: &Path, options: &FolderCompileOptions) -> Result<FolderCompileResult> {
    compile_folder_with(&OsFileSystem, dir, options, &mut NoopObserver)
}

/// [`compile_folder`] over any [`FileSystem`], reporting progress.
///
/// # Errors
///
/// See [`compile_folder`].
pub fn compile_folder_with(
    fs: &dyn FileSystem,
    dir: &Path,
    options: &FolderCompileOptions,
    observer: &mut dyn FolderObserver,
) -> Result<FolderCompileResult> {
    let root = absolutize(dir).with_file_context(
        FileOperation::Metadata,
        dir,
        "locating folder",
        "compiler::folder",
    )?;
    if fs.kind(&root) != Some(FileKind::Directory) {
        return Err(AtrefError::NotADirectory {
            path: root.display().to_string(),
        }
        .into());
    }

    let documents = list_markdown_files(fs, &root, &options.exclude)?;
    let graph = build_dependency_graph_with(
        fs,
        &documents,
        &GraphOptions {
            extensions: options.compile.extensions.clone(),
        },
    );
    let order = topological_sort(&graph);
    let cycles = find_cycles(&graph);
    for cycle in &cycles {
        let members: Vec<String> = cycle.iter().map(|p| p.display().to_string()).collect();
        tracing::warn!("Dependency cycle between documents: {}", members.join(", "));
    }

    let per_document = CompileOptions {
        base_path: None,
        output: None,
        write: false,
        ..options.compile.clone()
    };

    observer.on_start(documents.len());
    let mut session = CompilationSession::new();
    let mut result = FolderCompileResult {
        root: root.clone(),
        cyclic: order.cyclic_nodes.clone(),
        cycles,
        graph_errors: graph.errors.clone(),
        ..FolderCompileResult::default()
    };

    for path in order.compile_order() {
        let cyclic = order.cyclic_nodes.contains(path);
        let outcome = match compile_document(fs, path, &per_document, &mut session) {
            Ok(compiled) => DocumentResult {
                path: path.clone(),
                result: Some(compiled),
                error: None,
                cyclic,
            },
            Err(e) => {
                tracing::warn!("Failed to compile {}: {:#}", path.display(), e);
                DocumentResult {
                    path: path.clone(),
                    result: None,
                    error: Some(format!("{e:#}")),
                    cyclic,
                }
            }
        };
        result.documents.push(outcome);
        observer.on_document(path);
    }

    write_outputs(fs, &root, options, &mut result);

    for doc in &result.documents {
        match &doc.result {
            Some(compiled) => {
                result.total_references += compiled.references.len();
                result.total_failures += compiled.failures().count();
                result.circular_paths.extend(
                    compiled
                        .references
                        .iter()
                        .filter(|r| r.circular)
                        .map(|r| r.resolved_path.absolute_path.clone()),
                );
            }
            None => result.total_failures += 1,
        }
    }
    result.total_documents = result.documents.len();
    result.stats = session.stats();

    observer.on_finish();
    tracing::debug!(
        "Compiled {} documents, {} references, {} failures",
        result.total_documents,
        result.total_references,
        result.total_failures
    );
    Ok(result)
}

/// Write compiled documents once the whole run is done, so no document is
/// read back after being overwritten.
fn write_outputs(
    fs: &dyn FileSystem,
    root: &Path,
    options: &FolderCompileOptions,
    result: &mut FolderCompileResult,
) {
    if options.output_dir.is_none() && !options.write {
        return;
    }

    let output_dir =
        options.output_dir.as_ref().map(|d| absolutize(d).unwrap_or_else(|_| d.clone()));
    let mut written = Vec::new();

    for doc in &mut result.documents {
        let Some(compiled) = doc.result.as_mut() else {
            continue;
        };
        let target = match &output_dir {
            Some(out) => out.join(doc.path.strip_prefix(root).unwrap_or(&doc.path)),
            None => doc.path.clone(),
        };
        match fs.write(&target, &compiled.content) {
            Ok(()) => {
                compiled.output_path = Some(target.clone());
                written.push(target);
            }
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", target.display(), e);
                doc.error = Some(format!("Failed to write {}: {}", target.display(), e));
            }
        }
    }
    result.written = written;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fs::MemoryFileSystem;

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    fn compile_d(fs: &MemoryFileSystem, options: &FolderCompileOptions) -> FolderCompileResult {
        compile_folder_with(fs, Path::new("/d"), options, &mut NoopObserver).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        total: usize,
        seen: Vec<PathBuf>,
        finished: bool,
    }

    impl FolderObserver for Recorder {
        fn on_start(&mut self, total: usize) {
            self.total = total;
        }
        fn on_document(&mut self, path: &Path) {
            self.seen.push(path.to_path_buf());
        }
        fn on_finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_dependency_order() {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "# A\n@./b.md\n")
            .with_file("/d/b.md", "# B\n@./c.md\n")
            .with_file("/d/c.md", "# C\n");

        let mut recorder = Recorder::default();
        let options = FolderCompileOptions::default();
        let result = compile_folder_with(&fs, Path::new("/d"), &options, &mut recorder).unwrap();

        assert_eq!(
            result.order(),
            vec![Path::new("/d/c.md"), Path::new("/d/b.md"), Path::new("/d/a.md")]
        );
        assert_eq!(recorder.total, 3);
        assert_eq!(recorder.seen.len(), 3);
        assert!(recorder.finished);
        assert_eq!(result.total_documents, 3);
        assert_eq!(result.total_references, 3);
        assert!(!result.has_failures());
    }

    #[test]
    fn test_dedup_spans_documents() {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "A\n@./common.md\n")
            .with_file("/d/b.md", "B\n@./common.md\n")
            .with_file("/d/common.md", "shared body\n");

        let result = compile_d(&fs, &FolderCompileOptions::default());

        let content = |path: &str| {
            result
                .documents
                .iter()
                .find(|d| d.path == p(path))
                .and_then(|d| d.result.as_ref())
                .map(|r| r.content.clone())
                .unwrap()
        };
        assert!(content("/d/a.md").contains("shared body"));
        assert_eq!(content("/d/b.md"), "B\n<file path=\"/d/common.md\" />\n");
        assert_eq!(content("/d/common.md"), "shared body\n");
        assert_eq!(result.stats.counts[&p("/d/common.md")], 2);
    }

    #[test]
    fn test_dedup_off_inlines_everywhere() {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "@./common.md\n")
            .with_file("/d/b.md", "@./common.md\n")
            .with_file("/d/common.md", "shared body\n");
        let options = FolderCompileOptions::default()
            .with_compile_options(CompileOptions::default().with_optimize_duplicates(false));

        let result = compile_d(&fs, &options);
        let inlined = result
            .documents
            .iter()
            .filter_map(|d| d.result.as_ref())
            .filter(|r| r.content.contains("<file path=\"/d/common.md\">"))
            .count();
        assert_eq!(inlined, 2);
    }

    #[test]
    fn test_cycles_are_flagged_and_still_compiled() {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "A\n@./b.md\n")
            .with_file("/d/b.md", "B\n@./a.md\n")
            .with_file("/d/z.md", "Z\n");

        let result = compile_d(&fs, &FolderCompileOptions::default());

        assert_eq!(
            result.order(),
            vec![Path::new("/d/z.md"), Path::new("/d/a.md"), Path::new("/d/b.md")]
        );
        assert_eq!(result.cyclic, vec![p("/d/a.md"), p("/d/b.md")]);
        assert_eq!(result.cycles, vec![vec![p("/d/a.md"), p("/d/b.md")]]);
        assert!(result.documents[1].cyclic);
        assert!(result.documents[1].result.is_some());
        // a.md's compile closes the loop at a.md, b.md's compile at b.md
        assert_eq!(result.circular_paths, BTreeSet::from([p("/d/a.md"), p("/d/b.md")]));
        assert!(result.has_failures());
    }

    #[test]
    fn test_output_dir_mirrors_layout() {
        let fs = MemoryFileSystem::new()
            .with_file("/d/index.md", "@./guide/intro.md\n")
            .with_file("/d/guide/intro.md", "intro\n");
        let options = FolderCompileOptions::default().with_output_dir("/out");

        let result = compile_d(&fs, &options);
        assert_eq!(result.written.len(), 2);
        assert!(fs.get("/out/index.md").unwrap().contains("intro"));
        assert_eq!(fs.get("/out/guide/intro.md").as_deref(), Some("intro\n"));
        assert_eq!(fs.get("/d/index.md").as_deref(), Some("@./guide/intro.md\n"));
    }

    #[test]
    fn test_write_in_place_after_run() {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "@./b.md\n")
            .with_file("/d/b.md", "@./c.md\n")
            .with_file("/d/c.md", "leaf\n");
        let options = FolderCompileOptions::default().with_write(true);

        compile_d(&fs, &options);
        let b = fs.get("/d/b.md").unwrap();
        assert!(b.contains("<file path=\"/d/c.md\">"));
        assert_eq!(b.matches("<file path=\"/d/b.md\"").count(), 0);
    }

    #[test]
    fn test_excludes_and_not_a_directory() {
        let fs = MemoryFileSystem::new()
            .with_file("/d/a.md", "A\n")
            .with_file("/d/drafts/x.md", "X\n");
        let options = FolderCompileOptions::default().with_exclude(vec!["drafts/**".into()]);
        let result = compile_d(&fs, &options);
        assert_eq!(result.total_documents, 1);

        let err = compile_folder_with(&fs, Path::new("/d/a.md"), &options, &mut NoopObserver)
            .unwrap_err();
        assert!(err.to_string().contains("Not a directory"));
    }
}
