//! The recursive transclusion engine.
//!
//! Compiling a document replaces each resolvable `@path` reference with the
//! fully expanded target wrapped in a `<file path="...">` block:
//!
//! ```text
//! # Guide                          # Guide
//!                                  <file path="/docs/setup.md">
//! @./setup.md             ==>      ## Setup
//!                                  ...
//!                                  </file>
//! ```
//!
//! Each document is expanded once per run. Later references to a target that
//! is already inlined become the stub `<file path="..." />` unless duplicate
//! optimization is off. A reference to a document that is currently being
//! expanded (an ancestor) is circular: it is reported and left as written.
//!
//! References are processed front to back and every document is rebuilt as a
//! new buffer from kept text and replacements, so offsets taken from the
//! source stay valid throughout. Missing, directory, circular, unreadable and
//! too-deep references are reported on the result; they never abort the
//! compile. Only failing to read the top-level document is an error.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::session::{CompilationSession, ImportStats};
use crate::constants::{DEFAULT_EXTENSIONS, DEFAULT_MAX_DEPTH, WRAPPER_TAG};
use crate::core::AtrefError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::markdown::frontmatter::{FrontMatter, parse_frontmatter, strip_frontmatter};
use crate::markdown::headings::{
    HeadingContext, HeadingMode, HeadingOptions, adjust_headings, analyze_heading_context,
    normalize_headings,
};
use crate::markdown::reference_extractor::{ExtractOptions, Reference, extract_references};
use crate::resolver::path_resolver::{ResolveOptions, ResolvedPath, resolve_path_with};
use crate::utils::fs::{FileKind, FileSystem, OsFileSystem, absolutize, read_document};

/// Options for compiling one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Directory the root document's references resolve against; defaults to
    /// the document's own directory. Nested documents always resolve against
    /// their own directory.
    pub base_path: Option<PathBuf>,
    /// Suffixes probed when a reference path does not exist as written
    pub extensions: Vec<String>,
    /// Replace repeat imports with a stub
    pub optimize_duplicates: bool,
    /// How inlined headings are renumbered
    pub heading_mode: HeadingMode,
    /// Deepest nesting of inlined documents
    pub max_depth: usize,
    /// Report reference positions 1-indexed
    pub one_based_positions: bool,
    /// Write the compiled document here
    pub output: Option<PathBuf>,
    /// Overwrite the source document when no output is given
    pub write: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            base_path: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            optimize_duplicates: true,
            heading_mode: HeadingMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            one_based_positions: false,
            output: None,
            write: false,
        }
    }
}

impl CompileOptions {
    /// Resolve root references against `base`.
    #[must_use]
    pub fn with_base_path(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base.into());
        self
    }

    /// Replace the fallback extensions.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Toggle stub replacement of repeat imports.
    #[must_use]
    pub fn with_optimize_duplicates(mut self, optimize: bool) -> Self {
        self.optimize_duplicates = optimize;
        self
    }

    /// Select the heading mode.
    #[must_use]
    pub fn with_heading_mode(mut self, mode: HeadingMode) -> Self {
        self.heading_mode = mode;
        self
    }

    /// Limit nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Report 1-indexed positions.
    #[must_use]
    pub fn with_one_based_positions(mut self, one_based: bool) -> Self {
        self.one_based_positions = one_based;
        self
    }

    /// Write output to `path`.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Overwrite the source document.
    #[must_use]
    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }
}

/// Why a reference was not inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceIssue {
    /// Nothing exists at any probed path
    NotFound {
        /// Last path probed
        probed: PathBuf,
    },
    /// The target is a directory without an index document
    IsDirectory {
        /// The directory
        path: PathBuf,
    },
    /// The target is already being expanded further up the chain
    Circular {
        /// Ancestor chain ending with the repeated document
        chain: Vec<PathBuf>,
    },
    /// The target exists but could not be read
    ReadFailed {
        /// The target
        path: PathBuf,
        /// Underlying error
        message: String,
    },
    /// Inlining would nest deeper than allowed
    DepthExceeded {
        /// The configured limit
        limit: usize,
    },
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound {
                probed,
            } => write!(f, "File not found: {}", probed.display()),
            Self::IsDirectory {
                path,
            } => write!(f, "Path is a directory: {}", path.display()),
            Self::Circular {
                chain,
            } => {
                let chain: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
                write!(f, "Circular reference: {}", chain.join(" → "))
            }
            Self::ReadFailed {
                path,
                message,
            } => write!(f, "Failed to read {}: {}", path.display(), message),
            Self::DepthExceeded {
                limit,
            } => write!(f, "Maximum reference depth of {limit} exceeded"),
        }
    }
}

/// What happened to one reference during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledReference {
    /// The reference as extracted from its document
    pub reference: Reference,
    /// Where it resolved to
    pub resolved_path: ResolvedPath,
    /// Whether the reference resolved to a file
    pub found: bool,
    /// Expanded target content, when inlined in full
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Why the reference was not inlined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<ReferenceIssue>,
    /// The target is an ancestor of the document holding the reference
    pub circular: bool,
    /// Replaced by a stub because the target was already inlined
    pub stub: bool,
    /// Run-wide import count of the target after this reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_count: Option<usize>,
    /// Document holding the reference
    pub imported_from: PathBuf,
}

impl CompiledReference {
    /// Whether the reference failed to inline or stub.
    pub fn is_failure(&self) -> bool {
        self.issue.is_some()
    }
}

/// Result of compiling one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult {
    /// Path of the compiled document
    pub path: PathBuf,
    /// Fully expanded text, front matter removed
    #[serde(skip_serializing)]
    pub content: String,
    /// Every reference in the expansion, in document order, nested references
    /// following the reference that inlined them
    pub references: Vec<CompiledReference>,
    /// Run-wide import counts at the end of this compile
    pub stats: ImportStats,
    /// Front matter of the top-level document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<FrontMatter>,
    /// Number of headings clamped to the `1..=6` range
    pub heading_clamps: usize,
    /// Where the output was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl CompileResult {
    /// References that could not be inlined.
    pub fn failures(&self) -> impl Iterator<Item = &CompiledReference> {
        self.references.iter().filter(|r| r.is_failure())
    }

    /// Whether any reference failed.
    pub fn has_failures(&self) -> bool {
        self.references.iter().any(CompiledReference::is_failure)
    }
}

/// Compile a file on disk with a fresh session, writing output if requested.
///
/// # Errors
///
/// Fails when the document does not exist, is a directory or cannot be read,
/// or when writing the output fails.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<CompileResult> {
    compile_file_with(&OsFileSystem, path, options)
}

/// [`compile_file`] over any [`FileSystem`].
///
/// # Errors
///
/// See [`compile_file`].
pub fn compile_file_with(
    fs: &dyn FileSystem,
    path: &Path,
    options: &CompileOptions,
) -> Result<CompileResult> {
    let mut session = CompilationSession::new();
    let mut result = compile_document(fs, path, options, &mut session)?;

    let target = match (&options.output, options.write) {
        (Some(output), _) => Some(output.clone()),
        (None, true) => Some(result.path.clone()),
        (None, false) => None,
    };
    if let Some(target) = target {
        fs.write(&target, &result.content).with_file_context(
            FileOperation::Write,
            &target,
            "writing compiled output",
            "compiler::engine",
        )?;
        tracing::debug!("Wrote {}", target.display());
        result.output_path = Some(target);
    }
    Ok(result)
}

/// Compile one document within an existing session. Nothing is written.
///
/// # Errors
///
/// Fails when the document does not exist, is a directory or cannot be read.
pub fn compile_document(
    fs: &dyn FileSystem,
    path: &Path,
    options: &CompileOptions,
    session: &mut CompilationSession,
) -> Result<CompileResult> {
    let path = absolutize(path).with_file_context(
        FileOperation::Metadata,
        path,
        "locating document",
        "compiler::engine",
    )?;

    match fs.kind(&path) {
        Some(FileKind::File) => {}
        Some(FileKind::Directory) => {
            return Err(AtrefError::DocumentIsDirectory {
                path: path.display().to_string(),
            }
            .into());
        }
        None => {
            return Err(AtrefError::DocumentNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
    }

    let text = read_document(fs, &path, "compiling document", "compiler::engine")?;
    Ok(compile_content_with(fs, &text, &path, options, session))
}

/// Compile text that claims to live at `file_path`, against the real disk.
pub fn compile_content(
    text: &str,
    file_path: &Path,
    options: &CompileOptions,
    session: &mut CompilationSession,
) -> CompileResult {
    compile_content_with(&OsFileSystem, text, file_path, options, session)
}

/// Compile in-memory text that claims to live at `file_path`.
///
/// Editors use this for unsaved buffers: `file_path` anchors relative
/// references and takes part in cycle detection, but is never read.
pub fn compile_content_with(
    fs: &dyn FileSystem,
    text: &str,
    file_path: &Path,
    options: &CompileOptions,
    session: &mut CompilationSession,
) -> CompileResult {
    let file = absolutize(file_path).unwrap_or_else(|_| file_path.to_path_buf());
    let base = match &options.base_path {
        Some(base) => absolutize(base).unwrap_or_else(|_| base.clone()),
        None => file.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    tracing::debug!("Compiling {}", file.display());

    let mut engine = Engine {
        fs,
        options,
        extract: ExtractOptions::default().with_one_based(options.one_based_positions),
        heading_clamps: 0,
    };
    let mut ancestors = vec![file.clone()];
    let expansion =
        engine.expand(session, strip_frontmatter(text), &file, &base, &mut ancestors);

    CompileResult {
        path: file,
        content: expansion.content,
        references: expansion.references,
        stats: session.stats(),
        front_matter: parse_frontmatter(text),
        heading_clamps: engine.heading_clamps,
        output_path: None,
    }
}

/// Markup for a fully inlined document.
#[must_use]
pub fn wrap_content(path: &Path, content: &str) -> String {
    format!(
        "<{tag} path=\"{}\">\n{}\n</{tag}>",
        path.display(),
        content.trim_end_matches(['\n', '\r']),
        tag = WRAPPER_TAG
    )
}

/// Markup for a repeat import.
#[must_use]
pub fn stub_markup(path: &Path) -> String {
    format!("<{WRAPPER_TAG} path=\"{}\" />", path.display())
}

struct Engine<'a> {
    fs: &'a dyn FileSystem,
    options: &'a CompileOptions,
    extract: ExtractOptions,
    heading_clamps: usize,
}

struct Expansion {
    content: String,
    references: Vec<CompiledReference>,
}

struct Outcome {
    replacement: Option<String>,
    record: CompiledReference,
    nested: Vec<CompiledReference>,
}

impl Outcome {
    fn unchanged(record: CompiledReference) -> Self {
        Self {
            replacement: None,
            record,
            nested: Vec::new(),
        }
    }
}

impl Engine<'_> {
    fn expand(
        &mut self,
        session: &mut CompilationSession,
        text: &str,
        file: &Path,
        base: &Path,
        ancestors: &mut Vec<PathBuf>,
    ) -> Expansion {
        let refs = extract_references(text, &self.extract);
        if refs.is_empty() {
            return Expansion {
                content: text.to_string(),
                references: Vec::new(),
            };
        }

        let contexts = analyze_heading_context(
            text,
            &refs,
            &HeadingOptions::default().with_exclude_wrapped(true),
        );
        let resolve = ResolveOptions::new(base).with_extensions(&self.options.extensions);

        let mut content = String::with_capacity(text.len());
        let mut records = Vec::with_capacity(refs.len());
        let mut last = 0;

        for reference in refs {
            content.push_str(&text[last..reference.start_offset]);
            last = reference.start_offset;

            let resolved = resolve_path_with(self.fs, &reference.target_path, &resolve);
            let context = contexts.get(&reference.start_offset).copied().unwrap_or_default();
            let outcome =
                self.expand_reference(session, reference, resolved, context, file, ancestors);

            if let Some(replacement) = outcome.replacement {
                content.push_str(&replacement);
                last = outcome.record.reference.end_offset;
            }
            records.push(outcome.record);
            records.extend(outcome.nested);
        }
        content.push_str(&text[last..]);

        Expansion {
            content,
            references: records,
        }
    }

    fn expand_reference(
        &mut self,
        session: &mut CompilationSession,
        reference: Reference,
        resolved: ResolvedPath,
        context: HeadingContext,
        file: &Path,
        ancestors: &mut Vec<PathBuf>,
    ) -> Outcome {
        let path = resolved.absolute_path.clone();
        let mut record = CompiledReference {
            found: resolved.is_file(),
            reference,
            resolved_path: resolved,
            content: None,
            issue: None,
            circular: false,
            stub: false,
            import_count: None,
            imported_from: file.to_path_buf(),
        };

        if !record.resolved_path.exists {
            tracing::debug!("Unresolved reference {} in {}", record.reference.raw, file.display());
            record.issue = Some(ReferenceIssue::NotFound {
                probed: path,
            });
            return Outcome::unchanged(record);
        }
        if record.resolved_path.is_directory {
            record.issue = Some(ReferenceIssue::IsDirectory {
                path,
            });
            return Outcome::unchanged(record);
        }
        if ancestors.contains(&path) {
            tracing::debug!("Circular reference to {} from {}", path.display(), file.display());
            let mut chain = ancestors.clone();
            chain.push(path);
            record.circular = true;
            record.issue = Some(ReferenceIssue::Circular {
                chain,
            });
            return Outcome::unchanged(record);
        }
        if ancestors.len() > self.options.max_depth {
            tracing::warn!(
                "Not inlining {} from {}: depth limit {} reached",
                path.display(),
                file.display(),
                self.options.max_depth
            );
            record.issue = Some(ReferenceIssue::DepthExceeded {
                limit: self.options.max_depth,
            });
            return Outcome::unchanged(record);
        }

        let count = session.record_import(&path);
        record.import_count = Some(count);

        // Only a target already inlined in full somewhere in the run is stubbed
        if self.options.optimize_duplicates && session.has_imported(&path) {
            tracing::trace!("Stubbing repeat import of {} (#{})", path.display(), count);
            record.stub = true;
            return Outcome {
                replacement: Some(stub_markup(&path)),
                record,
                nested: Vec::new(),
            };
        }

        let source = match read_document(self.fs, &path, "inlining reference", "compiler::engine")
        {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e.source);
                record.issue = Some(ReferenceIssue::ReadFailed {
                    message: e.source.to_string(),
                    path,
                });
                return Outcome::unchanged(record);
            }
        };

        session.mark_imported(&path);

        let child_base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        ancestors.push(path.clone());
        let child = self.expand(session, strip_frontmatter(&source), &path, &child_base, ancestors);
        ancestors.pop();

        let adjusted = match self.options.heading_mode {
            HeadingMode::Normalize => normalize_headings(
                &child.content,
                context.context_level.saturating_add(1),
                &HeadingOptions::default(),
            ),
            HeadingMode::Additive => {
                adjust_headings(&child.content, context.shift_amount, &HeadingOptions::default())
            }
        };
        self.heading_clamps += adjusted.clamped;

        let replacement = wrap_content(&path, &adjusted.content);
        record.content = Some(adjusted.content);
        Outcome {
            replacement: Some(replacement),
            record,
            nested: child.references,
        }
    }
}
