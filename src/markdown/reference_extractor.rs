//! `@path` reference extraction for markdown documents.
//!
//! A reference is an `@` followed by a path token. The `@` must sit at the
//! start of the text, after whitespace, or after an opening bracket, paren or
//! brace:
//!
//! ```text
//! See @./guide.md for details.
//! (@docs/api/index.md)
//! @../shared/style
//! ```
//!
//! # Extraction Rules
//!
//! A candidate is rejected when:
//! - it lies inside a fenced code block or an inline code span
//! - the `@` follows a word character, as in `admin@example.com`
//! - the path has neither a `/` nor an extension-like suffix, so bare
//!   decorations such as `@everyone` are left alone
//!
//! Trailing sentence punctuation is not part of the path: `@notes.md.` yields
//! `notes.md`.
//!
//! # Usage
//!
//! ```rust
//! use atref_cli::markdown::reference_extractor::{ExtractOptions, extract_references};
//!
//! let text = "Intro\n\nSee @./docs/guide.md and mail admin@example.com.\n";
//! let refs = extract_references(text, &ExtractOptions::default());
//!
//! assert_eq!(refs.len(), 1);
//! assert_eq!(refs[0].target_path, "./docs/guide.md");
//! assert_eq!(refs[0].line, 2);
//! assert_eq!(refs[0].column, 4);
//! ```

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::spans::code_spans;

static REFERENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(\[{])@((?:\.{0,2}/)?[\w\-./]+)").ok());

static EXTENSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]+$").ok());

/// One `@path` occurrence in a document.
///
/// Offsets are byte offsets into the text the reference was extracted from:
/// `start_offset` points at the `@`, `end_offset` one past the last path byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// The matched text, `@` included
    pub raw: String,
    /// The path as written, without the `@`
    pub target_path: String,
    /// Byte offset of the `@`
    pub start_offset: usize,
    /// Byte offset one past the end of the path
    pub end_offset: usize,
    /// Line of the `@`
    pub line: usize,
    /// Column of the `@`, counted in characters
    pub column: usize,
}

/// Options for [`extract_references`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Report lines and columns starting at 1 instead of 0
    pub one_based: bool,
}

impl ExtractOptions {
    /// Select 1-indexed positions.
    #[must_use]
    pub fn with_one_based(mut self, one_based: bool) -> Self {
        self.one_based = one_based;
        self
    }
}

/// Extract every reference from `text`, in source order.
///
/// Pure and deterministic: the same text always yields the same list.
#[must_use]
pub fn extract_references(text: &str, options: &ExtractOptions) -> Vec<Reference> {
    let Some(pattern) = REFERENCE.as_ref() else {
        return Vec::new();
    };

    let code = code_spans(text);
    let lines = LineIndex::new(text);
    let mut references = Vec::new();

    for caps in pattern.captures_iter(text) {
        let Some(path_match) = caps.get(1) else {
            continue;
        };
        let at = path_match.start() - 1;

        if code.contains(at) {
            tracing::trace!("Skipping @ reference inside code at byte {}", at);
            continue;
        }

        let target = path_match.as_str().trim_end_matches('.');
        if !is_path_like(target) {
            continue;
        }

        let end_offset = path_match.start() + target.len();
        let (line, column) = lines.position(text, at);
        let base = usize::from(options.one_based);

        references.push(Reference {
            raw: text[at..end_offset].to_string(),
            target_path: target.to_string(),
            start_offset: at,
            end_offset,
            line: line + base,
            column: column + base,
        });
    }

    references
}

/// Whether a path token carries path semantics.
///
/// It must contain a `/` or end in an extension-like suffix.
#[must_use]
pub fn is_path_like(target: &str) -> bool {
    if target.is_empty() {
        return false;
    }
    if target.contains('/') {
        return true;
    }
    EXTENSION.as_ref().is_some_and(|re| re.is_match(target))
}

/// Byte offsets of every line start, for offset to line/column conversion.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            starts,
        }
    }

    /// Zero-based line and character column of a byte offset.
    fn position(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&s| s <= offset).saturating_sub(1);
        let column = text[self.starts[line]..offset].chars().count();
        (line, column)
    }
}
