//! Markdown scanning: references, headings, code spans and front matter.
//!
//! Nothing here parses markdown into a tree. Documents are scanned as text and
//! every result carries byte offsets into the text it was computed from, so the
//! compiler can rebuild a document from segments without re-scanning.
//!
//! - [`reference_extractor`] - `@path` references with positions
//! - [`headings`] - ATX heading extraction, context analysis and level shifting
//! - [`spans`] - code blocks, inline code and compiled wrapper blocks to skip
//! - [`frontmatter`] - leading YAML metadata
//!
//! Document discovery for folder compilation lives here too:
//!
//! ```rust
//! use atref_cli::markdown::{is_markdown_file, list_markdown_files};
//! use atref_cli::utils::fs::MemoryFileSystem;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let fs = MemoryFileSystem::new()
//!     .with_file("/docs/a.md", "# A")
//!     .with_file("/docs/drafts/b.md", "# B")
//!     .with_file("/docs/logo.png", "");
//!
//! assert!(is_markdown_file(Path::new("README.MD")));
//! let files = list_markdown_files(&fs, Path::new("/docs"), &["drafts/**".to_string()])?;
//! assert_eq!(files.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod frontmatter;
pub mod headings;
pub mod reference_extractor;
pub mod spans;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::constants::MARKDOWN_EXTENSIONS;
use crate::core::AtrefError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::utils::fs::FileSystem;

pub use frontmatter::{FrontMatter, parse_frontmatter, strip_frontmatter};
pub use headings::{Heading, HeadingContext, HeadingMode, HeadingOptions};
pub use reference_extractor::{ExtractOptions, Reference, extract_references};

/// Check if a path has a markdown extension (`.md` or `.markdown`, any case).
#[must_use]
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

/// Recursively find markdown files below `dir`, sorted by path.
///
/// `exclude` holds glob patterns matched against the path relative to `dir`
/// (`drafts/**`, `*.tmp.md`).
///
/// # Errors
///
/// Fails when an exclude pattern is not a valid glob or `dir` cannot be listed.
pub fn list_markdown_files(
    fs: &dyn FileSystem,
    dir: &Path,
    exclude: &[String],
) -> Result<Vec<PathBuf>> {
    let patterns = exclude
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| AtrefError::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let files = fs.list_files(dir).with_file_context(
        FileOperation::ListDir,
        dir,
        "discovering markdown documents",
        "markdown::list_markdown_files",
    )?;

    let mut docs: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| is_markdown_file(path))
        .filter(|path| {
            let relative = path.strip_prefix(dir).unwrap_or(path);
            let excluded = patterns.iter().any(|p| p.matches_path(relative));
            if excluded {
                tracing::debug!("Excluding {} from folder compilation", path.display());
            }
            !excluded
        })
        .collect();
    docs.sort();
    Ok(docs)
}
