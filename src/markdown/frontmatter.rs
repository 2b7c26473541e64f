//! Leading YAML front matter.
//!
//! Only a block at the very start of a document counts: a `---` line, the
//! metadata, and a closing `---` line. Compiled output never carries front
//! matter, but the root document's metadata is parsed and reported so editor
//! integrations can show it.
//!
//! # Example
//!
//! ```rust
//! use atref_cli::markdown::frontmatter::{parse_frontmatter, strip_frontmatter};
//!
//! let doc = "---\ntitle: Guide\n---\n# Guide\n";
//! assert_eq!(strip_frontmatter(doc), "# Guide\n");
//!
//! let fm = parse_frontmatter(doc).unwrap();
//! assert_eq!(fm.raw, "title: Guide\n");
//! ```

use gray_matter::{Matter, engine::YAML};
use serde::Serialize;

/// Byte boundaries of the front matter block, delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterBoundaries {
    /// Byte position of the opening `---` (always 0)
    pub start: usize,
    /// Byte position just past the closing `---` line and its newline
    pub end: usize,
}

/// Front matter found at the top of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    /// Text between the delimiters
    pub raw: String,
    /// Parsed YAML, `None` when the block is empty or not valid YAML
    pub data: Option<serde_yaml::Value>,
}

/// Locate a leading front matter block.
#[must_use]
pub fn frontmatter_boundaries(content: &str) -> Option<FrontmatterBoundaries> {
    let first_line_end = content.find('\n')?;
    if content[..first_line_end].trim_end_matches('\r') != "---" {
        return None;
    }

    let mut pos = first_line_end + 1;
    loop {
        let line_end = content[pos..].find('\n').map(|i| pos + i);
        let line = &content[pos..line_end.unwrap_or(content.len())];
        if line.trim_end_matches('\r') == "---" {
            return Some(FrontmatterBoundaries {
                start: 0,
                end: line_end.map_or(content.len(), |e| e + 1),
            });
        }
        match line_end {
            Some(e) => pos = e + 1,
            None => return None,
        }
    }
}

/// The document with any leading front matter removed.
///
/// Text without a front matter block is returned unchanged.
#[must_use]
pub fn strip_frontmatter(content: &str) -> &str {
    frontmatter_boundaries(content).map_or(content, |b| &content[b.end..])
}

/// Extract and parse leading front matter.
///
/// Malformed YAML is not an error: the raw text is still returned and the
/// problem is logged.
#[must_use]
pub fn parse_frontmatter(content: &str) -> Option<FrontMatter> {
    let bounds = frontmatter_boundaries(content)?;
    let block = &content[bounds.start..bounds.end];

    let inner_start = block.find('\n').map_or(block.len(), |i| i + 1);
    let closing_start =
        block.trim_end_matches(['\n', '\r']).rfind('\n').map_or(inner_start, |i| i + 1);
    let raw = block[inner_start..closing_start.max(inner_start)].to_string();

    let matter = Matter::<YAML>::new();
    let data = match matter.parse::<serde_yaml::Value>(block) {
        Ok(parsed) => parsed.data,
        Err(e) => {
            tracing::warn!("Unable to parse YAML front matter, continuing without metadata: {}", e);
            None
        }
    };

    Some(FrontMatter {
        raw,
        data,
    })
}
