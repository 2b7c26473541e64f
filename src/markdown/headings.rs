//! ATX heading analysis and level shifting.
//!
//! When a document is inlined under a heading, its own headings are renumbered
//! so they nest below that heading. Two modes exist:
//!
//! - [`HeadingMode::Normalize`] (default): the inlined document's first heading
//!   becomes one level deeper than the heading in effect at the reference, and
//!   every other heading keeps its distance to that first heading.
//! - [`HeadingMode::Additive`]: the context level is added to every heading,
//!   whatever level the inlined document starts at.
//!
//! Levels are clamped to `1..=6`. Clamping is reported, never an error.
//!
//! ```rust
//! use atref_cli::markdown::headings::{HeadingOptions, normalize_headings};
//!
//! let child = "## Commander\n\n### Usage\n\n#### Example\n";
//! let adjusted = normalize_headings(child, 3, &HeadingOptions::default());
//! assert_eq!(adjusted.content, "### Commander\n\n#### Usage\n\n##### Example\n");
//! assert_eq!(adjusted.clamped, 0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::reference_extractor::Reference;
use super::spans::{SpanSet, code_spans, wrapper_spans};
use crate::constants::{MAX_HEADING_LEVEL, MIN_HEADING_LEVEL};

/// How inlined headings are renumbered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HeadingMode {
    /// Re-base the inlined document on the context level
    #[default]
    Normalize,
    /// Add the context level to every inlined heading
    Additive,
}

/// One ATX heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Level, 1 to 6
    pub level: u8,
    /// Byte offset of the first `#`
    pub offset: usize,
    /// Zero-based line number
    pub line: usize,
    /// Heading text without the markers
    pub text: String,
}

/// Heading depth in effect at a reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingContext {
    /// Level of the nearest heading before the reference, 0 when none
    pub context_level: u8,
    /// Amount added to inlined headings in additive mode
    pub shift_amount: i32,
}

/// Options for heading extraction and adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingOptions {
    /// Leave headings inside `<file path="...">` blocks alone
    pub exclude_wrapped: bool,
}

impl HeadingOptions {
    /// Skip headings inside compiled wrapper blocks.
    #[must_use]
    pub fn with_exclude_wrapped(mut self, exclude: bool) -> Self {
        self.exclude_wrapped = exclude;
        self
    }

    fn excluded(&self, text: &str) -> SpanSet {
        let code = code_spans(text);
        if self.exclude_wrapped {
            code.union(&wrapper_spans(text))
        } else {
            code
        }
    }
}

/// Result of shifting heading levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedHeadings {
    /// The rewritten text
    pub content: String,
    /// Headings whose shifted level fell outside `1..=6`
    pub clamped: usize,
}

/// Every ATX heading outside code (and, optionally, wrapper blocks), in order.
#[must_use]
pub fn extract_headings(text: &str, options: &HeadingOptions) -> Vec<Heading> {
    let excluded = options.excluded(text);
    let mut headings = Vec::new();
    let mut offset = 0;

    for (line_no, line) in text.split('\n').enumerate() {
        if let Some((level, rest)) = parse_atx(line) {
            if !excluded.contains(offset) {
                headings.push(Heading {
                    level,
                    offset,
                    line: line_no,
                    text: rest.trim().trim_end_matches('#').trim_end().to_string(),
                });
            }
        }
        offset += line.len() + 1;
    }
    headings
}

/// Split a line into heading level and remaining text.
fn parse_atx(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > usize::from(MAX_HEADING_LEVEL) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    u8::try_from(hashes).ok().map(|level| (level, rest))
}

/// Heading context for each reference, keyed by the reference's start offset.
///
/// The context level is the level of the nearest heading strictly before the
/// reference in `text`, or 0.
#[must_use]
pub fn analyze_heading_context(
    text: &str,
    references: &[Reference],
    options: &HeadingOptions,
) -> HashMap<usize, HeadingContext> {
    let headings = extract_headings(text, options);

    references
        .iter()
        .map(|reference| {
            let idx = headings.partition_point(|h| h.offset < reference.start_offset);
            let context_level = idx.checked_sub(1).map_or(0, |i| headings[i].level);
            (
                reference.start_offset,
                HeadingContext {
                    context_level,
                    shift_amount: i32::from(context_level),
                },
            )
        })
        .collect()
}

/// Add `shift` to every heading level, clamping to `1..=6`.
#[must_use]
pub fn adjust_headings(text: &str, shift: i32, options: &HeadingOptions) -> AdjustedHeadings {
    if shift == 0 {
        return AdjustedHeadings {
            content: text.to_string(),
            clamped: 0,
        };
    }

    let mut content = String::with_capacity(text.len() + 64);
    let mut clamped = 0;
    let mut last = 0;

    for heading in extract_headings(text, options) {
        let wanted = i32::from(heading.level) + shift;
        let level = wanted.clamp(MIN_HEADING_LEVEL as i32, MAX_HEADING_LEVEL as i32);
        if level != wanted {
            clamped += 1;
        }
        content.push_str(&text[last..heading.offset]);
        content.push_str(&"#".repeat(level.unsigned_abs() as usize));
        last = heading.offset + usize::from(heading.level);
    }
    content.push_str(&text[last..]);

    if clamped > 0 {
        tracing::warn!("{} heading(s) clamped while shifting levels by {}", clamped, shift);
    }

    AdjustedHeadings {
        content,
        clamped,
    }
}

/// Shift headings so the first one lands on `target_level`.
///
/// Text with no headings is returned unchanged.
#[must_use]
pub fn normalize_headings(
    text: &str,
    target_level: u8,
    options: &HeadingOptions,
) -> AdjustedHeadings {
    match extract_headings(text, options).first() {
        Some(first) => {
            adjust_headings(text, i32::from(target_level) - i32::from(first.level), options)
        }
        None => AdjustedHeadings {
            content: text.to_string(),
            clamped: 0,
        },
    }
}
