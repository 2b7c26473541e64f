//! Byte ranges that reference and heading scanning must skip.
//!
//! Three kinds of ranges are recognised:
//!
//! - fenced code blocks, delimited by runs of three or more backticks; an
//!   unterminated fence runs to the end of the text
//! - inline code spans, a backtick pair on one line, looked for only outside
//!   fenced blocks so a fence's interior never produces spurious spans
//! - compiled wrapper blocks, `<file path="...">` up to the matching
//!   `</file>`; the self-closing stub form opens no block

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::constants::WRAPPER_TAG;

static INLINE_CODE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"`[^`\n]+`").ok());

static WRAPPER_TAGS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r#"<{tag}\s+path="[^"]*"\s*(/?)>|</{tag}>"#, tag = WRAPPER_TAG)).ok()
});

/// A sorted set of non-overlapping byte ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanSet {
    ranges: Vec<Range<usize>>,
}

impl SpanSet {
    /// Build a set from arbitrary ranges, merging overlaps.
    pub fn from_ranges(mut ranges: Vec<Range<usize>>) -> Self {
        ranges.retain(|r| r.start < r.end);
        ranges.sort_by_key(|r| r.start);

        let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        Self {
            ranges: merged,
        }
    }

    /// Union of two sets.
    #[must_use]
    pub fn union(&self, other: &SpanSet) -> SpanSet {
        let mut ranges = self.ranges.clone();
        ranges.extend(other.ranges.iter().cloned());
        Self::from_ranges(ranges)
    }

    /// Whether `offset` falls inside any range.
    pub fn contains(&self, offset: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.start <= offset);
        idx > 0 && offset < self.ranges[idx - 1].end
    }

    /// The ranges, sorted by start.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Whether the set holds no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Fenced code blocks.
pub fn fenced_code_spans(text: &str) -> SpanSet {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        if i - run_start < 3 {
            continue;
        }
        match open.take() {
            Some(start) => ranges.push(start..i),
            None => open = Some(run_start),
        }
    }

    if let Some(start) = open {
        ranges.push(start..text.len());
    }
    SpanSet::from_ranges(ranges)
}

/// Inline code spans lying outside the given fenced blocks.
pub fn inline_code_spans(text: &str, fenced: &SpanSet) -> SpanSet {
    let Some(pattern) = INLINE_CODE.as_ref() else {
        return SpanSet::default();
    };

    let mut ranges = Vec::new();
    let mut segment_start = 0;
    let mut gaps: Vec<Range<usize>> = Vec::new();
    for fence in fenced.ranges() {
        gaps.push(segment_start..fence.start);
        segment_start = fence.end;
    }
    gaps.push(segment_start..text.len());

    for gap in gaps {
        if gap.start >= gap.end {
            continue;
        }
        for m in pattern.find_iter(&text[gap.clone()]) {
            ranges.push(gap.start + m.start()..gap.start + m.end());
        }
    }
    SpanSet::from_ranges(ranges)
}

/// Fenced blocks and inline code spans together.
pub fn code_spans(text: &str) -> SpanSet {
    let fenced = fenced_code_spans(text);
    let inline = inline_code_spans(text, &fenced);
    fenced.union(&inline)
}

/// Content already expanded by a previous compilation.
///
/// Blocks nest, and only the outermost extent matters once merged. An opening
/// tag with no matching close extends to the end of the text.
pub fn wrapper_spans(text: &str) -> SpanSet {
    let Some(pattern) = WRAPPER_TAGS.as_ref() else {
        return SpanSet::default();
    };

    let mut ranges = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let is_close = whole.as_str().starts_with("</");
        let self_closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

        if is_close {
            if let Some(start) = stack.pop() {
                ranges.push(start..whole.end());
            }
        } else if !self_closing {
            stack.push(whole.start());
        }
    }
    for start in stack {
        ranges.push(start..text.len());
    }
    SpanSet::from_ranges(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_blocks() {
        let text = "before\n```rust\nlet x = 1;\n```\nafter";
        let spans = fenced_code_spans(text);
        assert_eq!(spans.ranges().len(), 1);
        assert!(spans.contains(text.find("let").unwrap()));
        assert!(!spans.contains(text.find("after").unwrap()));
        assert!(!spans.contains(0));
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let text = "a\n```\n@x/y.md\nstill code";
        let spans = fenced_code_spans(text);
        assert!(spans.contains(text.len() - 1));
    }

    #[test]
    fn test_inline_spans_ignore_fence_interior() {
        let text = "`one`\n```\n`not inline`\n```\ntext `two` end";
        let fenced = fenced_code_spans(text);
        let inline = inline_code_spans(text, &fenced);
        assert_eq!(inline.ranges().len(), 2);
        assert!(inline.contains(text.find("one").unwrap()));
        assert!(inline.contains(text.find("two").unwrap()));
    }

    #[test]
    fn test_inline_span_does_not_cross_lines() {
        let text = "a `b\nc` d";
        assert!(code_spans(text).is_empty());
    }

    #[test]
    fn test_wrapper_spans_nesting_and_stub() {
        let text = concat!(
            "intro\n",
            "<file path=\"/a.md\">\n# A\n",
            "<file path=\"/b.md\">\n# B\n</file>\n",
            "</file>\n",
            "<file path=\"/b.md\" />\n",
            "outro"
        );
        let spans = wrapper_spans(text);
        assert_eq!(spans.ranges().len(), 1);
        assert!(spans.contains(text.find("# A").unwrap()));
        assert!(spans.contains(text.find("# B").unwrap()));
        assert!(!spans.contains(text.find("outro").unwrap()));
        assert!(!spans.contains(text.rfind("<file").unwrap()));
    }

    #[test]
    fn test_span_set_merges() {
        let set = SpanSet::from_ranges(vec![5..10, 0..3, 8..12, 20..20]);
        assert_eq!(set.ranges(), &[0..3, 5..12]);
        assert!(set.contains(11));
        assert!(!set.contains(12));
        assert!(!set.contains(4));
    }
}
