//! Global constants used throughout the atref codebase.
//!
//! Markup names, default option values and file names that more than one
//! module needs to agree on.

/// Name of the project configuration file searched for by the CLI.
pub const CONFIG_FILE_NAME: &str = "atref.toml";

/// Tag name used to wrap inlined content in compiled output.
///
/// An inlined reference becomes `<file path="...">` + content + `</file>`, a
/// deduplicated repeat becomes the self-closing `<file path="..." />`.
pub const WRAPPER_TAG: &str = "file";

/// Extensions probed when a reference target does not exist as written.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".md"];

/// File stem probed inside a directory target (`dir/index.md`).
pub const INDEX_FILE_STEM: &str = "index";

/// Default bound on nested expansion depth.
///
/// Recursion follows the host call stack, so extremely deep chains are cut off
/// here and reported as a diagnostic instead of overflowing the stack.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Deepest valid markdown heading level.
pub const MAX_HEADING_LEVEL: usize = 6;

/// Shallowest valid markdown heading level.
pub const MIN_HEADING_LEVEL: usize = 1;

/// File extensions treated as documents in folder mode.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
