//! atref - compile `@path` references in markdown
//!
//! A markdown document can point at another one with an `@path` reference:
//!
//! ```markdown
//! # Handbook
//!
//! ## Setup
//!
//! @./setup/install.md
//! ```
//!
//! Compiling the document replaces every reference with the content it points
//! to, recursively, so a tree of small documents becomes one self-contained
//! document.
//!
//! # Compilation model
//!
//! - **Extraction**: references are found by scanning the text. Code spans,
//!   fenced blocks and e-mail addresses never produce references.
//! - **Resolution**: a reference resolves against the directory of the
//!   document holding it, trying the path as written, then with each fallback
//!   extension, then as a directory with an `index` document.
//! - **Expansion**: resolved content is wrapped in `<file path="...">` markup.
//!   Headings of inlined content are renumbered to sit below the heading in
//!   effect at the reference.
//! - **Deduplication**: within one run, a document is inlined in full only
//!   once. Later occurrences become a self-closing `<file path="..." />` stub.
//! - **Cycles**: a reference to a document already being expanded is left in
//!   place and reported, never followed.
//!
//! Problems with individual references are data on the result, not errors.
//! Only failing to read the document being compiled aborts a compile call.
//!
//! # Folder mode
//!
//! Compiling a directory orders its documents with a dependency graph so that
//! dependencies come first, then compiles all of them with one shared session.
//!
//! # Core Modules
//!
//! - [`markdown`] - Reference extraction, code spans, headings and front matter
//! - [`resolver`] - Path resolution and the document dependency graph
//! - [`compiler`] - Recursive expansion, sessions and folder compilation
//! - [`config`] - The optional `atref.toml` project configuration
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - The `atref` command-line interface
//! - [`utils`] - File system abstraction and progress reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use atref_cli::compiler::{CompileOptions, compile_file};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let result = compile_file(Path::new("docs/handbook.md"), &CompileOptions::default())?;
//! for failure in result.failures() {
//!     eprintln!("{}:{}: {}", failure.imported_from.display(), failure.reference.line,
//!         failure.issue.as_ref().map(ToString::to_string).unwrap_or_default());
//! }
//! println!("{}", result.content);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod core;
pub mod markdown;
pub mod resolver;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
