//! Transclusion compiler.
//!
//! - [`engine`] expands one document recursively
//! - [`folder`] compiles a whole directory in dependency order
//! - [`session`] holds the state shared by one compilation run
//!
//! # Example
//!
//! ```rust
//! use atref_cli::compiler::{CompileOptions, compile_file_with};
//! use atref_cli::utils::fs::MemoryFileSystem;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let fs = MemoryFileSystem::new()
//!     .with_file("/docs/readme.md", "# Readme\n\n@./install.md\n")
//!     .with_file("/docs/install.md", "# Install\n\nRun the installer.\n");
//!
//! let result = compile_file_with(&fs, Path::new("/docs/readme.md"), &CompileOptions::default())?;
//! assert!(result.content.contains("## Install"));
//! assert!(!result.has_failures());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod engine;
pub mod folder;
pub mod session;

pub use engine::{
    CompileOptions, CompileResult, CompiledReference, ReferenceIssue, compile_content,
    compile_content_with, compile_document, compile_file, compile_file_with,
};
pub use folder::{
    DocumentResult, FolderCompileOptions, FolderCompileResult, FolderObserver, NoopObserver,
    compile_folder, compile_folder_with,
};
pub use session::{CompilationSession, ImportStats};
