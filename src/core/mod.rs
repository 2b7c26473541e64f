//! Core types and error handling for atref
//!
//! This module holds the foundations the rest of the crate builds on:
//!
//! - [`AtrefError`] - Enumerated error types for failures that abort an operation
//! - [`ErrorContext`] - User-friendly error wrapper with details and suggestions
//! - [`user_friendly_error`] - Convert any error to user-friendly format
//! - [`file_error`] - File operation errors that carry operation, path and purpose
//!
//! # Errors vs. diagnostics
//!
//! atref separates two kinds of failure:
//!
//! - **Faults** stop the current operation: the top-level document cannot be read,
//!   the configuration is malformed, an output file cannot be written. These travel
//!   as [`anyhow::Error`] values wrapping [`AtrefError`] or
//!   [`FileOperationError`](file_error::FileOperationError).
//! - **Diagnostics** are expected while compiling real documents: a reference to a
//!   file that does not exist, a reference to a directory, a circular reference.
//!   These are plain data on the compiled result and never abort sibling processing.
//!
//! # Examples
//!
//! ```rust
//! use atref_cli::core::{AtrefError, user_friendly_error};
//!
//! fn open_folder() -> anyhow::Result<()> {
//!     Err(AtrefError::NotADirectory {
//!         path: "README.md".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = open_folder() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;
pub mod file_error;

pub use error::{AtrefError, ErrorContext, user_friendly_error};
pub use file_error::{FileOperation, FileOperationContext, FileOperationError, FileResultExt};
