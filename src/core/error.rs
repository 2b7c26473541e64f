//! Error handling for atref
//!
//! This module provides the error types and user-facing error reporting for atref.
//! The error system follows two rules:
//! 1. **Strongly-typed errors** for the conditions that abort an operation
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! Conditions that are *expected* while compiling a document tree (a missing
//! reference target, a directory target, a circular reference, an unreadable
//! referenced file) are **not** errors. They are recorded as
//! [`ReferenceIssue`](crate::compiler::ReferenceIssue) values on each compiled
//! reference so one broken link never aborts the rest of a document.
//!
//! # Architecture
//!
//! - [`AtrefError`] - Enumerated error types for failures that abort an operation
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//! - [`user_friendly_error`] - Converts any [`anyhow::Error`] into an [`ErrorContext`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use atref_cli::core::{AtrefError, ErrorContext, user_friendly_error};
//!
//! let error = AtrefError::DocumentNotFound {
//!     path: "docs/missing.md".to_string(),
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::core::file_error::FileOperationError;

/// The main error type for atref operations
///
/// Each variant describes a failure that stops the current operation. Per-reference
/// problems found during compilation are reported as data instead.
///
/// # Error Categories
///
/// ## Documents
/// - [`DocumentNotFound`] - The top-level document does not exist
/// - [`DocumentIsDirectory`] - A file was expected but a directory was given
/// - [`NotADirectory`] - A folder was expected but a file was given
///
/// ## File System
/// - [`FileSystemError`] - General file system operation failure
/// - [`PermissionDenied`] - Insufficient permissions
///
/// ## Configuration
/// - [`ConfigError`] - Invalid configuration values
/// - [`ConfigParseError`] - Invalid TOML in `atref.toml`
/// - [`InvalidPattern`] - Malformed exclude glob
///
/// [`DocumentNotFound`]: AtrefError::DocumentNotFound
/// [`DocumentIsDirectory`]: AtrefError::DocumentIsDirectory
/// [`NotADirectory`]: AtrefError::NotADirectory
/// [`FileSystemError`]: AtrefError::FileSystemError
/// [`PermissionDenied`]: AtrefError::PermissionDenied
/// [`ConfigError`]: AtrefError::ConfigError
/// [`ConfigParseError`]: AtrefError::ConfigParseError
/// [`InvalidPattern`]: AtrefError::InvalidPattern
#[derive(Error, Debug, Clone)]
pub enum AtrefError {
    /// The document requested for compilation does not exist
    #[error("Document not found: {path}")]
    DocumentNotFound {
        /// Path of the missing document
        path: String,
    },

    /// A document path points at a directory
    #[error("Expected a document but found a directory: {path}")]
    DocumentIsDirectory {
        /// Path of the directory
        path: String,
    },

    /// A folder operation was given something that is not a directory
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// Path that was expected to be a directory
        path: String,
    },

    /// File system error
    #[error("File system error: {operation}")]
    FileSystemError {
        /// The file system operation that failed
        operation: String,
        /// Path where the file system error occurred
        path: String,
    },

    /// Permission denied
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// The operation that was denied
        operation: String,
        /// Path where permission was denied
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Configuration file parsing error
    #[error("Invalid configuration file syntax in {file}")]
    ConfigParseError {
        /// Path to the configuration file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// Invalid exclude pattern
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as written by the user
        pattern: String,
        /// Why the pattern was rejected
        reason: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps an [`AtrefError`] and adds optional details and a
/// suggestion for resolving it. This is how the CLI presents errors.
///
/// # Examples
///
/// ```rust,no_run
/// use atref_cli::core::{AtrefError, ErrorContext};
///
/// let context = ErrorContext::new(AtrefError::NotADirectory {
///     path: "README.md".to_string(),
/// })
/// .with_suggestion("Pass a folder to compile a document tree")
/// .with_details("Folder mode walks every markdown file below the given directory");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying atref error
    pub error: AtrefError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from an [`AtrefError`]
    #[must_use]
    pub const fn new(error: AtrefError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    ///
    /// Suggestions are actionable steps; they are displayed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    ///
    /// Details are displayed in yellow, below the error itself.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes, in order:
/// - [`AtrefError`] variants with tailored suggestions
/// - [`FileOperationError`] with its operation-aware message
/// - [`std::io::Error`] with filesystem-specific guidance
/// - [`toml::de::Error`] with TOML syntax help
/// - Anything else, with the full cause chain appended
///
/// # Examples
///
/// ```rust,no_run
/// use atref_cli::core::user_friendly_error;
///
/// let error = anyhow::anyhow!("Something went wrong");
/// let context = user_friendly_error(error);
/// context.display();
/// ```
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(atref_error) = error.downcast_ref::<AtrefError>() {
        return create_error_context(atref_error.clone());
    }

    if let Some(file_error) = error.downcast_ref::<FileOperationError>() {
        let path = file_error.file_path.display().to_string();
        let base = match file_error.source.kind() {
            std::io::ErrorKind::PermissionDenied => AtrefError::PermissionDenied {
                operation: file_error.operation.to_string(),
                path,
            },
            _ => AtrefError::FileSystemError {
                operation: file_error.operation.to_string(),
                path,
            },
        };
        return ErrorContext::new(base).with_details(file_error.user_message());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AtrefError::PermissionDenied {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the documents being compiled")
                .with_details("atref needs read access to every referenced file and write access to the output location");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AtrefError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(
                    "This error occurs when a required file or directory cannot be found",
                );
            }
            std::io::ErrorKind::InvalidData => {
                return ErrorContext::new(AtrefError::Other {
                    message: io_error.to_string(),
                })
                .with_suggestion("Make sure the document is valid UTF-8 text")
                .with_details("atref reads every document as UTF-8");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(AtrefError::ConfigParseError {
            file: crate::constants::CONFIG_FILE_NAME.to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your atref.toml file. Verify quotes, brackets, and key names")
        .with_details(toml_error.to_string());
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> = error
        .chain()
        .skip(1) // Skip the root cause which is already in to_string()
        .map(std::string::ToString::to_string)
        .collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AtrefError::Other {
        message,
    })
}

/// Map each [`AtrefError`] variant to an [`ErrorContext`] with suggestions.
fn create_error_context(error: AtrefError) -> ErrorContext {
    match &error {
        AtrefError::DocumentNotFound {
            path,
        } => {
            let suggestion = format!(
                "Check that '{path}' exists. Paths are resolved relative to the current directory"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("The top-level document must exist; missing referenced files are reported per reference instead")
        }

        AtrefError::DocumentIsDirectory {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass a markdown file, or pass the folder itself to compile every document in it"),

        AtrefError::NotADirectory {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass a directory to build a dependency graph, or use 'atref compile <FILE>' for a single document"),

        AtrefError::PermissionDenied {
            path,
            ..
        } => {
            let suggestion = format!("Check the permissions of '{path}'");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("atref needs read access to documents and write access to output locations")
        }

        AtrefError::ConfigParseError {
            file,
            reason,
        } => {
            let suggestion = format!(
                "Check the TOML syntax in {file}. Common issues: missing quotes, unknown keys, wrong value types"
            );
            let details = reason.clone();
            ErrorContext::new(error).with_suggestion(suggestion).with_details(details)
        }

        AtrefError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Extensions look like '.md' and max_depth must be at least 1"),

        AtrefError::InvalidPattern {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Exclude patterns use glob syntax, e.g. 'drafts/**' or '**/*.tmp.md'"),

        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AtrefError::DocumentNotFound {
            path: "docs/a.md".to_string(),
        };
        assert_eq!(error.to_string(), "Document not found: docs/a.md");

        let error = AtrefError::InvalidPattern {
            pattern: "[".to_string(),
            reason: "unclosed".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid pattern '[': unclosed");

        let error = AtrefError::ConfigError {
            message: "max_depth must be at least 1".to_string(),
        };
        assert_eq!(error.to_string(), "Configuration error: max_depth must be at least 1");
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(AtrefError::NotADirectory {
            path: "x.md".to_string(),
        })
        .with_suggestion("Pass a folder");

        let display = format!("{ctx}");
        assert!(display.contains("Not a directory: x.md"));
        assert!(display.contains("Suggestion: Pass a folder"));
    }

    #[test]
    fn test_user_friendly_error_known_variant() {
        let error = anyhow::Error::from(AtrefError::DocumentNotFound {
            path: "gone.md".to_string(),
        });

        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, AtrefError::DocumentNotFound { .. }));
        assert!(ctx.suggestion.unwrap().contains("gone.md"));
    }

    #[test]
    fn test_user_friendly_error_permission_denied() {
        use std::io::{Error, ErrorKind};

        let io_error = Error::new(ErrorKind::PermissionDenied, "access denied");
        let ctx = user_friendly_error(anyhow::Error::from(io_error));
        assert!(matches!(ctx.error, AtrefError::PermissionDenied { .. }));
        assert!(ctx.suggestion.is_some());
        assert!(ctx.details.is_some());
    }

    #[test]
    fn test_user_friendly_error_includes_chain() {
        let error = anyhow::anyhow!("root cause").context("while compiling");
        let ctx = user_friendly_error(error);
        match ctx.error {
            AtrefError::Other {
                message,
            } => {
                assert!(message.contains("while compiling"));
                assert!(message.contains("Caused by"));
                assert!(message.contains("root cause"));
            }
            other => panic!("Expected Other, got {other:?}"),
        }
    }
}
