//! Project configuration (`atref.toml`).
//!
//! The file is optional. When `--config` is not given, the nearest
//! `atref.toml` in the working directory or one of its ancestors is used.
//! Values layer as: command-line flags over file values over built-in
//! defaults.
//!
//! ```toml
//! # atref.toml
//! extensions = [".md", ".markdown"]
//! optimize_duplicates = true
//! heading_mode = "normalize"   # or "additive"
//! max_depth = 32
//! exclude = ["drafts/**", "**/CHANGELOG.md"]
//! output_dir = "dist"          # relative to this file
//! one_based_positions = true
//! ```
//!
//! Unknown keys are rejected so typos surface instead of being ignored.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compiler::CompileOptions;
use crate::constants::CONFIG_FILE_NAME;
use crate::core::AtrefError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::markdown::headings::HeadingMode;
use crate::resolver::path_resolver::normalize_extension;

/// Settings read from `atref.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtrefConfig {
    /// Fallback extensions for reference resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// Replace repeat imports with stubs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize_duplicates: Option<bool>,
    /// Heading renumbering mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_mode: Option<HeadingMode>,
    /// Deepest nesting of inlined documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Folder-mode exclude globs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// Folder-mode output directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Report positions 1-indexed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_based_positions: Option<bool>,

    /// File this configuration was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl AtrefConfig {
    /// Load the explicit file, or the nearest `atref.toml` above `start_dir`,
    /// or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Fails when the chosen file cannot be read or parsed. An explicit path
    /// that does not exist is an error; a missing discovered file is not.
    pub fn load(explicit: Option<&Path>, start_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::discover(start_dir) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No {} found above {}", CONFIG_FILE_NAME, start_dir.display());
                Ok(Self::default())
            }
        }
    }

    /// Nearest `atref.toml` in `start_dir` or its ancestors.
    pub fn discover(start_dir: &Path) -> Option<PathBuf> {
        start_dir.ancestors().map(|dir| dir.join(CONFIG_FILE_NAME)).find(|p| p.is_file())
    }

    /// Load and parse a specific file.
    ///
    /// A relative `output_dir` is made relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid configuration.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_file_context(
            FileOperation::Read,
            path,
            "loading configuration",
            "config",
        )?;
        let mut config = Self::parse(&content).map_err(|e| AtrefError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;

        if let (Some(output), Some(dir)) = (config.output_dir.as_ref(), path.parent()) {
            if output.is_relative() {
                config.output_dir = Some(dir.join(output));
            }
        }
        config.source = Some(path.to_path_buf());
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for invalid syntax, unknown keys or wrong types.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`AtrefError::ConfigError`] for an empty or path-like extension
    /// or a `max_depth` of zero.
    pub fn validate(&self) -> Result<(), AtrefError> {
        for ext in self.extensions.iter().flatten() {
            let bare = ext.trim_start_matches('.');
            if bare.is_empty() || bare.contains(['/', '\\']) {
                return Err(AtrefError::ConfigError {
                    message: format!("invalid extension '{ext}'"),
                });
            }
        }
        if self.max_depth == Some(0) {
            return Err(AtrefError::ConfigError {
                message: "max_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Compile options with file values applied over the defaults.
    pub fn compile_options(&self) -> CompileOptions {
        let mut options = CompileOptions::default();
        if let Some(extensions) = &self.extensions {
            options.extensions = extensions.iter().map(|e| normalize_extension(e)).collect();
        }
        if let Some(optimize) = self.optimize_duplicates {
            options.optimize_duplicates = optimize;
        }
        if let Some(mode) = self.heading_mode {
            options.heading_mode = mode;
        }
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        if let Some(one_based) = self.one_based_positions {
            options.one_based_positions = one_based;
        }
        options
    }
}
