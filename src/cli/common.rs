//! Common utilities shared by the CLI commands

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::compiler::{CompileOptions, CompiledReference, ReferenceIssue};
use crate::config::AtrefConfig;
use crate::resolver::dependency_graph::display_relative;
use crate::utils::fs::normalize_path;

/// Output format for command results.
///
/// - `text`: Human-readable output with colors
/// - `json`: Structured JSON output for editors and scripts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for automation
    Json,
}

/// How a command finished, mapped to the process exit status by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything resolved
    Success,
    /// At least one reference or document failed
    Failed,
}

impl Outcome {
    /// `Failed` when `failed` is set.
    #[must_use]
    pub const fn from_failures(failed: bool) -> Self {
        if failed {
            Self::Failed
        } else {
            Self::Success
        }
    }

    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
        }
    }
}

/// State shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Loaded project configuration
    pub config: AtrefConfig,
    /// Working directory, used to shorten displayed paths
    pub cwd: PathBuf,
    /// Suppress informational output
    pub quiet: bool,
    /// Draw progress bars
    pub progress: bool,
}

impl CommandContext {
    /// Context with default configuration rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            config: AtrefConfig::default(),
            cwd: cwd.into(),
            quiet: false,
            progress: false,
        }
    }

    /// Compile options from the configuration.
    ///
    /// Positions are reported 1-indexed unless the configuration says
    /// otherwise, matching the `file:line:column` convention of editors.
    pub fn compile_options(&self) -> CompileOptions {
        let mut options = self.config.compile_options();
        options.one_based_positions = self.config.one_based_positions.unwrap_or(true);
        options
    }

    /// `path` relative to the working directory when it lies below it.
    pub fn display(&self, path: &Path) -> String {
        display_relative(path, &self.cwd)
    }

    /// Print a failed reference as `file:line:column: message` on stderr.
    pub fn report_failure(&self, reference: &CompiledReference) {
        let Some(issue) = &reference.issue else {
            return;
        };
        eprintln!(
            "{} {}:{}:{}: {}",
            "✗".red(),
            self.display(&reference.imported_from),
            reference.reference.line,
            reference.reference.column,
            issue
        );
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Minimum similarity for a sibling file to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Suggest a correction for an unresolved reference.
///
/// Looks at the files next to where the target was expected and returns the
/// reference path with its file name replaced by the closest match.
pub fn suggest_correction(reference: &CompiledReference) -> Option<String> {
    if !matches!(reference.issue, Some(ReferenceIssue::NotFound { .. })) {
        return None;
    }

    let target = Path::new(&reference.reference.target_path);
    let wanted = target.file_name()?.to_str()?;
    let document_dir = reference.imported_from.parent()?;
    let written = target.to_string_lossy();
    let expected = normalize_path(&document_dir.join(written.trim_start_matches('/')));
    let search_dir = expected.parent()?;

    let entries = std::fs::read_dir(search_dir).ok()?;
    let mut best: Option<(f64, String)> = None;
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let stem = Path::new(&name).file_stem().and_then(|s| s.to_str()).unwrap_or(&name);
        let score = strsim::jaro_winkler(wanted, &name).max(strsim::jaro_winkler(wanted, stem));
        if score >= SUGGESTION_THRESHOLD && best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, name));
        }
    }

    best.map(|(_, name)| target.with_file_name(name).to_string_lossy().into_owned())
}
