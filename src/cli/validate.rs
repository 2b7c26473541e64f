//! Check references without writing anything.
//!
//! The validate command compiles a document or folder in memory and reports
//! every reference that could not be inlined:
//!
//! - targets that do not exist at any probed path
//! - targets that are directories without an index document
//! - circular references
//! - targets that exist but cannot be read
//! - chains nested deeper than the configured limit
//!
//! Unresolved targets come with a "did you mean" suggestion when a file with
//! a similar name sits where the target was expected. Dependency cycles between
//! folder documents are warnings, or errors with `--strict`.
//!
//! # Examples
//!
//! ```bash
//! atref validate docs/readme.md
//! atref validate docs --strict
//! atref validate docs --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{CommandContext, Outcome, OutputFormat, print_json, suggest_correction};
use crate::compiler::{
    CompiledReference, FolderCompileOptions, NoopObserver, compile_file, compile_folder_with,
};
use crate::utils::fs::OsFileSystem;

/// Command to report broken references.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Document or folder to validate
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format
    ///
    /// - `text`: Human-readable output with colors
    /// - `json`: Structured output for editors and CI
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode (treat dependency cycles as errors)
    #[arg(long)]
    pub strict: bool,
}

/// One broken reference, or a document that could not be read at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Document holding the reference
    pub file: PathBuf,
    /// Reference line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Reference column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Reference target as written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// What went wrong
    pub message: String,
    /// Likely intended target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Problem {
    fn from_reference(reference: &CompiledReference) -> Self {
        Self {
            file: reference.imported_from.clone(),
            line: Some(reference.reference.line),
            column: Some(reference.reference.column),
            target: Some(reference.reference.target_path.clone()),
            message: reference.issue.as_ref().map(ToString::to_string).unwrap_or_default(),
            suggestion: suggest_correction(reference),
        }
    }
}

/// Everything validate found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Whether validation passed
    pub valid: bool,
    /// Documents checked
    pub documents: usize,
    /// References checked
    pub references: usize,
    /// Broken references and unreadable documents
    pub problems: Vec<Problem>,
    /// Dependency cycles between folder documents
    pub cycles: Vec<Vec<PathBuf>>,
}

impl ValidateCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails when the input itself cannot be read. Broken references make the
    /// outcome [`Outcome::Failed`].
    pub fn execute(self, ctx: &CommandContext) -> Result<Outcome> {
        let report = self.validate(ctx)?;

        match self.format {
            OutputFormat::Json => print_json(&report)?,
            OutputFormat::Text => self.print_report(ctx, &report),
        }

        Ok(Outcome::from_failures(!report.valid))
    }

    /// Compile in memory and collect the problems.
    ///
    /// # Errors
    ///
    /// See [`ValidateCommand::execute`].
    pub fn validate(&self, ctx: &CommandContext) -> Result<ValidationReport> {
        let options = ctx.compile_options();
        let mut report = ValidationReport::default();

        if self.path.is_dir() {
            let folder_options = FolderCompileOptions::default()
                .with_compile_options(options)
                .with_exclude(ctx.config.exclude.clone());

            let result =
                compile_folder_with(&OsFileSystem, &self.path, &folder_options, &mut NoopObserver)?;
            for doc in &result.documents {
                if let Some(error) = &doc.error {
                    report.problems.push(Problem {
                        file: doc.path.clone(),
                        line: None,
                        column: None,
                        target: None,
                        message: error.clone(),
                        suggestion: None,
                    });
                }
                if let Some(compiled) = &doc.result {
                    report.problems.extend(compiled.failures().map(Problem::from_reference));
                }
            }
            report.documents = result.total_documents;
            report.references = result.total_references;
            report.cycles = result.cycles;
        } else {
            let result = compile_file(&self.path, &options)?;
            report.problems.extend(result.failures().map(Problem::from_reference));
            report.documents = 1;
            report.references = result.references.len();
        }

        report.valid = report.problems.is_empty() && (!self.strict || report.cycles.is_empty());
        tracing::debug!(
            "Validated {} documents: {} problems, {} cycles",
            report.documents,
            report.problems.len(),
            report.cycles.len()
        );
        Ok(report)
    }

    fn print_report(&self, ctx: &CommandContext, report: &ValidationReport) {
        for problem in &report.problems {
            let location = match (problem.line, problem.column) {
                (Some(line), Some(column)) => {
                    format!("{}:{}:{}", ctx.display(&problem.file), line, column)
                }
                _ => ctx.display(&problem.file),
            };
            println!("{} {}: {}", "✗".red(), location, problem.message);
            if let Some(suggestion) = &problem.suggestion {
                println!("  {} did you mean @{}?", "→".green(), suggestion);
            }
        }

        for cycle in &report.cycles {
            let members: Vec<String> = cycle.iter().map(|p| ctx.display(p)).collect();
            let marker = if self.strict {
                "✗".red()
            } else {
                "⚠".yellow()
            };
            println!("{} Dependency cycle: {}", marker, members.join(" → "));
        }

        if ctx.quiet {
            return;
        }

        if report.valid {
            println!(
                "{} {} documents, {} references, no problems",
                "✓".green(),
                report.documents,
                report.references
            );
        } else {
            let count = report.problems.len() + if self.strict { report.cycles.len() } else { 0 };
            println!("{} {} problem(s) found", "✗".red(), count);
        }
    }
}
