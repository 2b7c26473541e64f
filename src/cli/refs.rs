//! List the references of one document with their resolution status.
//!
//! Editor integrations call this for document links, diagnostics and hover:
//! positions refer to the file as stored on disk, front matter included.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::common::{CommandContext, Outcome, OutputFormat, print_json};
use crate::core::AtrefError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::markdown::frontmatter::frontmatter_boundaries;
use crate::markdown::{ExtractOptions, Reference, extract_references};
use crate::resolver::{ResolveOptions, ResolvedPath, resolve_path_with};
use crate::utils::fs::{FileKind, FileSystem, OsFileSystem, absolutize, read_document};

/// Command to list the references of a document.
#[derive(Args, Debug)]
pub struct RefsCommand {
    /// Document to scan
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// A reference and where it points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceStatus {
    /// The reference
    #[serde(flatten)]
    pub reference: Reference,
    /// Its resolution
    pub resolved: ResolvedPath,
}

impl RefsCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be read. Unresolved references make the
    /// outcome [`Outcome::Failed`].
    pub fn execute(self, ctx: &CommandContext) -> Result<Outcome> {
        let statuses = self.scan(&OsFileSystem, ctx)?;

        match self.format {
            OutputFormat::Json => print_json(&statuses)?,
            OutputFormat::Text => {
                for status in &statuses {
                    let position =
                        format!("{}:{}", status.reference.line, status.reference.column);
                    if status.resolved.is_file() {
                        println!(
                            "{} {} {} → {}",
                            "✓".green(),
                            position,
                            status.reference.raw,
                            ctx.display(&status.resolved.absolute_path)
                        );
                    } else {
                        println!(
                            "{} {} {} ({})",
                            "✗".red(),
                            position,
                            status.reference.raw,
                            status.resolved.error.as_deref().unwrap_or("unresolved")
                        );
                    }
                }
                if statuses.is_empty() && !ctx.quiet {
                    println!("No references in {}", ctx.display(&self.file));
                }
            }
        }

        Ok(Outcome::from_failures(statuses.iter().any(|s| !s.resolved.is_file())))
    }

    /// Extract and resolve the document's references.
    ///
    /// # Errors
    ///
    /// Fails when the document is missing, a directory, or unreadable.
    pub fn scan(&self, fs: &dyn FileSystem, ctx: &CommandContext) -> Result<Vec<ReferenceStatus>> {
        let path = absolutize(&self.file).with_file_context(
            FileOperation::Metadata,
            &self.file,
            "locating document",
            "cli::refs",
        )?;
        match fs.kind(&path) {
            Some(FileKind::File) => {}
            Some(FileKind::Directory) => {
                return Err(AtrefError::DocumentIsDirectory {
                    path: path.display().to_string(),
                }
                .into());
            }
            None => {
                return Err(AtrefError::DocumentNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
        }

        let text = read_document(fs, &path, "listing references", "cli::refs")?;
        let options = ctx.compile_options();
        let body_start = frontmatter_boundaries(&text).map_or(0, |b| b.end);
        let resolve = ResolveOptions::new(path.parent().unwrap_or(Path::new("/")))
            .with_extensions(options.extensions);

        let statuses = extract_references(
            &text,
            &ExtractOptions::default().with_one_based(options.one_based_positions),
        )
        .into_iter()
        .filter(|r| r.start_offset >= body_start)
        .map(|reference| {
            let resolved = resolve_path_with(fs, &reference.target_path, &resolve);
            ReferenceStatus {
                reference,
                resolved,
            }
        })
        .collect();
        Ok(statuses)
    }
}
