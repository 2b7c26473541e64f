//! Compile a document or a folder of documents.
//!
//! A file argument compiles that one document and prints the result on stdout,
//! unless `--output` or `--write` sends it to disk. A directory argument
//! compiles every markdown document below it in dependency order, sharing one
//! session so a document inlined once is stubbed everywhere after.
//!
//! # Examples
//!
//! ```bash
//! # Print the compiled document
//! atref compile docs/readme.md
//!
//! # Compile into a file, keeping repeated imports in full
//! atref compile docs/readme.md -o build/readme.md --no-dedup
//!
//! # Compile a folder into a mirror directory
//! atref compile docs -o dist --exclude "drafts/**"
//!
//! # Rewrite every document in place
//! atref compile docs --write
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::common::{CommandContext, Outcome, OutputFormat, print_json};
use crate::compiler::{
    CompileOptions, CompileResult, FolderCompileOptions, FolderCompileResult, FolderObserver,
    compile_file, compile_folder_with,
};
use crate::markdown::headings::HeadingMode;
use crate::resolver::path_resolver::normalize_extension;
use crate::utils::fs::OsFileSystem;
use crate::utils::progress::ProgressBar;

/// Command to compile `@path` references into self-contained documents.
#[derive(Args, Debug)]
pub struct CompileCommand {
    /// Document or folder to compile
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Where to write the result
    ///
    /// For a document this is the output file. For a folder it is a
    /// directory that mirrors the folder's layout.
    #[arg(short, long, value_name = "OUT")]
    pub output: Option<PathBuf>,

    /// Overwrite the source documents with their compiled form
    #[arg(long, conflicts_with = "output")]
    pub write: bool,

    /// Inline every occurrence in full instead of stubbing repeats
    #[arg(long)]
    pub no_dedup: bool,

    /// How headings of inlined documents are renumbered
    #[arg(long, value_enum, value_name = "MODE")]
    pub heading_mode: Option<HeadingMode>,

    /// Extension to try when a reference has none (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Deepest nesting of inlined documents
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Skip folder documents matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// JSON view of a single compiled document, content included.
#[derive(Serialize)]
struct FileReport<'a> {
    #[serde(flatten)]
    result: &'a CompileResult,
    content: &'a str,
}

impl CompileCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails when the input cannot be read, an exclude pattern is invalid, or
    /// output cannot be written. Failed references are not errors; they make
    /// the outcome [`Outcome::Failed`].
    pub fn execute(self, ctx: &CommandContext) -> Result<Outcome> {
        let options = self.compile_options(ctx);
        if self.path.is_dir() {
            self.compile_folder(ctx, options)
        } else {
            self.compile_file(ctx, options)
        }
    }

    /// Configuration values with this command's flags applied on top.
    fn compile_options(&self, ctx: &CommandContext) -> CompileOptions {
        let mut options = ctx.compile_options();
        if self.no_dedup {
            options.optimize_duplicates = false;
        }
        if let Some(mode) = self.heading_mode {
            options.heading_mode = mode;
        }
        if !self.extensions.is_empty() {
            options.extensions = self.extensions.iter().map(|e| normalize_extension(e)).collect();
        }
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        options
    }

    fn compile_file(&self, ctx: &CommandContext, options: CompileOptions) -> Result<Outcome> {
        let mut options = options.with_write(self.write);
        if let Some(output) = &self.output {
            options = options.with_output(output);
        }

        let result = compile_file(&self.path, &options)?;

        match self.format {
            OutputFormat::Json => print_json(&FileReport {
                result: &result,
                content: &result.content,
            })?,
            OutputFormat::Text => {
                for failure in result.failures() {
                    ctx.report_failure(failure);
                }
                match &result.output_path {
                    Some(path) => {
                        if !ctx.quiet {
                            eprintln!("{} Wrote {}", "✓".green(), ctx.display(path));
                        }
                    }
                    None if result.content.ends_with('\n') => print!("{}", result.content),
                    None => println!("{}", result.content),
                }
                if result.heading_clamps > 0 && !ctx.quiet {
                    eprintln!(
                        "{} {} heading(s) clamped to the valid range",
                        "⚠".yellow(),
                        result.heading_clamps
                    );
                }
            }
        }

        Ok(Outcome::from_failures(result.has_failures()))
    }

    fn compile_folder(&self, ctx: &CommandContext, options: CompileOptions) -> Result<Outcome> {
        let mut exclude = ctx.config.exclude.clone();
        exclude.extend(self.exclude.iter().cloned());

        let output_dir = match (&self.output, self.write) {
            (Some(out), _) => Some(out.clone()),
            (None, false) => ctx.config.output_dir.clone(),
            (None, true) => None,
        };

        let mut folder_options = FolderCompileOptions::default()
            .with_compile_options(options)
            .with_exclude(exclude)
            .with_write(self.write);
        if let Some(dir) = output_dir {
            folder_options = folder_options.with_output_dir(dir);
        }

        let mut observer =
            ProgressObserver::new(ctx.progress && self.format == OutputFormat::Text);
        let result =
            compile_folder_with(&OsFileSystem, &self.path, &folder_options, &mut observer)?;

        match self.format {
            OutputFormat::Json => print_json(&result)?,
            OutputFormat::Text => {
                print_folder_report(ctx, &result, folder_options.output_dir.as_deref());
            }
        }

        Ok(Outcome::from_failures(result.has_failures()))
    }
}

fn print_folder_report(
    ctx: &CommandContext,
    result: &FolderCompileResult,
    output_dir: Option<&Path>,
) {
    for doc in &result.documents {
        if let Some(error) = &doc.error {
            eprintln!("{} {}: {}", "✗".red(), ctx.display(&doc.path), error);
        }
        if let Some(compiled) = &doc.result {
            for failure in compiled.failures() {
                ctx.report_failure(failure);
            }
        }
    }

    for cycle in &result.cycles {
        let members: Vec<String> = cycle.iter().map(|p| ctx.display(p)).collect();
        eprintln!("{} Dependency cycle: {}", "⚠".yellow(), members.join(" → "));
    }

    if ctx.quiet {
        return;
    }

    let summary = format!(
        "Compiled {} documents ({} references, {} failures)",
        result.total_documents, result.total_references, result.total_failures
    );
    if result.has_failures() {
        eprintln!("{} {}", "✗".red(), summary);
    } else {
        eprintln!("{} {}", "✓".green(), summary.green());
    }

    if !result.written.is_empty() {
        match output_dir {
            Some(dir) => {
                eprintln!("  Wrote {} files to {}", result.written.len(), ctx.display(dir));
            }
            None => eprintln!("  Rewrote {} files in place", result.written.len()),
        }
    }
}

/// Drives a progress bar from folder compilation events.
struct ProgressObserver {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: None,
        }
    }
}

impl FolderObserver for ProgressObserver {
    fn on_start(&mut self, total: usize) {
        self.bar = Some(ProgressBar::new(total as u64, self.enabled));
    }

    fn on_document(&mut self, path: &Path) {
        if let Some(bar) = &self.bar {
            if let Some(name) = path.file_name() {
                bar.set_message(name.to_string_lossy());
            }
            bar.inc(1);
        }
    }

    fn on_finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
