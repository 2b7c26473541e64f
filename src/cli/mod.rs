//! Command-line interface for atref.
//!
//! Each command lives in its own module with its own argument structure and
//! an `execute` method. Commands are thin: they turn flags into options, call
//! into the library, and print the result.
//!
//! # Available Commands
//!
//! - `compile` - Inline `@path` references into self-contained documents
//! - `validate` - Report broken references without writing anything
//! - `graph` - Show how the documents of a folder depend on each other
//! - `refs` - List the references of one document with their status
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--no-progress` - Disable progress bars
//! - `--config` - Path to a configuration file instead of the discovered `atref.toml`
//!
//! # Example
//!
//! ```bash
//! # Compile one document to stdout
//! atref compile docs/readme.md
//!
//! # Compile a folder into dist/ and check it in CI
//! atref compile docs -o dist
//! atref --quiet validate docs --strict
//! ```

pub mod common;
pub mod compile;
pub mod graph;
pub mod refs;
pub mod validate;

pub use common::{CommandContext, Outcome, OutputFormat};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AtrefConfig;

/// Main CLI structure for atref.
///
/// Options marked `global = true` are accepted before or after the
/// subcommand.
#[derive(Parser, Debug)]
#[command(
    name = "atref",
    about = "Compile @path references in markdown into self-contained documents",
    version,
    author,
    long_about = "atref inlines the documents that @path references point to, renumbering \
                  their headings to fit and stubbing repeated imports, so a tree of markdown \
                  files compiles into one self-contained document."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging and detailed information.
    ///
    /// Shows how every reference was resolved and why it was inlined,
    /// stubbed or rejected. Equivalent to `RUST_LOG=debug`. Mutually
    /// exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    ///
    /// Summaries and progress bars are hidden. Compiled output and JSON
    /// reports are still printed.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a configuration file.
    ///
    /// By default the nearest `atref.toml` in the working directory or one
    /// of its parents is used, if any.
    ///
    /// # Examples
    ///
    /// ```bash
    /// atref --config ./ci.toml validate docs
    /// ```
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable progress bars.
    ///
    /// Progress is also hidden when stderr is not a terminal, and when the
    /// `ATREF_NO_PROGRESS` environment variable is set.
    #[arg(
        long,
        global = true,
        env = "ATREF_NO_PROGRESS",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Inline `@path` references into self-contained documents.
    ///
    /// See [`compile::CompileCommand`] for detailed options and behavior.
    Compile(compile::CompileCommand),

    /// Report broken references without writing anything.
    ///
    /// See [`validate::ValidateCommand`] for detailed options and behavior.
    Validate(validate::ValidateCommand),

    /// Show how the documents of a folder depend on each other.
    Graph(graph::GraphCommand),

    /// List the references of one document with their resolution status.
    Refs(refs::RefsCommand),
}

impl Cli {
    /// Log filter implied by `--verbose` and `--quiet`.
    ///
    /// `None` leaves the choice to `RUST_LOG`.
    #[must_use]
    pub fn log_filter(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }

    /// Load configuration and run the chosen command.
    ///
    /// # Errors
    ///
    /// Fails when the configuration or the command's input cannot be loaded.
    pub fn execute(self) -> Result<Outcome> {
        let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
        let config = AtrefConfig::load(self.config.as_deref(), &cwd)?;
        let ctx = self.build_context(config, cwd);
        self.execute_with_context(&ctx)
    }

    /// Command context for this invocation.
    #[must_use]
    pub fn build_context(&self, config: AtrefConfig, cwd: PathBuf) -> CommandContext {
        CommandContext {
            config,
            cwd,
            quiet: self.quiet,
            progress: !self.no_progress && !self.quiet,
        }
    }

    /// Run the chosen command with an explicit context.
    ///
    /// # Errors
    ///
    /// See [`Cli::execute`].
    pub fn execute_with_context(self, ctx: &CommandContext) -> Result<Outcome> {
        match self.command {
            Commands::Compile(cmd) => cmd.execute(ctx),
            Commands::Validate(cmd) => cmd.execute(ctx),
            Commands::Graph(cmd) => cmd.execute(ctx),
            Commands::Refs(cmd) => cmd.execute(ctx),
        }
    }
}
