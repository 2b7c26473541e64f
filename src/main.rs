//! atref CLI entry point
//!
//! Parses arguments, sets up logging on stderr, runs the command and maps the
//! outcome to the exit status:
//!
//! - `0` - success
//! - `1` - failed references, failed validation, or an error
//! - `2` - invalid usage (reported by clap)

use atref_cli::cli;
use atref_cli::core::error::user_friendly_error;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let filter = match cli.log_filter() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    match cli.execute() {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
