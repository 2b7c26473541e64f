//! Test utilities for atref
//!
//! Helpers for writing tests: logging that plays well with the test harness,
//! and temporary workspaces holding document trees.
//!
//! # Example
//!
//! ```rust,no_run
//! use atref_cli::test_utils::TestWorkspace;
//!
//! let ws = TestWorkspace::builder()
//!     .unwrap()
//!     .with_file("readme.md", "@./install.md")
//!     .with_file("install.md", "# Install")
//!     .build()
//!     .unwrap();
//!
//! assert!(ws.file_exists("install.md"));
//! ```

pub mod builder;

pub use builder::{TestWorkspace, TestWorkspaceBuilder};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// This function initializes the tracing subscriber for tests, but only once
/// regardless of how many times it's called. It respects the `RUST_LOG` environment
/// variable if set, or uses the provided log level.
///
/// # Arguments
///
/// * `level` - Optional log level to use. If None, uses `RUST_LOG` environment variable
///
/// # Example
///
/// ```rust,no_run
/// use tracing::Level;
///
/// fn my_test() {
///     // Use environment variable
///     atref_cli::test_utils::init_test_logging(None);
///
///     // Or set level programmatically
///     atref_cli::test_utils::init_test_logging(Some(Level::DEBUG));
/// }
/// ```
///
/// To enable logging in tests via environment variable:
/// ```bash
/// RUST_LOG=atref_cli=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            // No logging if neither is provided
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
