//! Integration test suite for atref
//!
//! End-to-end tests driving the library API against real temporary
//! directories and the `atref` binary through `assert_cmd`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **compile**: Single-document compilation through the binary
//! - **folder**: Folder compilation, ordering and cross-document dedup
//! - **graph**: The `graph` command
//! - **refs**: The `refs` command
//! - **validate**: The `validate` command and configuration handling

use assert_cmd::Command;

mod compile;
mod folder;
mod graph;
mod refs;
mod validate;

/// The `atref` binary, run from `dir` with progress and colors disabled.
pub fn atref(dir: &std::path::Path) -> Command {
    atref_cli::test_utils::init_test_logging(None);
    let mut cmd = Command::cargo_bin("atref").unwrap();
    cmd.current_dir(dir)
        .env("ATREF_NO_PROGRESS", "1")
        .env("NO_COLOR", "1")
        .env_remove("CLICOLOR_FORCE")
        .env_remove("RUST_LOG");
    cmd
}
