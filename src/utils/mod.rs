//! Shared utilities
//!
//! - [`fs`] - the [`FileSystem`](fs::FileSystem) abstraction, atomic writes and
//!   path normalization
//! - [`progress`] - progress bars for folder compilation

pub mod fs;
pub mod progress;

pub use fs::{
    FileKind, FileSystem, MemoryFileSystem, OsFileSystem, absolutize, atomic_write, normalize_path,
};
pub use progress::ProgressBar;
