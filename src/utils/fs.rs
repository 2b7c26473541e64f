//! File system access for the compiler.
//!
//! Every core operation reads documents through the [`FileSystem`] trait so the
//! same compiler runs against the real disk ([`OsFileSystem`]) and against an
//! in-memory tree ([`MemoryFileSystem`]) in tests and editor integrations that
//! hold unsaved buffers.
//!
//! # Examples
//!
//! ```rust
//! use atref_cli::utils::fs::{FileKind, FileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new()
//!     .with_file("/docs/index.md", "# Index\n\n@./guide.md\n")
//!     .with_file("/docs/guide.md", "# Guide\n");
//!
//! assert_eq!(fs.kind(Path::new("/docs")), Some(FileKind::Directory));
//! assert_eq!(fs.kind(Path::new("/docs/guide.md")), Some(FileKind::File));
//! assert_eq!(fs.list_files(Path::new("/docs")).unwrap().len(), 2);
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::file_error::{FileOperation, FileOperationError, FileResultExt};

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file
    File,
    /// A directory
    Directory,
}

/// Blocking file system operations needed by the compiler.
pub trait FileSystem {
    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Classify a path, or `None` when nothing exists there.
    fn kind(&self, path: &Path) -> Option<FileKind>;

    /// Every file below `dir`, recursively, sorted by path.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Replace the contents of `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// The real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn kind(&self, path: &Path) -> Option<FileKind> {
        let metadata = std::fs::metadata(path).ok()?;
        if metadata.is_dir() {
            Some(FileKind::Directory)
        } else {
            Some(FileKind::File)
        }
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(dir).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Loops and vanished entries are skipped, an unreadable root is not
                    if e.depth() == 0 {
                        return Err(e.into());
                    }
                    tracing::debug!("Skipping unreadable entry below {}: {}", dir.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        atomic_write(path, contents.as_bytes())
    }
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The temporary file is created next to the target so the final rename never
/// crosses file systems. Readers see either the old or the new content.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// An in-memory file system.
///
/// Directories exist implicitly for every ancestor of a stored file. Writes
/// land in the same map, so a test can compile a folder "in place" and read
/// the results back.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    /// Create an empty in-memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files().insert(normalize_path(&path.into()), contents.into());
    }

    /// Current contents of a file, if present.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files().get(&normalize_path(path.as_ref())).cloned()
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let path = normalize_path(path);
        let files = self.files();
        if let Some(contents) = files.get(&path) {
            return Ok(contents.clone());
        }
        if files.keys().any(|p| p.starts_with(&path)) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        Err(io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display())))
    }

    fn kind(&self, path: &Path) -> Option<FileKind> {
        let path = normalize_path(path);
        let files = self.files();
        if files.contains_key(&path) {
            Some(FileKind::File)
        } else if files.keys().any(|p| p.starts_with(&path)) {
            Some(FileKind::Directory)
        } else {
            None
        }
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let dir = normalize_path(dir);
        match self.kind(&dir) {
            Some(FileKind::Directory) => {}
            Some(FileKind::File) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", dir.display()),
                ));
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", dir.display()),
                ));
            }
        }
        // BTreeMap keys are already sorted
        Ok(self.files().keys().filter(|p| p.starts_with(&dir) && **p != dir).cloned().collect())
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.insert(path, contents);
        Ok(())
    }
}

/// Read a document, attaching operation context to any failure.
pub fn read_document(
    fs: &dyn FileSystem,
    path: &Path,
    purpose: &str,
    caller: &str,
) -> Result<String, FileOperationError> {
    fs.read_to_string(path).with_file_context(FileOperation::Read, path, purpose, caller)
}

/// Normalizes a path by resolving `.` and `..` components lexically.
///
/// No file system access happens, so symlinks are not followed.
///
/// ```rust
/// use atref_cli::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_path(Path::new("/foo/./bar/../baz")), PathBuf::from("/foo/baz"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {} // Skip .
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `..` above the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Make a path absolute against the current directory, then normalize it.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    Ok(normalize_path(&std::path::absolute(path)?))
}
