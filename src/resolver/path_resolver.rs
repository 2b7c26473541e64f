//! Turning a reference's path text into an absolute file system path.
//!
//! Resolution order:
//!
//! 1. An absolute path that exists is used as-is.
//! 2. Otherwise a leading `/` is stripped and the rest joined to the base
//!    directory, so `@/docs/a.md` means "`docs/a.md` under the base".
//! 3. `./x`, `../x` and plain `x` are joined to the base directory.
//!
//! For the chosen candidate the file system is probed in order: the candidate
//! itself, the candidate with each fallback extension appended, then
//! `candidate/index<ext>` for each extension. The first file found wins.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_EXTENSIONS, INDEX_FILE_STEM};
use crate::utils::fs::{FileKind, FileSystem, OsFileSystem, normalize_path};

/// Outcome of resolving one reference path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    /// Absolute path of the file found, or the last path probed
    pub absolute_path: PathBuf,
    /// Whether something exists at `absolute_path`
    pub exists: bool,
    /// Whether `absolute_path` is a directory without an index file
    pub is_directory: bool,
    /// Diagnostic message when no file was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolvedPath {
    /// Whether the reference points at a readable target.
    pub fn is_file(&self) -> bool {
        self.exists && !self.is_directory
    }
}

/// Options for [`resolve_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Directory relative paths are joined to
    pub base_path: PathBuf,
    /// Suffixes probed when the path does not exist as written
    pub extensions: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        }
    }
}

impl ResolveOptions {
    /// Options resolving against `base_path` with the default extensions.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Replace the fallback extensions. `md` and `.md` are equivalent.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions.into_iter().map(|e| normalize_extension(e.as_ref())).collect();
        self
    }
}

/// Ensure an extension carries its leading dot.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

/// Resolve against the real file system.
pub fn resolve_path(path: &str, options: &ResolveOptions) -> ResolvedPath {
    resolve_path_with(&OsFileSystem, path, options)
}

/// Resolve against any [`FileSystem`].
pub fn resolve_path_with(
    fs: &dyn FileSystem,
    path: &str,
    options: &ResolveOptions,
) -> ResolvedPath {
    let base = absolute_base(&options.base_path);

    let as_written = Path::new(path);
    if as_written.is_absolute() {
        if let Some(found) = probe(fs, &normalize_path(as_written), &options.extensions).found() {
            return found;
        }
    }

    let relative = path.trim_start_matches('/');
    let candidate = normalize_path(&base.join(relative));
    let probed = probe(fs, &candidate, &options.extensions);
    tracing::trace!("Resolved '{}' against {} to {:?}", path, base.display(), probed);
    probed.into_resolved()
}

fn absolute_base(base: &Path) -> PathBuf {
    if base.is_absolute() {
        normalize_path(base)
    } else {
        crate::utils::fs::absolutize(base).unwrap_or_else(|_| normalize_path(base))
    }
}

#[derive(Debug)]
enum Probe {
    File(PathBuf),
    Directory(PathBuf),
    Missing(PathBuf),
}

impl Probe {
    fn found(self) -> Option<ResolvedPath> {
        match self {
            Probe::Missing(_) => None,
            other => Some(other.into_resolved()),
        }
    }

    fn into_resolved(self) -> ResolvedPath {
        match self {
            Probe::File(path) => ResolvedPath {
                absolute_path: path,
                exists: true,
                is_directory: false,
                error: None,
            },
            Probe::Directory(path) => ResolvedPath {
                error: Some(format!("Path is a directory: {}", path.display())),
                absolute_path: path,
                exists: true,
                is_directory: true,
            },
            Probe::Missing(path) => ResolvedPath {
                error: Some(format!("File not found: {}", path.display())),
                absolute_path: path,
                exists: false,
                is_directory: false,
            },
        }
    }
}

fn probe(fs: &dyn FileSystem, candidate: &Path, extensions: &[String]) -> Probe {
    let kind = fs.kind(candidate);
    if kind == Some(FileKind::File) {
        return Probe::File(candidate.to_path_buf());
    }

    let mut last_probed = candidate.to_path_buf();

    if kind.is_none() {
        for ext in extensions {
            let mut with_ext = candidate.as_os_str().to_os_string();
            with_ext.push(normalize_extension(ext));
            let with_ext = PathBuf::from(with_ext);
            if fs.kind(&with_ext) == Some(FileKind::File) {
                return Probe::File(with_ext);
            }
            last_probed = with_ext;
        }
    }

    for ext in extensions {
        let index = candidate.join(format!("{INDEX_FILE_STEM}{}", normalize_extension(ext)));
        if fs.kind(&index) == Some(FileKind::File) {
            return Probe::File(index);
        }
        last_probed = index;
    }

    if kind == Some(FileKind::Directory) {
        Probe::Directory(candidate.to_path_buf())
    } else {
        Probe::Missing(last_probed)
    }
}
