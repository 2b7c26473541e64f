//! Run-scoped compilation state.
//!
//! One [`CompilationSession`] lives for one compilation run: a single file, or
//! every document of a folder. It holds two separate pieces of state:
//!
//! - how often each target was inlined or stubbed (the import counts)
//! - which targets have already been inlined in full somewhere in the run
//!
//! The ancestor chain used for cycle detection is not part of the session; it
//! belongs to a single top-level compile call.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Import counts and first-occurrence tracking for one run.
///
/// # Examples
///
/// ```rust
/// use atref_cli::compiler::CompilationSession;
/// use std::path::Path;
///
/// let mut session = CompilationSession::new();
/// let target = Path::new("/docs/common.md");
///
/// assert!(!session.has_imported(target));
/// session.record_import(target);
/// session.mark_imported(target);
/// session.record_import(target);
///
/// assert!(session.has_imported(target));
/// assert_eq!(session.stats().duplicates, vec![target.to_path_buf()]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct CompilationSession {
    import_counts: BTreeMap<PathBuf, usize>,
    imported: HashSet<PathBuf>,
}

impl CompilationSession {
    /// Start an empty run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more import of `path` and return the new count.
    pub fn record_import(&mut self, path: &Path) -> usize {
        let count = self.import_counts.entry(path.to_path_buf()).or_insert(0);
        *count += 1;
        *count
    }

    /// Note that `path` has been inlined in full.
    pub fn mark_imported(&mut self, path: &Path) {
        self.imported.insert(path.to_path_buf());
    }

    /// Whether `path` was already inlined in full during this run.
    pub fn has_imported(&self, path: &Path) -> bool {
        self.imported.contains(path)
    }

    /// How often `path` has been imported so far.
    pub fn import_count(&self, path: &Path) -> usize {
        self.import_counts.get(path).copied().unwrap_or(0)
    }

    /// Snapshot of the counts.
    pub fn stats(&self) -> ImportStats {
        ImportStats {
            counts: self.import_counts.clone(),
            duplicates: self
                .import_counts
                .iter()
                .filter(|(_, count)| **count > 1)
                .map(|(path, _)| path.clone())
                .collect(),
        }
    }
}

/// How often each target was imported during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Import count per absolute target path
    pub counts: BTreeMap<PathBuf, usize>,
    /// Targets imported more than once, in path order
    pub duplicates: Vec<PathBuf>,
}

impl ImportStats {
    /// Total imports across all targets.
    pub fn total_imports(&self) -> usize {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_monotonic() {
        let mut session = CompilationSession::new();
        let a = Path::new("/a.md");
        assert_eq!(session.record_import(a), 1);
        assert_eq!(session.record_import(a), 2);
        assert_eq!(session.import_count(a), 2);
        assert_eq!(session.import_count(Path::new("/b.md")), 0);
    }

    #[test]
    fn test_imported_set_is_separate_from_counts() {
        let mut session = CompilationSession::new();
        let a = Path::new("/a.md");
        session.record_import(a);
        assert!(!session.has_imported(a));
        session.mark_imported(a);
        assert!(session.has_imported(a));
    }

    #[test]
    fn test_stats_duplicates() {
        let mut session = CompilationSession::new();
        session.record_import(Path::new("/b.md"));
        session.record_import(Path::new("/a.md"));
        session.record_import(Path::new("/b.md"));

        let stats = session.stats();
        assert_eq!(stats.duplicates, vec![PathBuf::from("/b.md")]);
        assert_eq!(stats.total_imports(), 3);
    }
}
