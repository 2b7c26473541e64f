//! Test workspace builder for simplified test setup
//!
//! Writes a tree of documents (and optionally an `atref.toml`) into a
//! temporary directory that lives as long as the returned [`TestWorkspace`].

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::AtrefConfig;
use crate::constants::CONFIG_FILE_NAME;

/// A builder for creating test workspaces with a fluent API
pub struct TestWorkspaceBuilder {
    temp_dir: TempDir,
    root: PathBuf,
    config: Option<String>,
    files: Vec<(String, String)>,
}

impl TestWorkspaceBuilder {
    /// Create a new test workspace builder
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();

        Ok(Self {
            temp_dir,
            root,
            config: None,
            files: Vec::new(),
        })
    }

    /// Use a subdirectory of the temp directory as the workspace root
    pub fn with_root_dir(mut self, name: &str) -> Self {
        self.root = self.temp_dir.path().join(name);
        self
    }

    /// Write `content` as the workspace's `atref.toml`
    pub fn with_config(mut self, content: impl Into<String>) -> Self {
        self.config = Some(content.into());
        self
    }

    /// Add a document to be created in the workspace
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Add multiple documents to be created in the workspace
    pub fn with_files(mut self, files: Vec<(&str, &str)>) -> Self {
        for (path, content) in files {
            self.files.push((path.to_string(), content.to_string()));
        }
        self
    }

    /// Build the test workspace
    pub fn build(self) -> Result<TestWorkspace> {
        std::fs::create_dir_all(&self.root)?;

        if let Some(config) = &self.config {
            // Fail early on a config the loader would reject
            AtrefConfig::parse(config)?;
            std::fs::write(self.root.join(CONFIG_FILE_NAME), config)?;
        }

        for (path, content) in &self.files {
            let full_path = self.root.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full_path, content)?;
        }

        Ok(TestWorkspace {
            _temp_dir: self.temp_dir,
            root: self.root,
        })
    }
}

/// A built test workspace
pub struct TestWorkspace {
    _temp_dir: TempDir, // Keep temp dir alive
    /// Workspace root
    pub root: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace builder
    pub fn builder() -> Result<TestWorkspaceBuilder> {
        TestWorkspaceBuilder::new()
    }

    /// Create an empty workspace
    pub fn new() -> Result<Self> {
        TestWorkspaceBuilder::new()?.build()
    }

    /// Absolute path of a workspace-relative path
    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Check if a file exists in the workspace
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.root.join(path).exists()
    }

    /// Read a file from the workspace
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String> {
        Ok(std::fs::read_to_string(self.root.join(path))?)
    }

    /// Write a file to the workspace
    pub fn write_file(&self, path: impl AsRef<Path>, content: impl AsRef<str>) -> Result<()> {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full_path, content.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_workspace() {
        let ws = TestWorkspace::builder()
            .unwrap()
            .with_file("readme.md", "# Readme")
            .with_file("docs/nested.md", "nested content")
            .build()
            .unwrap();

        assert!(ws.file_exists("readme.md"));
        assert!(ws.file_exists("docs/nested.md"));
        assert_eq!(ws.read_file("readme.md").unwrap(), "# Readme");
    }

    #[test]
    fn test_builder_writes_config() {
        let ws = TestWorkspace::builder()
            .unwrap()
            .with_root_dir("project")
            .with_config("max_depth = 2\n")
            .build()
            .unwrap();

        assert!(ws.root.ends_with("project"));
        assert_eq!(ws.read_file(CONFIG_FILE_NAME).unwrap(), "max_depth = 2\n");
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = TestWorkspace::builder().unwrap().with_config("unknown_key = 1").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_write_file_creates_parents() {
        let ws = TestWorkspace::new().unwrap();
        ws.write_file("a/b/c.md", "deep").unwrap();
        assert_eq!(ws.read_file("a/b/c.md").unwrap(), "deep");
    }
}
