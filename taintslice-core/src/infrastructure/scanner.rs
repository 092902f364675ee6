//! Project directory scanner
//!
//! Enumerates the PHP files of a source tree in a deterministic order,
//! skipping version-control and dependency directories.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

/// File extension the analysis operates on.
pub const SOURCE_EXTENSION: &str = "php";

const DEFAULT_EXCLUDE_DIRS: &[&str] = &[".git", "vendor", "node_modules"];

/// One source file, carrying both the absolute path used for reading
/// and the root-relative path used in reported records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub rel_path: PathBuf,
}

/// Walks a project root and collects its PHP files.
#[derive(Debug, Clone)]
pub struct ProjectScanner {
    exclude_dirs: Vec<String>,
}

impl Default for ProjectScanner {
    fn default() -> Self {
        Self {
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ProjectScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude_dirs(exclude_dirs: Vec<String>) -> Self {
        Self { exclude_dirs }
    }

    /// Collect all PHP files under `root`, sorted by file name at each
    /// directory level so repeated runs enumerate identically.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn scan(&self, root: &Path) -> Vec<SourceFile> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !self.exclude_dirs.iter().any(|dir| name == dir.as_str())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    trace!(%error, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_source = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
                .unwrap_or(false);
            if !is_source {
                continue;
            }
            let rel_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            files.push(SourceFile {
                path: path.to_path_buf(),
                rel_path,
            });
        }

        debug!(count = files.len(), "Collected project source files");
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn collects_only_php_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.php", "<?php\n");
        write(dir.path(), "lib/util.php", "<?php\n");
        write(dir.path(), "README.md", "docs\n");

        let files = ProjectScanner::new().scan(dir.path());
        let rels: Vec<_> = files.iter().map(|f| f.rel_path.clone()).collect();
        assert_eq!(
            rels,
            vec![PathBuf::from("index.php"), PathBuf::from("lib/util.php")]
        );
    }

    #[test]
    fn excluded_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.php", "<?php\n");
        write(dir.path(), "vendor/dep.php", "<?php\n");
        write(dir.path(), "node_modules/pkg/x.php", "<?php\n");
        write(dir.path(), ".git/hook.php", "<?php\n");

        let files = ProjectScanner::new().scan(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, PathBuf::from("app.php"));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Upper.PHP", "<?php\n");

        let files = ProjectScanner::new().scan(dir.path());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn empty_tree_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectScanner::new().scan(dir.path()).is_empty());
    }
}
