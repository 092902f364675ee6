//! Source/sink pattern scanner
//!
//! Applies the compiled pattern set line by line. Matching is
//! independent per pattern: a line matching k patterns yields k
//! records, and a line may appear both as a source and as a sink.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::domain::entities::PatternMatch;
use crate::domain::patterns::{CompiledPattern, PatternSet};
use crate::infrastructure::read_lossy;
use crate::infrastructure::scanner::SourceFile;

/// Matches found in a single file.
#[derive(Debug, Clone, Default)]
pub struct FileMatches {
    pub sources: Vec<PatternMatch>,
    pub sinks: Vec<PatternMatch>,
}

/// Per-file match maps for the whole project. Files with zero matches
/// on a side carry no key there.
#[derive(Debug, Clone, Default)]
pub struct ProjectMatches {
    pub sources: BTreeMap<PathBuf, Vec<PatternMatch>>,
    pub sinks: BTreeMap<PathBuf, Vec<PatternMatch>>,
}

impl ProjectMatches {
    pub fn source_count(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.values().map(Vec::len).sum()
    }
}

/// Scans files against a compiled pattern set.
#[derive(Debug, Clone)]
pub struct SourceSinkScanner<'a> {
    patterns: &'a PatternSet,
}

impl<'a> SourceSinkScanner<'a> {
    pub fn new(patterns: &'a PatternSet) -> Self {
        Self { patterns }
    }

    /// Scan one file; an unreadable file yields empty matches.
    pub fn scan_file(&self, path: &Path, rel_path: &Path) -> FileMatches {
        match read_lossy(path) {
            Some(source) => self.scan_source(&source, rel_path),
            None => {
                warn!(file = %path.display(), "Skipping unreadable file while scanning patterns");
                FileMatches::default()
            }
        }
    }

    pub fn scan_source(&self, source: &str, rel_path: &Path) -> FileMatches {
        let mut matches = FileMatches::default();
        for (index, text) in source.lines().enumerate() {
            let line = index as u32 + 1;
            collect_matches(&self.patterns.sources, rel_path, line, text, &mut matches.sources);
            collect_matches(&self.patterns.sinks, rel_path, line, text, &mut matches.sinks);
        }
        matches
    }

    /// Scan the whole project into sparse per-file maps.
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn scan_project(&self, files: &[SourceFile]) -> ProjectMatches {
        let mut project = ProjectMatches::default();
        for file in files {
            let matches = self.scan_file(&file.path, &file.rel_path);
            if !matches.sources.is_empty() {
                project.sources.insert(file.rel_path.clone(), matches.sources);
            }
            if !matches.sinks.is_empty() {
                project.sinks.insert(file.rel_path.clone(), matches.sinks);
            }
        }
        debug!(
            sources = project.source_count(),
            sinks = project.sink_count(),
            "Scanned project for source and sink patterns"
        );
        project
    }
}

fn collect_matches(
    patterns: &[CompiledPattern],
    rel_path: &Path,
    line: u32,
    text: &str,
    out: &mut Vec<PatternMatch>,
) {
    for pattern in patterns {
        if pattern.regex.is_match(text) {
            out.push(PatternMatch {
                file: rel_path.to_path_buf(),
                line,
                code: text.trim().to_string(),
                pattern: pattern.raw.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(sources: &[&str], sinks: &[&str]) -> PatternSet {
        PatternSet::compile(
            sources.iter().map(|s| s.to_string()).collect(),
            sinks.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn line_matching_both_sides_appears_in_both() {
        let set = patterns(&[r"\$_GET"], &[r"exec\s*\("]);
        let scanner = SourceSinkScanner::new(&set);
        let matches = scanner.scan_source("exec($_GET['cmd']);\n", Path::new("a.php"));

        assert_eq!(matches.sources.len(), 1);
        assert_eq!(matches.sinks.len(), 1);
        assert_eq!(matches.sources[0].line, 1);
        assert_eq!(matches.sinks[0].code, "exec($_GET['cmd']);");
        assert_eq!(matches.sinks[0].pattern, r"exec\s*\(");
    }

    #[test]
    fn k_matching_patterns_yield_k_records() {
        let set = patterns(&[r"\$_GET", r"\$_"], &[]);
        let scanner = SourceSinkScanner::new(&set);
        let matches = scanner.scan_source("$x = $_GET['a'];\n", Path::new("a.php"));
        assert_eq!(matches.sources.len(), 2);
    }

    #[test]
    fn project_maps_are_sparse() {
        let dir = tempfile::tempdir().unwrap();
        let clean = dir.path().join("clean.php");
        let dirty = dir.path().join("dirty.php");
        std::fs::write(&clean, "<?php\n$x = 1;\n").unwrap();
        std::fs::write(&dirty, "system($cmd);\n").unwrap();
        let files = vec![
            SourceFile {
                path: clean,
                rel_path: PathBuf::from("clean.php"),
            },
            SourceFile {
                path: dirty,
                rel_path: PathBuf::from("dirty.php"),
            },
        ];

        let set = patterns(&[], &[r"system\s*\("]);
        let project = SourceSinkScanner::new(&set).scan_project(&files);
        assert!(project.sources.is_empty());
        assert_eq!(project.sinks.len(), 1);
        assert!(project.sinks.contains_key(Path::new("dirty.php")));
        assert_eq!(project.sink_count(), 1);
    }

    #[test]
    fn scanning_twice_yields_identical_ordered_matches() {
        let set = patterns(&[r"\$_GET", r"\$_POST"], &[r"exec\s*\(", r"system\s*\("]);
        let scanner = SourceSinkScanner::new(&set);
        let source = "$a = $_GET['x'];\nsystem($a);\nexec($_POST['y']);\n";

        let first = scanner.scan_source(source, Path::new("a.php"));
        let second = scanner.scan_source(source, Path::new("a.php"));
        assert_eq!(first.sources, second.sources);
        assert_eq!(first.sinks, second.sinks);

        let lines: Vec<u32> = first.sources.iter().map(|m| m.line).collect();
        assert_eq!(lines, vec![1, 3]);
        let sink_lines: Vec<u32> = first.sinks.iter().map(|m| m.line).collect();
        assert_eq!(sink_lines, vec![2, 3]);
    }

    #[test]
    fn empty_pattern_set_matches_nothing() {
        let set = PatternSet::default();
        let scanner = SourceSinkScanner::new(&set);
        let matches = scanner.scan_source("exec($_GET['cmd']);\n", Path::new("a.php"));
        assert!(matches.sources.is_empty());
        assert!(matches.sinks.is_empty());
    }
}
