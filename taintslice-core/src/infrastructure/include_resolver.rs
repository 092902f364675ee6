//! Include resolver
//!
//! Recovers PHP file-inclusion directives (`include`, `include_once`,
//! `require`, `require_once` in parenthesized-quoted, bare-quoted and
//! unquoted forms) and resolves each literal against the including
//! file's directory. Literals that do not resolve to an existing file
//! are kept verbatim; literals that start with `$` (fully dynamic
//! targets) are skipped, but embedded variables deeper in a literal
//! are kept so basename matching can still connect them.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use crate::infrastructure::read_lossy;
use crate::infrastructure::scanner::SourceFile;

const DIRECTIVES: &[&str] = &["include", "include_once", "require", "require_once"];

static INCLUDE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let mut patterns = Vec::new();
    for directive in DIRECTIVES {
        patterns.push(format!(
            r#"(?i){directive}\s*\(\s*['"]([^'"]+)['"]\s*\)"#
        ));
        patterns.push(format!(r#"(?i){directive}\s+['"]([^'"]+)['"]"#));
        patterns.push(format!(r"(?i){directive}\s+([a-zA-Z0-9_\-\./]+\.php)"));
    }
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
});

/// Root-relative including file to the list of its include targets.
/// Repeated directives for the same target are kept as duplicates.
#[derive(Debug, Clone, Default)]
pub struct IncludeMap {
    edges: BTreeMap<PathBuf, Vec<String>>,
}

impl IncludeMap {
    pub fn get(&self, file: &Path) -> Option<&[String]> {
        self.edges.get(file).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<String>)> {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<PathBuf, Vec<String>> {
        self.edges
    }

    /// Files whose include list refers to `target`, matching on the
    /// resolved string, the bare file name, or the dependency's own
    /// file name. Each including file is reported once.
    pub fn files_including(&self, target: &Path) -> Vec<PathBuf> {
        let target_str = target.to_string_lossy();
        let target_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.edges
            .iter()
            .filter(|(_, deps)| {
                deps.iter().any(|dep| {
                    let dep_basename = Path::new(dep)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    dep.as_str() == target_str || *dep == target_name || target_name == dep_basename
                })
            })
            .map(|(file, _)| file.clone())
            .collect()
    }
}

/// Builds the project include map.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeResolver;

impl IncludeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Scan every file's lines for inclusion directives. Files with no
    /// directives carry no key in the map.
    #[instrument(skip_all, fields(root = %root.display(), files = files.len()))]
    pub fn resolve(&self, root: &Path, files: &[SourceFile]) -> IncludeMap {
        let mut edges: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

        for file in files {
            let Some(source) = read_lossy(&file.path) else {
                continue;
            };
            let base_dir = file.path.parent().unwrap_or(root);
            let mut deps = Vec::new();
            for text in source.lines() {
                for pattern in INCLUDE_PATTERNS.iter() {
                    for caps in pattern.captures_iter(text) {
                        let literal = caps[1].trim();
                        if literal.is_empty() || literal.starts_with('$') {
                            continue;
                        }
                        deps.push(resolve_literal(root, base_dir, literal));
                    }
                }
            }
            if !deps.is_empty() {
                edges.insert(file.rel_path.clone(), deps);
            }
        }

        debug!(files = edges.len(), "Resolved include dependencies");
        IncludeMap { edges }
    }
}

/// Resolve one include literal. Absolute literals are taken as-is;
/// relative ones are joined to the including file's directory and
/// normalized. When the candidate exists it is reported relative to
/// the project root; otherwise the raw literal is kept.
fn resolve_literal(root: &Path, base_dir: &Path, literal: &str) -> String {
    let candidate = if literal.starts_with('/') {
        PathBuf::from(literal)
    } else {
        normalize(&base_dir.join(literal))
    };

    if candidate.exists() {
        candidate
            .strip_prefix(root)
            .unwrap_or(&candidate)
            .to_string_lossy()
            .into_owned()
    } else {
        literal.to_string()
    }
}

/// Lexical path normalization: drops `.` segments and folds `..`
/// against preceding components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_file(root: &Path, rel: &str, content: &str) -> SourceFile {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        SourceFile {
            path,
            rel_path: PathBuf::from(rel),
        }
    }

    #[test]
    fn each_directive_syntax_is_recognized() {
        let dir = tempfile::tempdir().unwrap();
        let _target = source_file(dir.path(), "lib.php", "<?php\n");
        let files = vec![
            source_file(dir.path(), "a.php", "<?php\ninclude('lib.php');\n"),
            source_file(dir.path(), "b.php", "require_once 'lib.php';\n"),
            source_file(dir.path(), "c.php", "include_once lib.php;\n"),
            source_file(dir.path(), "lib.php", "<?php\n"),
        ];

        let map = IncludeResolver::new().resolve(dir.path(), &files);
        for rel in ["a.php", "b.php", "c.php"] {
            let deps = map.get(Path::new(rel)).unwrap();
            assert_eq!(deps, &["lib.php".to_string()], "file {rel}");
        }
        assert!(map.get(Path::new("lib.php")).is_none());
    }

    #[test]
    fn repeated_directives_keep_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        source_file(dir.path(), "lib.php", "<?php\n");
        let files = vec![source_file(
            dir.path(),
            "a.php",
            "<?php\ninclude 'lib.php';\ninclude 'lib.php';\n",
        )];

        let map = IncludeResolver::new().resolve(dir.path(), &files);
        assert_eq!(map.get(Path::new("a.php")).unwrap().len(), 2);
    }

    #[test]
    fn unresolvable_literal_is_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![source_file(
            dir.path(),
            "a.php",
            "<?php\ninclude '../outside/missing.php';\n",
        )];

        let map = IncludeResolver::new().resolve(dir.path(), &files);
        assert_eq!(
            map.get(Path::new("a.php")).unwrap(),
            &["../outside/missing.php".to_string()]
        );
    }

    #[test]
    fn dynamic_literals_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![source_file(
            dir.path(),
            "a.php",
            "<?php\ninclude($path);\ninclude \"$dir/lib.php\";\n",
        )];

        let map = IncludeResolver::new().resolve(dir.path(), &files);
        assert!(map.is_empty());
    }

    #[test]
    fn embedded_variable_literal_is_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![source_file(
            dir.path(),
            "a.php",
            "<?php\ninclude 'inc/$env/target.php';\n",
        )];

        let map = IncludeResolver::new().resolve(dir.path(), &files);
        assert_eq!(
            map.get(Path::new("a.php")).unwrap(),
            &["inc/$env/target.php".to_string()]
        );
        let including = map.files_including(Path::new("subdir/target.php"));
        assert_eq!(including, vec![PathBuf::from("a.php")]);
    }

    #[test]
    fn relative_segments_resolve_through_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        source_file(dir.path(), "shared/util.php", "<?php\n");
        let files = vec![source_file(
            dir.path(),
            "app/main.php",
            "<?php\nrequire '../shared/util.php';\n",
        )];

        let map = IncludeResolver::new().resolve(dir.path(), &files);
        assert_eq!(
            map.get(Path::new("app/main.php")).unwrap(),
            &["shared/util.php".to_string()]
        );
    }

    #[test]
    fn files_including_matches_by_name_and_path() {
        let dir = tempfile::tempdir().unwrap();
        source_file(dir.path(), "lib.php", "<?php\n");
        let files = vec![
            source_file(dir.path(), "a.php", "<?php\ninclude 'lib.php';\n"),
            source_file(dir.path(), "b.php", "<?php\ninclude 'other.php';\n"),
        ];

        let map = IncludeResolver::new().resolve(dir.path(), &files);
        let including = map.files_including(Path::new("lib.php"));
        assert_eq!(including, vec![PathBuf::from("a.php")]);
        assert!(map.files_including(Path::new("unrelated.php")).is_empty());
    }
}
