//! Function locator
//!
//! Maps a file/line position to the function that lexically encloses
//! it. Spans are recovered line by line: a function runs from its
//! definition line to the line before the next definition, and the
//! last definition runs to end of file. Brace nesting is not tracked,
//! so a span may over-extend past the real closing brace; that slack
//! is acceptable for slicing context.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::domain::entities::FunctionSpan;
use crate::infrastructure::read_lossy;

static FUNCTION_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:public|private|protected)?\s*function\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*\(")
        .expect("valid regex")
});

/// Recognizes function definition lines for one source language.
pub trait SpanRecognizer {
    /// The defined function's name, if `line` opens a definition.
    fn definition_name(&self, line: &str) -> Option<String>;
}

/// PHP definition lines: `function name(`, optionally preceded by a
/// visibility modifier, case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpSpanRecognizer;

impl SpanRecognizer for PhpSpanRecognizer {
    fn definition_name(&self, line: &str) -> Option<String> {
        FUNCTION_DEF
            .captures(line)
            .map(|caps| caps[1].to_string())
    }
}

/// Locates the function span enclosing a target line.
#[derive(Debug, Clone, Default)]
pub struct FunctionLocator<R: SpanRecognizer = PhpSpanRecognizer> {
    recognizer: R,
}

impl FunctionLocator<PhpSpanRecognizer> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: SpanRecognizer> FunctionLocator<R> {
    pub fn with_recognizer(recognizer: R) -> Self {
        Self { recognizer }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Locate the span enclosing `line` in `file`, or `None` when the
    /// file cannot be read.
    pub fn locate(&self, file: &Path, line: u32) -> Option<FunctionSpan> {
        let source = read_lossy(file)?;
        Some(self.locate_in_source(&source, file, line))
    }

    /// Span-recovery over already-loaded source. Falls back to a
    /// whole-file `global` span when no definition encloses the line,
    /// including lines past end of file.
    pub fn locate_in_source(&self, source: &str, file: &Path, line: u32) -> FunctionSpan {
        let mut current: Option<(String, u32)> = None;
        let mut total: u32 = 0;

        for (index, text) in source.lines().enumerate() {
            let line_num = index as u32 + 1;
            total = line_num;
            if let Some(name) = self.recognizer.definition_name(text) {
                if let Some((open_name, start)) = current.take() {
                    if start <= line && line < line_num {
                        trace!(function = %open_name, start, end = line_num - 1, "Located enclosing function");
                        return FunctionSpan {
                            name: open_name,
                            file: file.to_path_buf(),
                            start_line: start,
                            end_line: line_num - 1,
                        };
                    }
                }
                current = Some((name, line_num));
            }
        }

        if let Some((name, start)) = current {
            if start <= line && line <= total {
                return FunctionSpan {
                    name,
                    file: file.to_path_buf(),
                    start_line: start,
                    end_line: total,
                };
            }
        }

        FunctionSpan {
            name: FunctionSpan::GLOBAL.to_string(),
            file: file.to_path_buf(),
            start_line: 1,
            end_line: total.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SOURCE: &str = "\
<?php
function alpha($x) {
    return $x + 1;
}
public function beta() {
    echo 'hi';
}
$top = alpha(2);
";

    fn locate(line: u32) -> FunctionSpan {
        FunctionLocator::new().locate_in_source(SOURCE, Path::new("t.php"), line)
    }

    #[test]
    fn line_inside_first_function() {
        let span = locate(3);
        assert_eq!(span.name, "alpha");
        assert_eq!(span.start_line, 2);
        assert_eq!(span.end_line, 4);
    }

    #[test]
    fn last_function_extends_to_end_of_file() {
        let span = locate(6);
        assert_eq!(span.name, "beta");
        assert_eq!(span.start_line, 5);
        assert_eq!(span.end_line, 8);
        assert!(span.contains(8));
    }

    #[test]
    fn line_before_any_definition_is_global() {
        let span = locate(1);
        assert!(span.is_global());
        assert_eq!(span.start_line, 1);
        assert_eq!(span.end_line, 8);
    }

    #[test]
    fn line_past_end_of_file_is_global() {
        let span = locate(999);
        assert!(span.is_global());
    }

    #[test]
    fn empty_source_yields_one_line_global_span() {
        let span = FunctionLocator::new().locate_in_source("", Path::new("e.php"), 1);
        assert!(span.is_global());
        assert_eq!(span.start_line, 1);
        assert_eq!(span.end_line, 1);
    }

    #[test]
    fn visibility_modifiers_and_case_are_accepted() {
        let recognizer = PhpSpanRecognizer;
        assert_eq!(
            recognizer.definition_name("  private Function Handler() {"),
            Some("Handler".to_string())
        );
        assert_eq!(recognizer.definition_name("$f = function () {"), None);
    }

    #[test]
    fn missing_file_returns_none() {
        let locator = FunctionLocator::new();
        assert!(locator.locate(&PathBuf::from("/no/such/file.php"), 1).is_none());
    }
}
