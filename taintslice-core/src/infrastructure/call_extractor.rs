//! Call extractor
//!
//! Recovers call-like constructs from source lines with shape
//! regexes: free calls, variable calls, member calls and static
//! calls. A line can yield several records, and the free-call shape
//! intentionally also fires on definition lines and inside member and
//! static call text; downstream consumers filter by name, so the
//! extra records are surfaced rather than suppressed.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::entities::Call;
use crate::infrastructure::read_lossy;

static CALL_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"([a-zA-Z_][a-zA-Z0-9_]*)\s*\(",
        r"\$([a-zA-Z_][a-zA-Z0-9_]*)\s*\(",
        r"->([a-zA-Z_][a-zA-Z0-9_]*)\s*\(",
        r"::([a-zA-Z_][a-zA-Z0-9_]*)\s*\(",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

/// Control keywords whose parenthesized form is not a call.
const KEYWORD_DENYLIST: &[&str] = &["if", "while", "for", "foreach", "switch", "echo", "print"];

/// Recognizes the callee names a single line contains.
pub trait CallRecognizer {
    fn calls_in_line(&self, line: &str) -> Vec<String>;
}

/// PHP call shapes, with control keywords filtered out.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpCallRecognizer;

impl CallRecognizer for PhpCallRecognizer {
    fn calls_in_line(&self, line: &str) -> Vec<String> {
        let mut names = Vec::new();
        for shape in CALL_SHAPES.iter() {
            for caps in shape.captures_iter(line) {
                let name = &caps[1];
                // Exact match only: the exclusion is case-sensitive.
                if KEYWORD_DENYLIST.contains(&name) {
                    continue;
                }
                names.push(name.to_string());
            }
        }
        names
    }
}

/// Extracts all call records from a file's line stream.
#[derive(Debug, Clone, Default)]
pub struct CallExtractor<R: CallRecognizer = PhpCallRecognizer> {
    recognizer: R,
}

impl CallExtractor<PhpCallRecognizer> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CallRecognizer> CallExtractor<R> {
    pub fn with_recognizer(recognizer: R) -> Self {
        Self { recognizer }
    }

    /// All calls in `file`; an unreadable file yields no calls.
    pub fn extract(&self, file: &Path) -> Vec<Call> {
        match read_lossy(file) {
            Some(source) => self.extract_from_source(&source),
            None => Vec::new(),
        }
    }

    pub fn extract_from_source(&self, source: &str) -> Vec<Call> {
        let mut calls = Vec::new();
        for (index, text) in source.lines().enumerate() {
            let line = index as u32 + 1;
            for callee in self.recognizer.calls_in_line(text) {
                calls.push(Call {
                    callee,
                    line,
                    code: text.trim().to_string(),
                });
            }
        }
        calls
    }
}
