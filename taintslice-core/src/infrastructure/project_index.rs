//! Project-wide indices
//!
//! Two derived views over the scanned file list: where every function
//! name is defined, and where every name is called from. Both are
//! rebuilt from scratch per run and keyed with ordered maps so the
//! emitted report is deterministic.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, instrument, warn};

use crate::domain::entities::{CallSite, Definition};
use crate::infrastructure::call_extractor::{CallExtractor, CallRecognizer};
use crate::infrastructure::function_locator::SpanRecognizer;
use crate::infrastructure::read_lossy;
use crate::infrastructure::scanner::SourceFile;

/// Function name to its definition sites across the project. A name
/// defined in several files keeps every site, in scan order.
#[derive(Debug, Clone, Default)]
pub struct FunctionIndex {
    definitions: BTreeMap<String, Vec<Definition>>,
}

impl FunctionIndex {
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn build<R: SpanRecognizer>(files: &[SourceFile], recognizer: &R) -> Self {
        let mut definitions: BTreeMap<String, Vec<Definition>> = BTreeMap::new();

        for file in files {
            let Some(source) = read_lossy(&file.path) else {
                warn!(file = %file.path.display(), "Skipping unreadable file while indexing definitions");
                continue;
            };
            for (index, text) in source.lines().enumerate() {
                if let Some(name) = recognizer.definition_name(text) {
                    definitions.entry(name).or_default().push(Definition {
                        file: file.rel_path.clone(),
                        line: index as u32 + 1,
                        code: text.trim().to_string(),
                    });
                }
            }
        }

        debug!(functions = definitions.len(), "Indexed project function definitions");
        Self { definitions }
    }

    pub fn get(&self, name: &str) -> Option<&[Definition]> {
        self.definitions.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Callee name to every call site of that name across the project.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    sites: BTreeMap<String, Vec<CallSite>>,
}

impl CallGraph {
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn build<R: CallRecognizer>(files: &[SourceFile], extractor: &CallExtractor<R>) -> Self {
        let mut sites: BTreeMap<String, Vec<CallSite>> = BTreeMap::new();

        for file in files {
            for call in extractor.extract(&file.path) {
                sites.entry(call.callee.clone()).or_default().push(CallSite {
                    callee: call.callee,
                    caller_file: file.rel_path.clone(),
                    line: call.line,
                    code: call.code,
                });
            }
        }

        debug!(callees = sites.len(), "Indexed project call sites");
        Self { sites }
    }

    /// All call sites whose callee is `name`, in scan order.
    pub fn callers_of(&self, name: &str) -> &[CallSite] {
        self.sites.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
