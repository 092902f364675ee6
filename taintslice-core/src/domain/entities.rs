//! Analysis entities and the result document contract
//!
//! All line numbers are exact 1-based source lines; the external
//! extraction tooling re-reads the original files by these numbers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Best-effort lexical boundaries of one function.
///
/// A span named [`FunctionSpan::GLOBAL`] covering the whole file
/// stands in for code outside any detected function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpan {
    pub name: String,
    pub file: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
}

impl FunctionSpan {
    /// Name of the synthetic span for code outside any function.
    pub const GLOBAL: &'static str = "global";

    pub fn contains(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn is_global(&self) -> bool {
        self.name == Self::GLOBAL
    }
}

/// A call-like construct found in one file's line stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub callee: String,
    pub line: u32,
    pub code: String,
}

/// A [`Call`] tagged with the file it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee: String,
    pub caller_file: PathBuf,
    pub line: u32,
    pub code: String,
}

/// One definition site of a named function. The same name may be
/// defined in several files; that ambiguity is surfaced, not resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub file: PathBuf,
    pub line: u32,
    pub code: String,
}

/// A line matched by one source or sink pattern. A line matching k
/// patterns yields k records, and the same line may appear in both
/// the source and the sink sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub file: PathBuf,
    pub line: u32,
    pub code: String,
    pub pattern: String,
}

/// One candidate cross-file flow: the target location in one file and
/// a sink detected in a file that directly includes the target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintPath {
    pub source_file: PathBuf,
    pub source_line: u32,
    pub source_sources: Vec<PatternMatch>,
    pub sink_file: PathBuf,
    pub sink_line: u32,
    pub sink_code: String,
    pub connection_type: String,
    pub include_chain: Vec<PathBuf>,
}

/// The target function as embedded in `called_from` chain records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFunction {
    pub name: String,
    pub file: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
    pub sources: Vec<PatternMatch>,
    pub sinks: Vec<PatternMatch>,
}

/// Where the target function is called from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerRef {
    pub file: PathBuf,
    pub line: u32,
    pub code: String,
}

/// The target function's side of a `calls` chain record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallingFunction {
    pub name: String,
    pub file: PathBuf,
    pub call_line: u32,
    pub call_code: String,
}

/// The callee's definition site in a `calls` chain record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalledFunction {
    pub name: String,
    pub file: PathBuf,
    pub definition_line: u32,
    pub definition_code: String,
}

/// One function call chain record; two variants of one polymorphic
/// concept, serialized by field shape rather than a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionChain {
    /// Someone calls the target function.
    CalledFrom {
        target_function: TargetFunction,
        called_from: CallerRef,
    },
    /// The target function calls a defined function; a callee with
    /// several definitions yields one record per definition.
    Calls {
        calling_function: CallingFunction,
        called_function: CalledFunction,
    },
}

/// The resolved analysis target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub file: PathBuf,
    pub line: u32,
    pub function: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// Aggregate counts for quick reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_chains: usize,
    pub cross_file_paths: usize,
    pub project_sources: usize,
    pub project_sinks: usize,
    pub target_sources: usize,
    pub target_sinks: usize,
    pub joern_usages: usize,
}

/// The result document handed to external reporting/extraction
/// tooling. Maps are ordered so the emitted JSON is deterministic;
/// files with zero matches are omitted from the sparse maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub target: TargetInfo,
    pub joern_usages: Vec<String>,
    pub function_chains: Vec<FunctionChain>,
    pub cross_file_taint_paths: Vec<TaintPath>,
    pub all_sources: BTreeMap<PathBuf, Vec<PatternMatch>>,
    pub all_sinks: BTreeMap<PathBuf, Vec<PatternMatch>>,
    pub include_dependencies: BTreeMap<PathBuf, Vec<String>>,
    pub sources_in_target: Vec<PatternMatch>,
    pub sinks_in_target: Vec<PatternMatch>,
    pub summary: Summary,
}
