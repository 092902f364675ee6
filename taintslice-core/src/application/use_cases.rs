//! Slice analysis use case
//!
//! Orchestrates the full pipeline for one target location: locate the
//! enclosing function, enumerate the project, build definition and
//! call-site indices, scan source/sink patterns, resolve include
//! dependencies, then assemble cross-file taint paths and function
//! call chains into one report.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::domain::entities::{
    AnalysisReport, CalledFunction, CallerRef, CallingFunction, FunctionChain, FunctionSpan,
    Summary, TaintPath, TargetFunction, TargetInfo,
};
use crate::domain::patterns::PatternSet;
use crate::infrastructure::call_extractor::CallExtractor;
use crate::infrastructure::function_locator::FunctionLocator;
use crate::infrastructure::include_resolver::IncludeResolver;
use crate::infrastructure::joern::{usages_best_effort, JoernSlicer, UsageProvider};
use crate::infrastructure::project_index::{CallGraph, FunctionIndex};
use crate::infrastructure::scanner::ProjectScanner;
use crate::infrastructure::source_sink_scanner::SourceSinkScanner;

/// Connection label for paths built from direct file inclusion.
pub const INCLUDE_DEPENDENCY: &str = "include_dependency";

/// One analysis request: project root plus target file and line. The
/// file may be given relative to the root or absolute.
#[derive(Debug, Clone)]
pub struct SliceRequest {
    pub root: PathBuf,
    pub file: PathBuf,
    pub line: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SliceError {
    #[error("Target file {file} (line {line}) could not be read")]
    TargetNotFound { file: PathBuf, line: u32 },
}

/// The slice analysis pipeline. Holds no per-run state; every call to
/// [`execute`](Self::execute) derives everything fresh from the tree.
pub struct SliceAnalysisUseCase {
    scanner: ProjectScanner,
    locator: FunctionLocator,
    extractor: CallExtractor,
    usage_provider: Box<dyn UsageProvider>,
}

impl Default for SliceAnalysisUseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl SliceAnalysisUseCase {
    pub fn new() -> Self {
        Self {
            scanner: ProjectScanner::new(),
            locator: FunctionLocator::new(),
            extractor: CallExtractor::new(),
            usage_provider: JoernSlicer::detect_provider(),
        }
    }

    pub fn with_usage_provider(mut self, provider: Box<dyn UsageProvider>) -> Self {
        self.usage_provider = provider;
        self
    }

    #[instrument(skip(self, patterns), fields(root = %request.root.display(), file = %request.file.display(), line = request.line))]
    pub async fn execute(
        &self,
        request: &SliceRequest,
        patterns: &PatternSet,
    ) -> Result<AnalysisReport, SliceError> {
        let target_abs = if request.file.is_absolute() {
            request.file.clone()
        } else {
            request.root.join(&request.file)
        };
        let target_rel = target_abs
            .strip_prefix(&request.root)
            .unwrap_or(&target_abs)
            .to_path_buf();

        let span = self
            .locator
            .locate(&target_abs, request.line)
            .ok_or_else(|| SliceError::TargetNotFound {
                file: request.file.clone(),
                line: request.line,
            })?;
        info!(
            function = %span.name,
            start = span.start_line,
            end = span.end_line,
            "Located target function"
        );

        let joern_usages = usages_best_effort(
            self.usage_provider.as_ref(),
            &request.root,
            &target_rel,
            request.line,
        )
        .await;

        let files = self.scanner.scan(&request.root);
        let index = FunctionIndex::build(&files, self.locator.recognizer());
        let graph = CallGraph::build(&files, &self.extractor);

        let sink_scanner = SourceSinkScanner::new(patterns);
        let project = sink_scanner.scan_project(&files);
        let target_matches = sink_scanner.scan_file(&target_abs, &target_rel);

        let includes = IncludeResolver::new().resolve(&request.root, &files);
        let taint_paths = self.assemble_taint_paths(&target_rel, request.line, &project, &includes);

        let mut chains = self.called_from_chains(&span, &target_rel, &target_matches, &graph);
        chains.extend(self.calls_chains(&span, &target_abs, &target_rel, &index));
        debug!(
            chains = chains.len(),
            taint_paths = taint_paths.len(),
            "Assembled chains and cross-file paths"
        );

        let summary = Summary {
            total_chains: chains.len(),
            cross_file_paths: taint_paths.len(),
            project_sources: project.source_count(),
            project_sinks: project.sink_count(),
            target_sources: target_matches.sources.len(),
            target_sinks: target_matches.sinks.len(),
            joern_usages: joern_usages.len(),
        };

        Ok(AnalysisReport {
            target: TargetInfo {
                file: target_rel,
                line: request.line,
                function: span.name,
                start_line: span.start_line,
                end_line: span.end_line,
            },
            joern_usages,
            function_chains: chains,
            cross_file_taint_paths: taint_paths,
            all_sources: project.sources.clone(),
            all_sinks: project.sinks.clone(),
            include_dependencies: includes.into_inner(),
            sources_in_target: target_matches.sources,
            sinks_in_target: target_matches.sinks,
            summary,
        })
    }

    /// One candidate path per (including file, sink in that file)
    /// pair: a file that directly includes the target file can observe
    /// values the target file produces.
    fn assemble_taint_paths(
        &self,
        target_rel: &Path,
        target_line: u32,
        project: &crate::infrastructure::source_sink_scanner::ProjectMatches,
        includes: &crate::infrastructure::include_resolver::IncludeMap,
    ) -> Vec<TaintPath> {
        let target_sources = project
            .sources
            .get(target_rel)
            .cloned()
            .unwrap_or_default();

        let mut paths = Vec::new();
        for including in includes.files_including(target_rel) {
            let Some(sinks) = project.sinks.get(&including) else {
                continue;
            };
            for sink in sinks {
                paths.push(TaintPath {
                    source_file: target_rel.to_path_buf(),
                    source_line: target_line,
                    source_sources: target_sources.clone(),
                    sink_file: including.clone(),
                    sink_line: sink.line,
                    sink_code: sink.code.clone(),
                    connection_type: INCLUDE_DEPENDENCY.to_string(),
                    include_chain: vec![target_rel.to_path_buf(), including.clone()],
                });
            }
        }
        paths
    }

    /// Chains pointing at the target: every project call site whose
    /// callee matches the target function's name. The name is looked
    /// up as-is, so a `global` target matches calls to a function
    /// literally named `global`.
    fn called_from_chains(
        &self,
        span: &FunctionSpan,
        target_rel: &Path,
        target_matches: &crate::infrastructure::source_sink_scanner::FileMatches,
        graph: &CallGraph,
    ) -> Vec<FunctionChain> {
        graph
            .callers_of(&span.name)
            .iter()
            .map(|site| FunctionChain::CalledFrom {
                target_function: TargetFunction {
                    name: span.name.clone(),
                    file: target_rel.to_path_buf(),
                    start_line: span.start_line,
                    end_line: span.end_line,
                    sources: target_matches.sources.clone(),
                    sinks: target_matches.sinks.clone(),
                },
                called_from: CallerRef {
                    file: site.caller_file.clone(),
                    line: site.line,
                    code: site.code.clone(),
                },
            })
            .collect()
    }

    /// Chains leaving the target: every call extracted from the
    /// target file whose callee has a known definition, fanned out
    /// per definition site. The whole file is considered, not just
    /// the target function's span.
    fn calls_chains(
        &self,
        span: &FunctionSpan,
        target_abs: &Path,
        target_rel: &Path,
        index: &FunctionIndex,
    ) -> Vec<FunctionChain> {
        let mut chains = Vec::new();
        for call in self.extractor.extract(target_abs) {
            let Some(definitions) = index.get(&call.callee) else {
                continue;
            };
            for definition in definitions {
                chains.push(FunctionChain::Calls {
                    calling_function: CallingFunction {
                        name: span.name.clone(),
                        file: target_rel.to_path_buf(),
                        call_line: call.line,
                        call_code: call.code.clone(),
                    },
                    called_function: CalledFunction {
                        name: call.callee.clone(),
                        file: definition.file.clone(),
                        definition_line: definition.line,
                        definition_code: definition.code.clone(),
                    },
                });
            }
        }
        chains
    }
}
