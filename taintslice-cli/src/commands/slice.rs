//! `slice` subcommand: run the full analysis and write the report.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use taintslice_core::application::use_cases::{SliceAnalysisUseCase, SliceRequest};
use taintslice_core::config;
use taintslice_core::domain::entities::{AnalysisReport, FunctionChain};
use taintslice_core::domain::patterns::PatternSet;

use crate::exit_codes;

#[derive(Args)]
pub struct SliceArgs {
    /// Project source root to analyze
    #[arg(long)]
    pub src: PathBuf,

    /// Target file, relative to the source root
    #[arg(long)]
    pub file: PathBuf,

    /// Target line number (1-based)
    #[arg(long)]
    pub line: u32,

    /// Output report path
    #[arg(long, default_value = "function_chains.json")]
    pub output: PathBuf,

    /// YAML pattern configuration
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Plain-text source patterns, one regex per line (overrides the
    /// YAML configuration)
    #[arg(long)]
    pub sources: Option<PathBuf>,

    /// Plain-text sink patterns, one regex per line (overrides the
    /// YAML configuration)
    #[arg(long)]
    pub sinks: Option<PathBuf>,
}

pub async fn run(args: SliceArgs) -> anyhow::Result<i32> {
    if args.line == 0 {
        eprintln!("Error: --line must be 1 or greater");
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let patterns = load_patterns(&args);
    info!(
        sources = patterns.sources.len(),
        sinks = patterns.sinks.len(),
        "Loaded pattern set"
    );

    let request = SliceRequest {
        root: args.src.clone(),
        file: args.file.clone(),
        line: args.line,
    };
    let use_case = SliceAnalysisUseCase::new();
    let report = match use_case.execute(&request, &patterns).await {
        Ok(report) => report,
        Err(error) => {
            eprintln!("Error: {error}");
            return Ok(exit_codes::ANALYSIS_ERROR);
        }
    };

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;
    info!(output = %args.output.display(), "Wrote analysis report");

    print_summary(&report);
    Ok(exit_codes::SUCCESS)
}

fn load_patterns(args: &SliceArgs) -> PatternSet {
    if args.sources.is_some() || args.sinks.is_some() {
        config::load_pattern_set_from_text(args.sources.as_deref(), args.sinks.as_deref())
    } else {
        config::load_pattern_set(&args.config)
    }
}

fn print_summary(report: &AnalysisReport) {
    println!(
        "Target: {}:{} in function '{}' (lines {}-{})",
        report.target.file.display(),
        report.target.line,
        report.target.function,
        report.target.start_line,
        report.target.end_line
    );
    println!(
        "Found {} function chains, {} cross-file taint paths",
        report.summary.total_chains, report.summary.cross_file_paths
    );
    println!(
        "Project: {} sources, {} sinks; target: {} sources, {} sinks",
        report.summary.project_sources,
        report.summary.project_sinks,
        report.summary.target_sources,
        report.summary.target_sinks
    );

    for path in report.cross_file_taint_paths.iter().take(3) {
        println!(
            "  [{}] {} -> {}:{} {}",
            path.connection_type,
            path.source_file.display(),
            path.sink_file.display(),
            path.sink_line,
            path.sink_code
        );
    }
    for chain in report.function_chains.iter().take(3) {
        match chain {
            FunctionChain::CalledFrom {
                target_function,
                called_from,
            } => println!(
                "  {} called from {}:{}",
                target_function.name,
                called_from.file.display(),
                called_from.line
            ),
            FunctionChain::Calls {
                calling_function,
                called_function,
            } => println!(
                "  {} calls {} (defined {}:{})",
                calling_function.name,
                called_function.name,
                called_function.file.display(),
                called_function.definition_line
            ),
        }
    }
}
