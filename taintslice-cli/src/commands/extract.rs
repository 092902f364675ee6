//! `extract` subcommand: render the code regions a saved report
//! points at, re-reading the project sources by path and line.

use std::path::{Path, PathBuf};

use clap::Args;

use taintslice_core::domain::entities::{AnalysisReport, FunctionChain};
use taintslice_core::infrastructure::function_locator::FunctionLocator;

use crate::exit_codes;

const CONTEXT_LINES: u32 = 3;
const MAX_TAINT_PATHS: usize = 5;
const MAX_CHAINS: usize = 3;

#[derive(Args)]
pub struct ExtractArgs {
    /// Analysis report produced by `slice`
    #[arg(long, default_value = "function_chains.json")]
    pub result: PathBuf,

    /// Project source root the report was generated from
    #[arg(long)]
    pub src: PathBuf,

    /// Show cross-file taint path regions
    #[arg(long)]
    pub taint_paths: bool,

    /// Show the target location with its source/sink matches
    #[arg(long)]
    pub same_line: bool,

    /// Show function chain call and definition regions
    #[arg(long)]
    pub function_chains: bool,

    /// Print whole enclosing functions instead of fixed context
    #[arg(long)]
    pub function_level: bool,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<i32> {
    let content = match std::fs::read_to_string(&args.result) {
        Ok(content) => content,
        Err(error) => {
            eprintln!(
                "Error: cannot read report {}: {error}",
                args.result.display()
            );
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let report: AnalysisReport = match serde_json::from_str(&content) {
        Ok(report) => report,
        Err(error) => {
            eprintln!(
                "Error: cannot parse report {}: {error}",
                args.result.display()
            );
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    // No section flags selects every section.
    let all = !args.taint_paths && !args.same_line && !args.function_chains;

    if args.same_line || all {
        print_target_section(&args, &report);
    }
    if args.taint_paths || all {
        print_taint_path_section(&args, &report);
    }
    if args.function_chains || all {
        print_chain_section(&args, &report);
    }

    Ok(exit_codes::SUCCESS)
}

fn print_target_section(args: &ExtractArgs, report: &AnalysisReport) {
    println!("=== Target: {}:{} ===", report.target.file.display(), report.target.line);
    print_region(args, &report.target.file, report.target.line);

    if !report.sources_in_target.is_empty() {
        println!("Sources in target:");
        for source in &report.sources_in_target {
            println!("  line {}: {} [{}]", source.line, source.code, source.pattern);
        }
    }
    if !report.sinks_in_target.is_empty() {
        println!("Sinks in target:");
        for sink in &report.sinks_in_target {
            println!("  line {}: {} [{}]", sink.line, sink.code, sink.pattern);
        }
    }
    println!();
}

fn print_taint_path_section(args: &ExtractArgs, report: &AnalysisReport) {
    let total = report.cross_file_taint_paths.len();
    println!("=== Cross-file taint paths ({total}) ===");
    for (index, path) in report
        .cross_file_taint_paths
        .iter()
        .take(MAX_TAINT_PATHS)
        .enumerate()
    {
        println!(
            "--- Path {} [{}]: {} -> {} ---",
            index + 1,
            path.connection_type,
            path.source_file.display(),
            path.sink_file.display()
        );
        println!("Source side ({}:{}):", path.source_file.display(), path.source_line);
        print_region(args, &path.source_file, path.source_line);
        println!("Sink side ({}:{}):", path.sink_file.display(), path.sink_line);
        print_region(args, &path.sink_file, path.sink_line);
    }
    if total > MAX_TAINT_PATHS {
        println!("... {} more paths in the report", total - MAX_TAINT_PATHS);
    }
    println!();
}

fn print_chain_section(args: &ExtractArgs, report: &AnalysisReport) {
    let total = report.function_chains.len();
    println!("=== Function chains ({total}) ===");
    for (index, chain) in report.function_chains.iter().take(MAX_CHAINS).enumerate() {
        match chain {
            FunctionChain::CalledFrom {
                target_function,
                called_from,
            } => {
                println!(
                    "--- Chain {}: {} called from {}:{} ---",
                    index + 1,
                    target_function.name,
                    called_from.file.display(),
                    called_from.line
                );
                print_region(args, &called_from.file, called_from.line);
            }
            FunctionChain::Calls {
                calling_function,
                called_function,
            } => {
                println!(
                    "--- Chain {}: {} calls {} ---",
                    index + 1,
                    calling_function.name,
                    called_function.name
                );
                println!(
                    "Call site ({}:{}):",
                    calling_function.file.display(),
                    calling_function.call_line
                );
                print_region(args, &calling_function.file, calling_function.call_line);
                println!(
                    "Definition ({}:{}):",
                    called_function.file.display(),
                    called_function.definition_line
                );
                print_region(args, &called_function.file, called_function.definition_line);
            }
        }
    }
    if total > MAX_CHAINS {
        println!("... {} more chains in the report", total - MAX_CHAINS);
    }
    println!();
}

/// Print the region around `line`: the whole enclosing function when
/// requested, otherwise fixed context on both sides.
fn print_region(args: &ExtractArgs, rel_path: &Path, line: u32) {
    let path = args.src.join(rel_path);
    let Some(lines) = read_file_lines(&path) else {
        println!("    <unable to read {}>", path.display());
        return;
    };

    let (start, end) = if args.function_level {
        match FunctionLocator::new().locate(&path, line) {
            Some(span) => (span.start_line, span.end_line.min(lines.len() as u32)),
            None => context_bounds(line, lines.len() as u32),
        }
    } else {
        context_bounds(line, lines.len() as u32)
    };

    print_numbered(&lines, start, end, line);
}

fn context_bounds(line: u32, total: u32) -> (u32, u32) {
    let start = line.saturating_sub(CONTEXT_LINES).max(1);
    let end = (line + CONTEXT_LINES).min(total.max(1));
    (start, end)
}

fn read_file_lines(path: &Path) -> Option<Vec<String>> {
    std::fs::read(path).ok().map(|bytes| {
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    })
}

/// Numbered listing with a `>>> ` marker on the focal line.
fn print_numbered(lines: &[String], start: u32, end: u32, focal: u32) {
    for number in start..=end {
        let Some(text) = lines.get(number as usize - 1) else {
            break;
        };
        let marker = if number == focal { ">>> " } else { "    " };
        println!("{marker}{number:>5} | {text}");
    }
}
