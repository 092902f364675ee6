//! taintslice - pattern-driven cross-file taint slicing for PHP
//! projects. `slice` runs the analysis and writes a JSON report;
//! `extract` renders the relevant code regions from a saved report.

mod commands;
mod exit_codes;

use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "taintslice",
    version,
    about = "Cross-file taint slicing for PHP projects",
    long_about = "Locates the function enclosing a target file/line, builds project-wide \
call and include graphs, scans for configured source/sink patterns, and reports \
cross-file taint paths and function call chains."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a target file/line and write the JSON report
    Slice(commands::slice::SliceArgs),
    /// Render code regions from a saved analysis report
    Extract(commands::extract::ExtractArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Slice(args) => commands::slice::run(args).await,
        Commands::Extract(args) => commands::extract::run(args),
    };

    let code = match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            exit_codes::INTERNAL_ERROR
        }
    };
    std::process::exit(code);
}
