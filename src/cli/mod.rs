//! CLI command definitions and handlers

mod checks;
mod init;
mod scan;

use crate::config::MAX_WORKERS;
use crate::models::Category;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Parse and validate a worker count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("max concurrency must be at least 1".to_string())
    } else if n > MAX_WORKERS {
        Err(format!("max concurrency cannot exceed {}", MAX_WORKERS))
    } else {
        Ok(n)
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_str(s)
}

/// shipready - production-readiness scoring for repositories
///
/// Runs fast, file-based checks against a repository and answers one
/// question: is this ready to ship?
#[derive(Parser, Debug)]
#[command(name = "shipready")]
#[command(
    version,
    about = "Score a repository's production readiness across security, testing, devops and more",
    after_help = "\
Examples:
  shipready .                              Scan the current directory
  shipready scan . --format json           JSON output for scripting
  shipready scan . --category security     Only run security checks
  shipready scan . --fail-on-not-ready     Exit code 1 unless production ready (CI mode)
  shipready checks --category testing      List the testing checks
  shipready init                           Write a shipready.toml template"
)]
pub struct Cli {
    /// Path to repository (default: current directory)
    #[arg(global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a repository and report its production readiness
    #[command(after_help = "\
Examples:
  shipready scan .                                 Scan current directory
  shipready scan . --format markdown -o report.md  Markdown report for PR comments
  shipready scan . --exclude doc-005 --exclude ops-004   Skip specific checks
  shipready scan . --sequential --no-cache         Deterministic single-threaded run")]
    Scan(ScanArgs),

    /// List the registered checks
    Checks {
        /// Only list checks in this category (repeatable)
        #[arg(long, short = 'c', value_parser = parse_category)]
        category: Vec<Category>,
    },

    /// Write a shipready.toml template with the default settings
    Init,
}

/// Flags for `scan`
#[derive(clap::Args, Debug, Default)]
pub struct ScanArgs {
    /// Output format: text, json, markdown (or md)
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "markdown", "md"])]
    pub format: String,

    /// Write the report to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Explicit config file (.toml or .json) instead of the project config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only run checks in this category (repeatable)
    #[arg(long, short = 'c', value_parser = parse_category)]
    pub category: Vec<Category>,

    /// Skip a check by id (repeatable, adds to exclude_checks from config)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Run checks one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Worker pool size (1-64)
    #[arg(long, value_parser = parse_workers)]
    pub max_concurrency: Option<usize>,

    /// Disable the per-run file cache
    #[arg(long)]
    pub no_cache: bool,

    /// Exit with code 1 when the repository is not production ready
    #[arg(long)]
    pub fail_on_not_ready: bool,

    /// Hide the progress bar
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Scan(args)) => scan::run(&cli.path, &args),
        Some(Commands::Checks { category }) => checks::run(&category),
        Some(Commands::Init) => init::run(&cli.path),
        None => scan::run(
            &cli.path,
            &ScanArgs {
                format: "text".to_string(),
                ..ScanArgs::default()
            },
        ),
    }
}
