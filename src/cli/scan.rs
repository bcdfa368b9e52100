//! Scan command - run the checks and print or write the report

use super::ScanArgs;
use crate::cache::ScanCache;
use crate::config::ScanConfig;
use crate::context::analyze_repo;
use crate::reporters::{self, OutputFormat};
use crate::runner::{run_all_checks, RunOptions};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::info;

/// Run the scan command
pub fn run(path: &Path, args: &ScanArgs) -> Result<()> {
    let repo_path = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    if !repo_path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", repo_path.display());
    }

    let format = OutputFormat::from_str(&args.format)?;
    let config = merge_flags(
        ScanConfig::load_or_default(&repo_path, args.config.as_deref()),
        args,
    );
    info!("Scanning {} with {:?}", repo_path.display(), config);

    let start = Instant::now();
    let cache = if config.enable_cache {
        ScanCache::with_ttl(Duration::from_secs(config.cache_ttl_secs))
    } else {
        ScanCache::disabled()
    };
    let context = analyze_repo(&repo_path, &cache);

    let show_progress = !args.quiet && format == OutputFormat::Text && console::user_attended_stderr();
    let mut options = RunOptions::from(&config);
    let bar = show_progress.then(progress_bar);
    if let Some(bar) = &bar {
        let bar = bar.clone();
        options = options.with_progress(Box::new(move |id: &str, done: usize, total: usize| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
            bar.set_message(id.to_string());
        }));
    }

    let report = run_all_checks(&context, &options, &cache);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    info!(
        "Scan finished in {:.2}s ({} checks)",
        start.elapsed().as_secs_f64(),
        report.results.len()
    );

    let output = reporters::render(&report, format)?;
    match &args.output {
        Some(out_path) => {
            std::fs::write(out_path, &output)
                .with_context(|| format!("Failed to write {}", out_path.display()))?;
            eprintln!("Report written to: {}", style(out_path.display()).cyan());
        }
        None => println!("{}", output),
    }

    if args.fail_on_not_ready && !report.production_ready {
        eprintln!("Failing due to --fail-on-not-ready");
        std::process::exit(1);
    }
    Ok(())
}

/// Layer command-line flags over the loaded configuration
fn merge_flags(mut config: ScanConfig, args: &ScanArgs) -> ScanConfig {
    if args.sequential {
        config.parallel = false;
    }
    if let Some(n) = args.max_concurrency {
        config.max_concurrency = n;
    }
    if args.no_cache {
        config.enable_cache = false;
    }
    if !args.category.is_empty() {
        config.categories = args.category.clone();
    }
    for id in &args.exclude {
        if !config.exclude_checks.contains(id) {
            config.exclude_checks.push(id.clone());
        }
    }
    config
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}
