//! Check runner
//!
//! Resolves the applicable checks for a [`RepoContext`], runs them on a
//! bounded rayon pool (or sequentially), converts errors and panics into
//! failing results, then scores the run and assembles the [`ScanReport`].
//! Results always come back in registry order, whatever the execution order.

use crate::cache::ScanCache;
use crate::checks::{get_applicable_checks, Check, CheckContext};
use crate::config::ScanConfig;
use crate::context::{analyze_repo, RepoContext};
use crate::models::{Category, CheckResult, QuickWin, ScanReport, Severity};
use crate::scoring::{
    calculate_category_scores, calculate_overall_score, default_weights,
    evaluate_production_readiness, CategoryWeights, Thresholds,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Number of failing checks surfaced as quick wins
pub const MAX_QUICK_WINS: usize = 5;

/// Called after each check with `(check_id, completed, total)`
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Options for one run
pub struct RunOptions {
    pub parallel: bool,
    /// Worker pool size when `parallel` is set
    pub max_concurrency: usize,
    /// When false every read goes to disk
    pub enable_cache: bool,
    /// Enable list; empty means every category
    pub categories: Vec<Category>,
    pub excluded_categories: Vec<Category>,
    pub exclude_checks: Vec<String>,
    pub weights: CategoryWeights,
    pub thresholds: Thresholds,
    pub progress: Option<ProgressCallback>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for RunOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            parallel: config.parallel,
            max_concurrency: config.max_concurrency.max(1),
            enable_cache: config.enable_cache,
            categories: config.categories.clone(),
            excluded_categories: config.disabled_categories.clone(),
            exclude_checks: config.exclude_checks.clone(),
            weights: config.weights.clone(),
            thresholds: config.thresholds,
            progress: None,
        }
    }
}

impl RunOptions {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn selects(&self, check: &Check) -> bool {
        (self.categories.is_empty() || self.categories.contains(&check.category))
            && !self.excluded_categories.contains(&check.category)
            && !self.exclude_checks.iter().any(|id| id == check.id)
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("parallel", &self.parallel)
            .field("max_concurrency", &self.max_concurrency)
            .field("enable_cache", &self.enable_cache)
            .field("categories", &self.categories)
            .field("excluded_categories", &self.excluded_categories)
            .field("exclude_checks", &self.exclude_checks)
            .field("weights", &self.weights)
            .field("thresholds", &self.thresholds)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Analyze `repo_path` and run every applicable check with a fresh cache
pub fn scan_repository(repo_path: &Path, config: &ScanConfig) -> ScanReport {
    let cache = if config.enable_cache {
        ScanCache::with_ttl(Duration::from_secs(config.cache_ttl_secs))
    } else {
        ScanCache::disabled()
    };
    let context = analyze_repo(repo_path, &cache);
    run_all_checks(&context, &RunOptions::from(config), &cache)
}

/// Run the applicable checks for `context` and build the report
pub fn run_all_checks(context: &RepoContext, options: &RunOptions, cache: &ScanCache) -> ScanReport {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let start = Instant::now();

    let uncached;
    let cache = if options.enable_cache {
        cache
    } else {
        uncached = ScanCache::disabled();
        &uncached
    };

    let checks: Vec<Check> = get_applicable_checks(context)
        .into_iter()
        .filter(|c| options.selects(c))
        .collect();
    info!(
        "Running {} checks on {} ({})",
        checks.len(),
        context.path.display(),
        if options.parallel {
            format!("{} workers", options.max_concurrency)
        } else {
            "sequential".to_string()
        }
    );

    let ctx = CheckContext::new(context, cache);
    let results = execute(&checks, &ctx, options);

    let report = build_report(context, &checks, results, options, timestamp);
    debug!("Cache after run: {:?}", cache.stats());
    info!(
        "Scan finished in {:?}: score {}, {} of {} checks failed, production ready: {}",
        start.elapsed(),
        report.score,
        report.failed().count(),
        report.results.len(),
        report.production_ready
    );
    report
}

fn execute(checks: &[Check], ctx: &CheckContext<'_>, options: &RunOptions) -> Vec<CheckResult> {
    let completed = AtomicUsize::new(0);
    let total = checks.len();
    let run_one = |check: &Check| {
        let result = run_single_check(check, ctx);
        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(ref callback) = options.progress {
            callback(check.id, done, total);
        }
        result
    };

    if options.parallel {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_concurrency.max(1))
            .build()
        {
            Ok(pool) => return pool.install(|| checks.par_iter().map(&run_one).collect()),
            Err(e) => warn!("Could not start worker pool, running sequentially: {}", e),
        }
    }
    checks.iter().map(&run_one).collect()
}

/// Run one check, turning an error or a panic into a failing result
fn run_single_check(check: &Check, ctx: &CheckContext<'_>) -> CheckResult {
    let start = Instant::now();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (check.run)(ctx)));

    let mut result = CheckResult {
        check_id: check.id.to_string(),
        title: check.title.to_string(),
        category: check.category,
        severity: check.severity,
        passed: false,
        message: None,
        error: None,
        auto_fixable: None,
    };

    match outcome {
        Ok(Ok(outcome)) => {
            debug!(
                "Check {} {} in {:?}",
                check.id,
                if outcome.passed { "passed" } else { "failed" },
                start.elapsed()
            );
            result.passed = outcome.passed;
            result.message = Some(outcome.message);
            result.error = outcome.error;
            result.auto_fixable = outcome.auto_fixable;
        }
        Ok(Err(e)) => {
            warn!("Check {} errored: {:#}", check.id, e);
            result.message = Some("Check could not be completed".to_string());
            result.error = Some(format!("{:#}", e));
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Check {} panicked: {}", check.id, panic_msg);
            result.message = Some("Check could not be completed".to_string());
            result.error = Some(format!("Panic: {}", panic_msg));
        }
    }
    result
}

fn build_report(
    context: &RepoContext,
    checks: &[Check],
    results: Vec<CheckResult>,
    options: &RunOptions,
    timestamp: String,
) -> ScanReport {
    let mock_ids: HashSet<&str> = checks
        .iter()
        .filter(|c| c.mock_placeholder)
        .map(|c| c.id)
        .collect();
    let is_mock = |r: &CheckResult| mock_ids.contains(r.check_id.as_str());

    let weights = if options.weights.is_empty() {
        default_weights()
    } else {
        options.weights.clone()
    };
    let raw_scores = calculate_category_scores(&results);
    let overall = calculate_overall_score(&results, &raw_scores, &weights, is_mock).round();
    let category_scores: BTreeMap<Category, f64> = raw_scores
        .into_iter()
        .map(|(category, score)| (category, score.round()))
        .collect();

    let readiness = evaluate_production_readiness(
        &results,
        &category_scores,
        overall,
        &options.thresholds,
        is_mock,
    );
    let quick_wins = quick_wins(&results);

    ScanReport {
        score: overall,
        results,
        timestamp,
        repo_path: context.path.display().to_string(),
        category_scores,
        production_ready: readiness.production_ready,
        readiness_reasons: readiness.reasons,
        quick_wins,
    }
}

/// First failing non-blocker results, with an effort estimate
pub fn quick_wins(results: &[CheckResult]) -> Vec<QuickWin> {
    results
        .iter()
        .filter(|r| !r.passed && r.severity != Severity::Blocker)
        .take(MAX_QUICK_WINS)
        .map(|r| QuickWin {
            check_id: r.check_id.clone(),
            title: r.title.clone(),
            category: r.category,
            severity: r.severity,
            effort: estimate_effort(r).to_string(),
            instruction: format!("{}: {}", r.title, r.message.as_deref().unwrap_or("fix this check")),
        })
        .collect()
}

fn estimate_effort(result: &CheckResult) -> &'static str {
    if result.auto_fixable == Some(true) {
        return "5 minutes";
    }
    match result.severity {
        Severity::Low => "15 minutes",
        Severity::Medium => "1 hour",
        Severity::High | Severity::Blocker => "half a day",
    }
}
