//! shipready - production-readiness scoring for source repositories
//!
//! Detects a repository's stack, runs the applicable checks on a bounded
//! worker pool, scores each category and decides whether the codebase is
//! ready to ship.
//!
//! ```no_run
//! use shipready::{config::ScanConfig, runner::scan_repository};
//! use std::path::Path;
//!
//! let repo = Path::new(".");
//! let report = scan_repository(repo, &ScanConfig::load_or_default(repo, None));
//! println!("{} / 100, ready: {}", report.score, report.production_ready);
//! ```

pub mod cache;
pub mod checks;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod reporters;
pub mod runner;
pub mod scoring;

pub use config::ScanConfig;
pub use context::{analyze_repo, RepoContext};
pub use models::{Category, CheckResult, QuickWin, ScanReport, Severity};
pub use runner::{run_all_checks, scan_repository, RunOptions};
