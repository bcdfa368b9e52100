//! Configuration module for shipready
//!
//! Layers, lowest precedence first:
//! - Built-in defaults ([`ScanConfig::default`])
//! - User config (`~/.config/shipready/config.toml`)
//! - Project config (`shipready.toml` or `.shipreadyrc.json` in the repository)
//! - An explicit `--config` file, which replaces the project config
//! - CLI flags, applied by the caller
//!
//! Invalid values are dropped key by key with a warning; the rest of the
//! file still applies.

mod project_config;
mod user_config;

pub use project_config::{
    find_project_config, load_config_file, load_project_config, ConfigFile, RunSection,
    ThresholdOverrides, PROJECT_CONFIG_FILES,
};
pub use user_config::{load_user_config, user_config_path};

use crate::error::ConfigError;
use crate::models::Category;
use crate::scoring::{default_weights, CategoryWeights, Thresholds};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Upper bound applied to the worker count from any layer
pub const MAX_WORKERS: usize = 64;

/// Fully resolved scan settings
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub parallel: bool,
    pub max_concurrency: usize,
    pub enable_cache: bool,
    pub cache_ttl_secs: u64,
    /// Enable list; empty means every category
    pub categories: Vec<Category>,
    pub disabled_categories: Vec<Category>,
    pub exclude_checks: Vec<String>,
    pub weights: CategoryWeights,
    pub thresholds: Thresholds,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_concurrency: default_concurrency(),
            enable_cache: true,
            cache_ttl_secs: crate::cache::DEFAULT_TTL.as_secs(),
            categories: Vec::new(),
            disabled_categories: Vec::new(),
            exclude_checks: Vec::new(),
            weights: default_weights(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Available parallelism, capped at 16
fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
        .min(16)
}

impl ScanConfig {
    /// Resolve defaults, user config and project (or explicit) config
    ///
    /// Only a broken explicit file is an error; user and project files that
    /// fail to parse are skipped with a warning.
    pub fn load(repo_path: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(user) = load_user_config() {
            config.apply_logged(&user);
        }
        match explicit {
            Some(path) => {
                let file = load_config_file(path)?;
                config.apply_logged(&file);
            }
            None => {
                if let Some(project) = load_project_config(repo_path) {
                    config.apply_logged(&project);
                }
            }
        }
        Ok(config)
    }

    /// [`ScanConfig::load`], falling back to the layers below a broken explicit file
    pub fn load_or_default(repo_path: &Path, explicit: Option<&Path>) -> Self {
        match Self::load(repo_path, explicit) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; continuing without it", e);
                let mut config = Self::default();
                if let Some(user) = load_user_config() {
                    config.apply_logged(&user);
                }
                config
            }
        }
    }

    fn apply_logged(&mut self, file: &ConfigFile) {
        for problem in self.apply(file) {
            warn!("Ignoring config value: {}", problem);
        }
    }

    /// Merge `file` over the current values, returning rejected keys
    pub fn apply(&mut self, file: &ConfigFile) -> Vec<ConfigError> {
        let mut problems = Vec::new();
        let run = &file.run;

        if let Some(parallel) = run.parallel {
            self.parallel = parallel;
        }
        if let Some(n) = run.max_concurrency {
            if n == 0 {
                problems.push(invalid("run.max_concurrency", "must be at least 1"));
            } else {
                self.max_concurrency = n.min(MAX_WORKERS);
            }
        }
        if let Some(enable) = run.enable_cache {
            self.enable_cache = enable;
        }
        if let Some(ttl) = run.cache_ttl_secs {
            self.cache_ttl_secs = ttl;
        }
        if let Some(names) = &run.categories {
            self.categories = parse_categories("run.categories", names, &mut problems);
        }
        if let Some(names) = &run.disabled_categories {
            self.disabled_categories =
                parse_categories("run.disabled_categories", names, &mut problems);
        }
        if let Some(ids) = &run.exclude_checks {
            self.exclude_checks = ids.clone();
        }

        for (name, weight) in &file.weights {
            let key = format!("weights.{name}");
            match Category::from_str(name) {
                Err(e) => problems.push(invalid(&key, &e)),
                Ok(_) if !weight.is_finite() || *weight < 0.0 => {
                    problems.push(invalid(&key, "must be a non-negative number"))
                }
                Ok(category) => {
                    self.weights.insert(category, *weight);
                }
            }
        }

        let t = &file.thresholds;
        let targets = [
            ("security", t.security, &mut self.thresholds.security),
            ("devops", t.devops, &mut self.thresholds.devops),
            ("testing", t.testing, &mut self.thresholds.testing),
            ("codeQuality", t.code_quality, &mut self.thresholds.code_quality),
            ("overall", t.overall, &mut self.thresholds.overall),
        ];
        for (name, value, target) in targets {
            let Some(value) = value else { continue };
            if (0.0..=100.0).contains(&value) {
                *target = value;
            } else {
                problems.push(invalid(&format!("thresholds.{name}"), "must be between 0 and 100"));
            }
        }

        problems
    }

    /// Whether checks of `category` run under this config
    pub fn category_enabled(&self, category: Category) -> bool {
        (self.categories.is_empty() || self.categories.contains(&category))
            && !self.disabled_categories.contains(&category)
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_categories(key: &str, names: &[String], problems: &mut Vec<ConfigError>) -> Vec<Category> {
    names
        .iter()
        .filter_map(|name| match Category::from_str(name) {
            Ok(c) => Some(c),
            Err(e) => {
                problems.push(invalid(key, &e));
                None
            }
        })
        .collect()
}

/// Commented starting point written by `shipready init`
pub const CONFIG_TEMPLATE: &str = r#"# shipready configuration
# Every key is optional; remove what you do not need.

[run]
# Run checks on a worker pool
parallel = true
# max_concurrency = 8
enable_cache = true
cache_ttl_secs = 300
# Only run these categories (empty = all)
categories = []
disabled_categories = []
# Check ids to skip, e.g. "cq-001"
exclude_checks = []

# Category weights for the overall score (defaults sum to 100)
[weights]
# security = 20
# codeQuality = 12
# testing = 12
# devops = 10

# Minimum scores for a production-ready verdict
[thresholds]
security = 85
devops = 80
testing = 75
codeQuality = 70
overall = 85
"#;

/// Write [`CONFIG_TEMPLATE`] to `<repo_path>/shipready.toml`, never overwriting
pub fn write_template(repo_path: &Path) -> Result<PathBuf, ConfigError> {
    let path = repo_path.join(PROJECT_CONFIG_FILES[0]);
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path));
    }
    std::fs::write(&path, CONFIG_TEMPLATE).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(toml_src: &str) -> ConfigFile {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert!(config.parallel);
        assert!(config.max_concurrency >= 1);
        assert_eq!(config.thresholds, Thresholds::default());
        assert!(Category::ALL.iter().all(|c| config.category_enabled(*c)));
    }

    #[test]
    fn test_partial_override_keeps_other_keys() {
        let mut config = ScanConfig::default();
        let problems = config.apply(&file("[weights]\nsecurity = 30\n\n[thresholds]\noverall = 90\n"));
        assert!(problems.is_empty());
        assert_eq!(config.weights[&Category::Security], 30.0);
        assert_eq!(config.weights[&Category::Testing], 12.0);
        assert_eq!(config.thresholds.overall, 90.0);
        assert_eq!(config.thresholds.security, 85.0);
    }

    #[test]
    fn test_invalid_values_are_rejected_individually() {
        let mut config = ScanConfig::default();
        let before = config.max_concurrency;
        let problems = config.apply(&file(
            "[run]\nmax_concurrency = 0\nparallel = false\n\n[weights]\nsecurity = -5\nbogus = 3\ncode_quality = 20\n\n[thresholds]\ntesting = 150\n",
        ));
        assert_eq!(problems.len(), 4);
        assert_eq!(config.max_concurrency, before);
        assert!(!config.parallel);
        assert_eq!(config.weights[&Category::Security], 20.0);
        assert_eq!(config.weights[&Category::CodeQuality], 20.0);
        assert_eq!(config.thresholds.testing, 75.0);
    }

    #[test]
    fn test_category_filters() {
        let mut config = ScanConfig::default();
        config.apply(&file(
            "[run]\ncategories = [\"security\", \"repo_health\"]\ndisabled_categories = [\"repoHealth\"]\n",
        ));
        assert!(config.category_enabled(Category::Security));
        assert!(!config.category_enabled(Category::RepoHealth));
        assert!(!config.category_enabled(Category::Testing));
    }

    #[test]
    fn test_explicit_file_replaces_project_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shipready.toml"), "[run]\nparallel = false\n").unwrap();
        let explicit = dir.path().join("ci.json");
        std::fs::write(&explicit, r#"{"run":{"enableCache":false}}"#).unwrap();

        let config = ScanConfig::load(dir.path(), Some(&explicit)).unwrap();
        assert!(!config.enable_cache);
        assert!(config.parallel);

        let project_only = ScanConfig::load(dir.path(), None).unwrap();
        assert!(!project_only.parallel);
    }

    #[test]
    fn test_broken_explicit_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("broken.toml");
        std::fs::write(&explicit, "[thresholds\n").unwrap();
        assert!(ScanConfig::load(dir.path(), Some(&explicit)).is_err());
        let config = ScanConfig::load_or_default(dir.path(), Some(&explicit));
        assert_eq!(config.exclude_checks, Vec::<String>::new());
    }

    #[test]
    fn test_template_parses_and_is_not_overwritten() {
        let template: ConfigFile = toml::from_str(CONFIG_TEMPLATE).unwrap();
        let mut config = ScanConfig::default();
        assert!(config.apply(&template).is_empty());
        assert_eq!(config.thresholds, Thresholds::default());

        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path()).unwrap();
        assert!(path.ends_with("shipready.toml"));
        assert!(matches!(
            write_template(dir.path()),
            Err(ConfigError::AlreadyExists(_))
        ));
    }
}
