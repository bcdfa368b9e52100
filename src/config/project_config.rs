//! Configuration file format
//!
//! The same schema is read from the user config, a project's `shipready.toml`
//! / `.shipreadyrc.json`, and an explicit `--config` file. Every key is
//! optional so a file only overrides what it names.
//!
//! ```toml
//! [run]
//! parallel = true
//! max_concurrency = 8
//! enable_cache = true
//! cache_ttl_secs = 300
//! categories = ["security", "testing"]
//! disabled_categories = ["accessibility"]
//! exclude_checks = ["cq-001"]
//!
//! [weights]
//! security = 25
//!
//! [thresholds]
//! codeQuality = 70
//! overall = 85
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project config file names, in lookup order
pub const PROJECT_CONFIG_FILES: [&str; 2] = ["shipready.toml", ".shipreadyrc.json"];

/// One configuration file, as written
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    pub run: RunSection,
    /// Category name → weight; names are validated when merged
    pub weights: BTreeMap<String, f64>,
    pub thresholds: ThresholdOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunSection {
    pub parallel: Option<bool>,
    #[serde(alias = "maxConcurrency")]
    pub max_concurrency: Option<usize>,
    #[serde(alias = "enableCache")]
    pub enable_cache: Option<bool>,
    #[serde(alias = "cacheTtlSecs")]
    pub cache_ttl_secs: Option<u64>,
    pub categories: Option<Vec<String>>,
    #[serde(alias = "disabledCategories")]
    pub disabled_categories: Option<Vec<String>>,
    #[serde(alias = "excludeChecks")]
    pub exclude_checks: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdOverrides {
    pub security: Option<f64>,
    pub devops: Option<f64>,
    pub testing: Option<f64>,
    #[serde(alias = "codeQuality")]
    pub code_quality: Option<f64>,
    pub overall: Option<f64>,
}

/// Parse a config file, choosing TOML or JSON by extension
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Path of the project config inside `repo_path`, if one exists
pub fn find_project_config(repo_path: &Path) -> Option<PathBuf> {
    PROJECT_CONFIG_FILES
        .iter()
        .map(|name| repo_path.join(name))
        .find(|p| p.is_file())
}

/// Load the project config of `repo_path`; a broken file is skipped with a warning
pub fn load_project_config(repo_path: &Path) -> Option<ConfigFile> {
    let path = find_project_config(repo_path)?;
    match load_config_file(&path) {
        Ok(config) => {
            debug!("Loaded project config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            warn!("Ignoring project config: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_with_snake_and_camel_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipready.toml");
        std::fs::write(
            &path,
            "[run]\nmax_concurrency = 4\nexcludeChecks = [\"cq-001\"]\n\n[thresholds]\ncodeQuality = 60\n",
        )
        .unwrap();
        let config = load_config_file(&path).unwrap();
        assert_eq!(config.run.max_concurrency, Some(4));
        assert_eq!(config.run.exclude_checks, Some(vec!["cq-001".to_string()]));
        assert_eq!(config.thresholds.code_quality, Some(60.0));
        assert_eq!(config.run.parallel, None);
    }

    #[test]
    fn test_json_project_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".shipreadyrc.json"),
            r#"{"run":{"parallel":false},"weights":{"security":30}}"#,
        )
        .unwrap();
        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.run.parallel, Some(false));
        assert_eq!(config.weights.get("security"), Some(&30.0));
    }

    #[test]
    fn test_toml_takes_precedence_over_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shipready.toml"), "[run]\nparallel = true\n").unwrap();
        std::fs::write(dir.path().join(".shipreadyrc.json"), r#"{"run":{"parallel":false}}"#).unwrap();
        let path = find_project_config(dir.path()).unwrap();
        assert!(path.ends_with("shipready.toml"));
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shipready.toml"), "[run\nparallel = ").unwrap();
        assert!(load_project_config(dir.path()).is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipready.yaml");
        std::fs::write(&path, "run: {}").unwrap();
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
