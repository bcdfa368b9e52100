//! Core data models for shipready
//!
//! These value types flow from the check runner to the scoring engine and
//! finally into the [`ScanReport`]. Field names are serialized in camelCase
//! so downstream persistence and reporting layers can rely on them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity levels for checks, ordered `low < medium < high < blocker`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Blocker,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Blocker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Blocker => "blocker",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping label for checks, used for sub-scoring
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    #[serde(alias = "code_quality")]
    CodeQuality,
    Security,
    Dependencies,
    #[serde(alias = "dev_ops")]
    Devops,
    Architecture,
    #[serde(alias = "framework_specific")]
    FrameworkSpecific,
    Testing,
    Documentation,
    Performance,
    #[serde(alias = "ai_specific")]
    AiSpecific,
    Accessibility,
    Observability,
    #[serde(alias = "data_quality")]
    DataQuality,
    #[serde(alias = "repo_health")]
    RepoHealth,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::CodeQuality,
        Category::Security,
        Category::Dependencies,
        Category::Devops,
        Category::Architecture,
        Category::FrameworkSpecific,
        Category::Testing,
        Category::Documentation,
        Category::Performance,
        Category::AiSpecific,
        Category::Accessibility,
        Category::Observability,
        Category::DataQuality,
        Category::RepoHealth,
    ];

    /// Stable camelCase identifier, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CodeQuality => "codeQuality",
            Category::Security => "security",
            Category::Dependencies => "dependencies",
            Category::Devops => "devops",
            Category::Architecture => "architecture",
            Category::FrameworkSpecific => "frameworkSpecific",
            Category::Testing => "testing",
            Category::Documentation => "documentation",
            Category::Performance => "performance",
            Category::AiSpecific => "aiSpecific",
            Category::Accessibility => "accessibility",
            Category::Observability => "observability",
            Category::DataQuality => "dataQuality",
            Category::RepoHealth => "repoHealth",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Category::CodeQuality => "Code quality",
            Category::Security => "Security",
            Category::Dependencies => "Dependencies",
            Category::Devops => "DevOps",
            Category::Architecture => "Architecture",
            Category::FrameworkSpecific => "Framework-specific",
            Category::Testing => "Testing",
            Category::Documentation => "Documentation",
            Category::Performance => "Performance",
            Category::AiSpecific => "AI-specific",
            Category::Accessibility => "Accessibility",
            Category::Observability => "Observability",
            Category::DataQuality => "Data quality",
            Category::RepoHealth => "Repository health",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '_' && *c != '-').collect();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                format!(
                    "Unknown category '{}'. Valid categories: {}",
                    s,
                    Category::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

/// Outcome of evaluating a single check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub check_id: String,
    pub title: String,
    pub category: Category,
    pub severity: Severity,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fixable: Option<bool>,
}

impl CheckResult {
    /// Whether this result is a failed blocker
    pub fn is_failed_blocker(&self) -> bool {
        !self.passed && self.severity == Severity::Blocker
    }
}

/// A failing, non-blocker check surfaced with a remediation estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickWin {
    pub check_id: String,
    pub title: String,
    pub category: Category,
    pub severity: Severity,
    pub effort: String,
    pub instruction: String,
}

/// Terminal artifact of one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Overall score, 0-100
    pub score: f64,
    pub results: Vec<CheckResult>,
    /// ISO-8601 timestamp of the run start
    pub timestamp: String,
    pub repo_path: String,
    /// Only categories with at least one evaluated check have an entry
    pub category_scores: BTreeMap<Category, f64>,
    pub production_ready: bool,
    pub readiness_reasons: Vec<String>,
    pub quick_wins: Vec<QuickWin>,
}

impl ScanReport {
    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Count of failing checks per severity
    pub fn failure_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for result in self.failed() {
            *counts.entry(result.severity).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Blocker > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_category_parsing_accepts_both_cases() {
        assert_eq!(Category::from_str("codeQuality").unwrap(), Category::CodeQuality);
        assert_eq!(Category::from_str("code_quality").unwrap(), Category::CodeQuality);
        assert_eq!(Category::from_str("repo-health").unwrap(), Category::RepoHealth);
        assert!(Category::from_str("nonsense").is_err());
    }

    #[test]
    fn test_check_result_json_shape() {
        let result = CheckResult {
            check_id: "doc-001".into(),
            title: "README present".into(),
            category: Category::Documentation,
            severity: Severity::Blocker,
            passed: false,
            message: Some("No README.md".into()),
            error: None,
            auto_fixable: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["checkId"], "doc-001");
        assert_eq!(json["category"], "documentation");
        assert_eq!(json["severity"], "blocker");
        assert!(json.get("error").is_none());
        assert!(json.get("autoFixable").is_none());
    }

    #[test]
    fn test_category_scores_serialize_as_camel_case_keys() {
        let mut scores = BTreeMap::new();
        scores.insert(Category::FrameworkSpecific, 90.0);
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["frameworkSpecific"], 90.0);
    }
}
