//! Output reporters for scan results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON, the `ScanReport` as-is
//! - `markdown` - GitHub-flavored Markdown for PR comments and CI summaries
//!
//! Every renderer is a pure function of the [`ScanReport`].

mod json;
mod markdown;
mod text;

use crate::models::ScanReport;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render a scan report in the given format
pub fn render(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

/// "ready" / "not ready" verdict label shared by the renderers
pub(crate) fn verdict(report: &ScanReport) -> &'static str {
    if report.production_ready {
        "Production ready"
    } else {
        "Not production ready"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small report with a blocker, a quick win and an errored check
    pub(crate) fn test_report() -> ScanReport {
        use crate::models::{Category, CheckResult, QuickWin, Severity};
        use std::collections::BTreeMap;

        let results = vec![
            CheckResult {
                check_id: "doc-001".into(),
                title: "README present".into(),
                category: Category::Documentation,
                severity: Severity::Blocker,
                passed: false,
                message: Some("No README found".into()),
                error: None,
                auto_fixable: None,
            },
            CheckResult {
                check_id: "repo-001".into(),
                title: ".gitignore present".into(),
                category: Category::RepoHealth,
                severity: Severity::Medium,
                passed: false,
                message: Some("No .gitignore".into()),
                error: None,
                auto_fixable: Some(true),
            },
            CheckResult {
                check_id: "sec-002".into(),
                title: "No hardcoded secrets".into(),
                category: Category::Security,
                severity: Severity::High,
                passed: true,
                message: Some("No secrets found".into()),
                error: None,
                auto_fixable: None,
            },
            CheckResult {
                check_id: "perf-003".into(),
                title: "No oversized assets".into(),
                category: Category::Performance,
                severity: Severity::Low,
                passed: false,
                message: Some("Check could not be completed".into()),
                error: Some("Panic: boom".into()),
                auto_fixable: None,
            },
        ];
        let mut category_scores = BTreeMap::new();
        category_scores.insert(Category::Documentation, 0.0);
        category_scores.insert(Category::RepoHealth, 85.0);
        category_scores.insert(Category::Security, 100.0);
        category_scores.insert(Category::Performance, 95.0);

        ScanReport {
            score: 32.0,
            results,
            timestamp: "2026-01-01T00:00:00+00:00".into(),
            repo_path: "/tmp/demo".into(),
            category_scores,
            production_ready: false,
            readiness_reasons: vec!["Blocker checks failed: doc-001".into()],
            quick_wins: vec![QuickWin {
                check_id: "repo-001".into(),
                title: ".gitignore present".into(),
                category: Category::RepoHealth,
                severity: Severity::Medium,
                effort: "5 minutes".into(),
                instruction: ".gitignore present: No .gitignore".into(),
            }],
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_every_format_renders() {
        let report = test_report();
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            let out = render(&report, format).unwrap();
            assert!(out.contains("doc-001"), "{format} output lacks doc-001");
        }
    }
}
