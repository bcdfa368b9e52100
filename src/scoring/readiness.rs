//! Production-readiness verdict
//!
//! A fixed policy over the scored results. Every violated rule contributes a
//! reason; the repository is ready only when there are none.

use crate::models::{Category, CheckResult, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mock/placeholder failures at high severity (blockers included) that disqualify
const MOCK_HIGH_LIMIT: usize = 2;
/// Mock/placeholder failures of any severity that disqualify
const MOCK_TOTAL_LIMIT: usize = 3;

/// Minimum scores for a repository to be considered production ready
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    pub security: f64,
    pub devops: f64,
    pub testing: f64,
    #[serde(alias = "code_quality")]
    pub code_quality: f64,
    pub overall: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            security: 85.0,
            devops: 80.0,
            testing: 75.0,
            code_quality: 70.0,
            overall: 85.0,
        }
    }
}

impl Thresholds {
    /// Category rules in precedence order
    fn category_rules(&self) -> [(Category, f64); 4] {
        [
            (Category::Security, self.security),
            (Category::Devops, self.devops),
            (Category::Testing, self.testing),
            (Category::CodeQuality, self.code_quality),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub production_ready: bool,
    pub reasons: Vec<String>,
}

/// Apply the readiness rules to a scored run
///
/// `is_mock` tells which results belong to the mock/placeholder class.
pub fn evaluate_production_readiness(
    results: &[CheckResult],
    category_scores: &BTreeMap<Category, f64>,
    overall_score: f64,
    thresholds: &Thresholds,
    is_mock: impl Fn(&CheckResult) -> bool,
) -> Readiness {
    let mut reasons = Vec::new();

    let blockers: Vec<&str> = results
        .iter()
        .filter(|r| r.is_failed_blocker())
        .map(|r| r.check_id.as_str())
        .collect();
    if !blockers.is_empty() {
        reasons.push(format!(
            "Blocker checks failed: {}",
            blockers.join(", ")
        ));
    }

    let mock_failures: Vec<&CheckResult> =
        results.iter().filter(|r| !r.passed && is_mock(r)).collect();
    let mock_high = mock_failures
        .iter()
        .filter(|r| r.severity >= Severity::High)
        .count();
    if mock_high >= MOCK_HIGH_LIMIT || mock_failures.len() >= MOCK_TOTAL_LIMIT {
        let ids: Vec<&str> = mock_failures.iter().map(|r| r.check_id.as_str()).collect();
        reasons.push(format!(
            "Mock data or placeholder code in production paths ({})",
            ids.join(", ")
        ));
    }

    for (category, minimum) in thresholds.category_rules() {
        if let Some(score) = category_scores.get(&category) {
            if *score < minimum {
                reasons.push(format!(
                    "{} score {:.0} is below {:.0}",
                    category.label(),
                    score,
                    minimum
                ));
            }
        }
    }

    if overall_score < thresholds.overall {
        reasons.push(format!(
            "Overall score {:.0} is below {:.0}",
            overall_score, thresholds.overall
        ));
    }

    Readiness {
        production_ready: reasons.is_empty(),
        reasons,
    }
}
