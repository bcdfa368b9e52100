//! Production-readiness scoring
//!
//! Turns a flat list of [`CheckResult`]s into per-category scores, an overall
//! score and a readiness verdict.
//!
//! # Scoring Formula
//!
//! ```text
//! Category = 0                                    if a blocker failed in it
//!          = 100 × Π (1 − (1 − impact[sev]) / n)  over failing checks, n = results in category
//!
//! Base     = Σ weight[c] × Category[c] / Σ weight[c]   over categories with results
//! Overall  = Base − 40 (any blocker failed) − min(35, Σ mock penalty)   floored at 0
//! ```
//!
//! # Severity impact (fraction of the score a failure keeps)
//!
//! - Low: 0.95
//! - Medium: 0.85
//! - High: 0.6
//! - Blocker: 0.0 (handled by the category floor)
//!
//! # Mock/placeholder penalty
//!
//! 15 per failing high (or blocker) mock-class check, 8 per medium, 3 per
//! low, capped at 35 in total.
//!
//! A category with no results has no score at all; it is left out of both
//! the numerator and the denominator of the weighted mean.

mod readiness;

pub use readiness::{evaluate_production_readiness, Readiness, Thresholds};

use crate::models::{Category, CheckResult, Severity};
use std::collections::BTreeMap;
use tracing::debug;

/// Points subtracted from the overall score when any blocker fails
pub const GLOBAL_BLOCKER_PENALTY: f64 = 40.0;

/// Upper bound of the mock/placeholder penalty
pub const MOCK_PENALTY_CAP: f64 = 35.0;

/// Category weight table; partial overrides are merged over [`default_weights`]
pub type CategoryWeights = BTreeMap<Category, f64>;

const DEFAULT_WEIGHTS: [(Category, f64); 14] = [
    (Category::Security, 20.0),
    (Category::CodeQuality, 12.0),
    (Category::Testing, 12.0),
    (Category::Devops, 10.0),
    (Category::Dependencies, 8.0),
    (Category::Documentation, 6.0),
    (Category::Architecture, 6.0),
    (Category::Performance, 5.0),
    (Category::Observability, 5.0),
    (Category::FrameworkSpecific, 4.0),
    (Category::AiSpecific, 3.0),
    (Category::Accessibility, 3.0),
    (Category::DataQuality, 3.0),
    (Category::RepoHealth, 3.0),
];

pub fn default_weights() -> CategoryWeights {
    DEFAULT_WEIGHTS.into_iter().collect()
}

/// Fraction of the score a single failure of this severity keeps
pub fn severity_impact(severity: Severity) -> f64 {
    match severity {
        Severity::Low => 0.95,
        Severity::Medium => 0.85,
        Severity::High => 0.6,
        Severity::Blocker => 0.0,
    }
}

/// Penalty points for one failing mock/placeholder check
pub fn mock_penalty_points(severity: Severity) -> f64 {
    match severity {
        Severity::High | Severity::Blocker => 15.0,
        Severity::Medium => 8.0,
        Severity::Low => 3.0,
    }
}

/// Score for the results of one category, `None` when there are none
pub fn calculate_category_score(results: &[&CheckResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    if results.iter().any(|r| r.is_failed_blocker()) {
        return Some(0.0);
    }
    let n = results.len() as f64;
    let score = results
        .iter()
        .filter(|r| !r.passed)
        .fold(100.0, |score, r| {
            score * (1.0 - (1.0 - severity_impact(r.severity)) / n)
        });
    Some(score)
}

/// Scores for every category that has at least one result
pub fn calculate_category_scores(results: &[CheckResult]) -> BTreeMap<Category, f64> {
    let mut by_category: BTreeMap<Category, Vec<&CheckResult>> = BTreeMap::new();
    for result in results {
        by_category.entry(result.category).or_default().push(result);
    }
    by_category
        .into_iter()
        .filter_map(|(category, results)| {
            calculate_category_score(&results).map(|score| (category, score))
        })
        .collect()
}

/// Weighted mean of the defined category scores, before penalties
pub fn weighted_base_score(
    category_scores: &BTreeMap<Category, f64>,
    weights: &CategoryWeights,
) -> f64 {
    let (weighted, total) = category_scores
        .iter()
        .fold((0.0, 0.0), |(weighted, total), (category, score)| {
            let w = weights.get(category).copied().unwrap_or(0.0);
            (weighted + w * score, total + w)
        });
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Sum of mock/placeholder penalties over failing results, capped
pub fn mock_penalty(results: &[CheckResult], is_mock: impl Fn(&CheckResult) -> bool) -> f64 {
    let total: f64 = results
        .iter()
        .filter(|r| !r.passed && is_mock(r))
        .map(|r| mock_penalty_points(r.severity))
        .sum();
    total.min(MOCK_PENALTY_CAP)
}

/// Overall score: weighted mean minus the blocker and mock penalties, floored at 0
pub fn calculate_overall_score(
    results: &[CheckResult],
    category_scores: &BTreeMap<Category, f64>,
    weights: &CategoryWeights,
    is_mock: impl Fn(&CheckResult) -> bool,
) -> f64 {
    let base = weighted_base_score(category_scores, weights);
    let mut score = base;
    if results.iter().any(CheckResult::is_failed_blocker) {
        score = (score - GLOBAL_BLOCKER_PENALTY).max(0.0);
    }
    let mock = mock_penalty(results, is_mock);
    if mock > 0.0 {
        score = (score - mock).max(0.0);
    }
    debug!(
        "Overall score: base {:.2}, after penalties {:.2} (mock penalty {:.0})",
        base, score, mock
    );
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, category: Category, severity: Severity, passed: bool) -> CheckResult {
        CheckResult {
            check_id: id.to_string(),
            title: id.to_string(),
            category,
            severity,
            passed,
            message: None,
            error: None,
            auto_fixable: None,
        }
    }

    #[test]
    fn test_default_weights_sum_to_100() {
        let total: f64 = default_weights().values().sum();
        assert_eq!(total, 100.0);
        assert_eq!(default_weights().len(), Category::ALL.len());
    }

    #[test]
    fn test_empty_category_has_no_score() {
        assert_eq!(calculate_category_score(&[]), None);
        let scores = calculate_category_scores(&[result("a", Category::Security, Severity::Low, true)]);
        assert!(scores.contains_key(&Category::Security));
        assert!(!scores.contains_key(&Category::Testing));
    }

    #[test]
    fn test_all_passing_category_scores_100() {
        let a = result("a", Category::Testing, Severity::High, true);
        let b = result("b", Category::Testing, Severity::Low, true);
        assert_eq!(calculate_category_score(&[&a, &b]), Some(100.0));
    }

    #[test]
    fn test_failures_are_divided_by_result_count() {
        let results: Vec<CheckResult> = vec![
            result("a", Category::Devops, Severity::High, false),
            result("b", Category::Devops, Severity::Low, true),
            result("c", Category::Devops, Severity::Low, true),
            result("d", Category::Devops, Severity::Low, true),
        ];
        let refs: Vec<&CheckResult> = results.iter().collect();
        // 100 × (1 − 0.4 / 4)
        let score = calculate_category_score(&refs).unwrap();
        assert!((score - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalties_multiply_and_do_not_depend_on_order() {
        let a = result("a", Category::Security, Severity::Medium, false);
        let b = result("b", Category::Security, Severity::Low, false);
        let forward = calculate_category_score(&[&a, &b]).unwrap();
        let backward = calculate_category_score(&[&b, &a]).unwrap();
        assert!((forward - backward).abs() < 1e-9);
        // 100 × (1 − 0.15/2) × (1 − 0.05/2)
        assert!((forward - 100.0 * 0.925 * 0.975).abs() < 1e-9);
    }

    #[test]
    fn test_blocker_zeroes_category() {
        let a = result("a", Category::Documentation, Severity::Blocker, false);
        let b = result("b", Category::Documentation, Severity::Low, true);
        let c = result("c", Category::Documentation, Severity::Low, true);
        assert_eq!(calculate_category_score(&[&a, &b, &c]), Some(0.0));
    }

    #[test]
    fn test_overall_excludes_undefined_categories() {
        let results = vec![
            result("a", Category::Security, Severity::Low, true),
            result("b", Category::RepoHealth, Severity::High, false),
        ];
        let scores = calculate_category_scores(&results);
        // repoHealth: 100 × (1 − 0.4) = 60; weights 20 and 3
        let expected = (20.0 * 100.0 + 3.0 * 60.0) / 23.0;
        let overall = calculate_overall_score(&results, &scores, &default_weights(), |_| false);
        assert!((overall - expected).abs() < 1e-9);
    }

    #[test]
    fn test_global_blocker_penalty() {
        let mut results: Vec<CheckResult> = (0..10)
            .map(|i| result(&format!("s{i}"), Category::Security, Severity::Low, true))
            .collect();
        results.push(result("doc-001", Category::Documentation, Severity::Blocker, false));
        let scores = calculate_category_scores(&results);
        let weights = default_weights();
        let base = weighted_base_score(&scores, &weights);
        let overall = calculate_overall_score(&results, &scores, &weights, |_| false);
        assert!(overall <= (base - GLOBAL_BLOCKER_PENALTY).max(0.0) + 1e-9);
    }

    #[test]
    fn test_mock_penalty_is_capped() {
        let results = vec![
            result("m1", Category::CodeQuality, Severity::High, false),
            result("m2", Category::CodeQuality, Severity::High, false),
            result("m3", Category::CodeQuality, Severity::Medium, false),
            result("m4", Category::CodeQuality, Severity::Low, true),
        ];
        assert_eq!(mock_penalty(&results, |_| true), MOCK_PENALTY_CAP);
        assert_eq!(mock_penalty(&results[2..], |_| true), 8.0);
        assert_eq!(mock_penalty(&results, |_| false), 0.0);
    }

    #[test]
    fn test_flipping_a_failure_never_lowers_the_score() {
        let severities = [Severity::Low, Severity::Medium, Severity::High, Severity::Blocker];
        let mut results: Vec<CheckResult> = Vec::new();
        for (i, category) in Category::ALL.into_iter().enumerate() {
            for (j, severity) in severities.into_iter().enumerate() {
                results.push(result(
                    &format!("{i}-{j}"),
                    category,
                    severity,
                    (i + j) % 3 != 0,
                ));
            }
        }
        let weights = default_weights();
        let is_mock = |r: &CheckResult| r.check_id.ends_with("-1");
        let score_of = |results: &[CheckResult]| {
            let scores = calculate_category_scores(results);
            calculate_overall_score(results, &scores, &weights, is_mock)
        };
        let before = score_of(&results);
        for idx in 0..results.len() {
            if results[idx].passed {
                continue;
            }
            let mut flipped = results.clone();
            flipped[idx].passed = true;
            assert!(score_of(&flipped) >= before - 1e-9, "flipping {}", results[idx].check_id);
        }
    }
}
