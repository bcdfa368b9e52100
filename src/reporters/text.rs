//! Text (terminal) reporter with colors and formatting

use super::verdict;
use crate::models::{CheckResult, ScanReport, Severity};
use anyhow::Result;
use console::style;

/// Failing checks listed before the rest are summarized
const MAX_LISTED_FAILURES: usize = 20;

/// Severity tag
fn severity_tag(severity: Severity) -> String {
    let tag = match severity {
        Severity::Blocker => "[B]",
        Severity::High => "[H]",
        Severity::Medium => "[M]",
        Severity::Low => "[L]",
    };
    match severity {
        Severity::Blocker => style(tag).red().bold().to_string(),
        Severity::High => style(tag).red().to_string(),
        Severity::Medium => style(tag).yellow().to_string(),
        Severity::Low => style(tag).blue().to_string(),
    }
}

fn format_score(score: f64) -> String {
    let text = format!("{:>3.0}", score);
    if score >= 85.0 {
        style(text).green().to_string()
    } else if score >= 70.0 {
        style(text).yellow().to_string()
    } else {
        style(text).red().to_string()
    }
}

/// Render report as formatted terminal output
pub fn render(report: &ScanReport) -> Result<String> {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{}\n", style("shipready").bold()));
    out.push_str(&format!(
        "{}\n",
        style("──────────────────────────────────────").dim()
    ));
    out.push_str(&format!("Repository: {}\n", report.repo_path));
    let verdict_styled = if report.production_ready {
        style(verdict(report)).green().bold()
    } else {
        style(verdict(report)).red().bold()
    };
    out.push_str(&format!(
        "Score: {}/100  {}\n\n",
        style(format!("{:.0}", report.score)).bold(),
        verdict_styled
    ));

    // Readiness reasons
    if !report.readiness_reasons.is_empty() {
        out.push_str(&format!("{}\n", style("WHY NOT READY").bold()));
        for reason in &report.readiness_reasons {
            out.push_str(&format!("  • {}\n", reason));
        }
        out.push('\n');
    }

    // Category scores
    out.push_str(&format!("{}\n", style("CATEGORIES").bold()));
    for (category, score) in &report.category_scores {
        out.push_str(&format!("  {}  {}\n", format_score(*score), category.label()));
    }
    out.push('\n');

    // Failures, most severe first
    let mut failed: Vec<&CheckResult> = report.failed().collect();
    failed.sort_by(|a, b| b.severity.cmp(&a.severity));
    let passed = report.results.len() - failed.len();
    out.push_str(&format!(
        "{} ({} passed, {} failed)\n",
        style("CHECKS").bold(),
        passed,
        failed.len()
    ));
    let counts = report.failure_counts();
    if !counts.is_empty() {
        let breakdown: Vec<String> = counts
            .iter()
            .rev()
            .map(|(severity, n)| format!("{} {}", n, severity.as_str()))
            .collect();
        out.push_str(&format!("  {}\n", style(breakdown.join(", ")).dim()));
    }
    for result in failed.iter().take(MAX_LISTED_FAILURES) {
        out.push_str(&format!(
            "  {}  {:<9} {}\n",
            severity_tag(result.severity),
            result.check_id,
            result.title
        ));
        if let Some(message) = &result.message {
            out.push_str(&format!("             {}\n", style(message).dim()));
        }
        if let Some(error) = &result.error {
            out.push_str(&format!("             {}\n", style(format!("error: {error}")).red()));
        }
    }
    let remaining = failed.len().saturating_sub(MAX_LISTED_FAILURES);
    if remaining > 0 {
        out.push_str(&format!(
            "  {}\n",
            style(format!("...and {} more (use --format json for all)", remaining)).dim()
        ));
    }
    out.push('\n');

    // Quick wins
    if !report.quick_wins.is_empty() {
        out.push_str(&format!("{}\n", style("QUICK WINS").bold()));
        for win in &report.quick_wins {
            out.push_str(&format!(
                "  {} {}\n",
                style(format!("[{}]", win.effort)).cyan(),
                win.instruction
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!("{}\n", style(format!("Scanned at {}", report.timestamp)).dim()));
    Ok(out)
}
