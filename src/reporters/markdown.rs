//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Suitable for pull request comments and CI job summaries.

use super::verdict;
use crate::models::{CheckResult, ScanReport, Severity};
use anyhow::Result;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &ScanReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');
    md.push_str(&render_category_scores(report));
    md.push('\n');
    md.push_str(&render_failures(report));
    md.push('\n');
    if !report.quick_wins.is_empty() {
        md.push_str(&render_quick_wins(report));
        md.push('\n');
    }
    md.push_str(&format!(
        "---\n\n*Generated by shipready on {}*\n",
        report.timestamp
    ));

    Ok(md)
}

fn render_header(report: &ScanReport) -> String {
    let badge = if report.production_ready { "✅" } else { "❌" };
    let mut out = format!(
        "# {} {}\n\n**Score: {:.0}/100** | `{}`\n",
        badge,
        verdict(report),
        report.score,
        escape(&report.repo_path)
    );
    if !report.readiness_reasons.is_empty() {
        out.push('\n');
        for reason in &report.readiness_reasons {
            out.push_str(&format!("- {}\n", escape(reason)));
        }
    }
    out
}

fn render_category_scores(report: &ScanReport) -> String {
    let mut out = String::from("## Category Scores\n\n| Category | Score |\n|----------|------:|\n");
    for (category, score) in &report.category_scores {
        out.push_str(&format!("| {} | {:.0} |\n", category.label(), score));
    }
    out
}

fn render_failures(report: &ScanReport) -> String {
    let mut failed: Vec<&CheckResult> = report.failed().collect();
    if failed.is_empty() {
        return "## Failed Checks\n\nAll checks passed.\n".to_string();
    }
    failed.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut out = format!(
        "## Failed Checks ({})\n\n| Severity | Check | Category | Details |\n|----------|-------|----------|---------|\n",
        failed.len()
    );
    for result in failed {
        let details = match (&result.error, &result.message) {
            (Some(error), _) => format!("error: {}", error),
            (None, Some(message)) => message.clone(),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "| {} | `{}` {} | {} | {} |\n",
            severity_label(result.severity),
            result.check_id,
            escape(&result.title),
            result.category.label(),
            escape(&details)
        ));
    }
    out
}

fn render_quick_wins(report: &ScanReport) -> String {
    let mut out = String::from("## Quick Wins\n\n");
    for win in &report.quick_wins {
        out.push_str(&format!(
            "- [ ] **{}** ({}): {}\n",
            win.check_id,
            win.effort,
            escape(&win.instruction)
        ));
    }
    out
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Blocker => "🛑 blocker",
        Severity::High => "🔴 high",
        Severity::Medium => "🟠 medium",
        Severity::Low => "🔵 low",
    }
}

/// Keep table cells on one line and pipes literal
fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
