//! Checks command - list the registry

use crate::checks::{all_checks, checks_in, Check};
use crate::models::Category;
use anyhow::Result;
use console::style;

/// Print every registered check, optionally limited to `categories`
pub fn run(categories: &[Category]) -> Result<()> {
    let checks = select(categories);
    for check in &checks {
        println!("{}", format_row(check));
    }
    eprintln!("\n{} checks", style(checks.len()).bold());
    Ok(())
}

fn select(categories: &[Category]) -> Vec<Check> {
    if categories.is_empty() {
        return all_checks();
    }
    categories.iter().flat_map(|c| checks_in(*c)).collect()
}

fn format_row(check: &Check) -> String {
    format!(
        "{:<9} {:<8} {:<18} {}",
        check.id,
        check.severity.as_str(),
        check.category.as_str(),
        check.title
    )
}
