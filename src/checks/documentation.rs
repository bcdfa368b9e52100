//! Documentation checks (`doc-*`)

use super::base::{file_name, Check, CheckContext, CheckOutcome};
use crate::context::frameworks::SERVER_FRAMEWORKS;
use crate::models::{Category, Severity};

const README_NAMES: &[&str] = &["README.md", "README", "README.rst", "README.txt", "README.adoc"];
const LICENSE_NAMES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE.txt", "LICENCE", "LICENCE.md", "COPYING"];
const CHANGELOG_NAMES: &[&str] = &["CHANGELOG.md", "CHANGELOG", "CHANGES.md", "HISTORY.md", "RELEASES.md"];

/// A README shorter than this is a stub
const MIN_README_LINES: usize = 10;

/// Words that signal a README tells readers how to get started
const README_SECTIONS: &[&str] = &["install", "usage", "getting started", "quick start", "quickstart", "setup"];

const API_DOC_DEPENDENCIES: &[&str] = &[
    "swagger-ui-express",
    "swagger-jsdoc",
    "@nestjs/swagger",
    "@fastify/swagger",
    "drf-spectacular",
    "drf-yasg",
    "fastapi",
];

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Documentation;
    vec![
        Check::new("doc-001", "README present", c, Severity::Blocker, readme_present),
        Check::new("doc-002", "README explains setup and usage", c, Severity::Medium, readme_substance),
        Check::new("doc-003", "License declared", c, Severity::Medium, license),
        Check::new("doc-004", "Changelog maintained", c, Severity::Low, changelog),
        Check::new("doc-005", "Contribution guide", c, Severity::Low, contributing),
        Check::new("doc-006", "API documentation", c, Severity::Low, api_docs),
    ]
}

fn find_readme<'c>(ctx: &'c CheckContext<'_>) -> Option<&'c str> {
    README_NAMES.iter().find_map(|n| ctx.repo.find_root_file(n))
}

fn readme_present(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    Ok(match find_readme(ctx) {
        Some(name) => CheckOutcome::pass(format!("{name} present")),
        None => CheckOutcome::fail("No README.md at the repository root"),
    })
}

fn readme_substance(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let Some(name) = find_readme(ctx) else {
        return Ok(CheckOutcome::not_applicable("no README"));
    };
    let Some(content) = ctx.read(name) else {
        return Ok(CheckOutcome::fail(format!("{name} is empty or unreadable")));
    };
    let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
    let lower = content.to_lowercase();
    let has_sections = README_SECTIONS.iter().any(|s| lower.contains(s));

    Ok(match (lines >= MIN_README_LINES, has_sections) {
        (true, true) => CheckOutcome::pass(format!("{name} has {lines} lines with setup instructions")),
        (false, _) => CheckOutcome::fail(format!(
            "{name} has only {lines} non-empty lines, describe what the project does and how to run it"
        )),
        (true, false) => CheckOutcome::fail(format!(
            "{name} has no installation or usage section"
        )),
    })
}

fn license(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let private = ctx
        .repo
        .package_json
        .as_ref()
        .and_then(|p| p.private)
        .unwrap_or(false);
    if let Some(name) = LICENSE_NAMES.iter().find_map(|n| ctx.repo.find_root_file(n)) {
        return Ok(CheckOutcome::pass(format!("{name} present")));
    }
    if private {
        return Ok(CheckOutcome::not_applicable("package.json is private"));
    }
    let declared = ctx
        .repo
        .package_json
        .as_ref()
        .and_then(|p| p.field("license"))
        .and_then(|l| l.as_str())
        .map(|l| l != "UNLICENSED")
        .unwrap_or(false);
    Ok(if declared {
        CheckOutcome::fail("package.json declares a license but no LICENSE file is committed")
    } else {
        CheckOutcome::fail("No LICENSE file")
    })
}

fn changelog(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    Ok(match CHANGELOG_NAMES.iter().find_map(|n| ctx.repo.find_root_file(n)) {
        Some(name) => CheckOutcome::pass(format!("{name} present")),
        None => CheckOutcome::fail("No CHANGELOG, release notes are not tracked"),
    })
}

fn contributing(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let found = ctx.repo.find_root_file("CONTRIBUTING.md").is_some()
        || ctx.any_path(|p| {
            file_name(p).eq_ignore_ascii_case("CONTRIBUTING.md")
                && p.parent()
                    .map(|d| d == std::path::Path::new(".github") || d == std::path::Path::new("docs"))
                    .unwrap_or(false)
        });
    Ok(CheckOutcome::from_bool(
        found,
        "CONTRIBUTING.md explains the workflow",
        "No CONTRIBUTING.md",
    ))
}

fn api_docs(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(SERVER_FRAMEWORKS) {
        return Ok(CheckOutcome::not_applicable("no server framework"));
    }
    if let Some(dep) = ctx.find_dependency(API_DOC_DEPENDENCIES) {
        return Ok(CheckOutcome::pass(format!("API documentation generated by {dep}")));
    }
    let spec_file = ctx.any_path(|p| {
        let name = file_name(p).to_lowercase();
        name.starts_with("openapi.") || name.starts_with("swagger.")
    });
    Ok(CheckOutcome::from_bool(
        spec_file || ctx.repo.has_root_dir("docs"),
        "API documentation found",
        "Server without an OpenAPI description or docs/ directory",
    ))
}
