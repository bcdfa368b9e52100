//! Repository hygiene checks (`repo-*`)

use super::base::{Check, CheckContext, CheckOutcome};
use super::code_quality::pyproject_has_tool;
use crate::models::{Category, Severity};

const FORMATTER_CONFIGS: &[&str] = &[
    ".editorconfig",
    ".prettierrc",
    ".prettierrc.json",
    ".prettierrc.js",
    ".prettierrc.cjs",
    ".prettierrc.yml",
    ".prettierrc.yaml",
    "prettier.config.js",
    "prettier.config.mjs",
    "biome.json",
    "rustfmt.toml",
    ".rustfmt.toml",
    ".clang-format",
    ".style.yapf",
];

const CODEOWNERS_PATHS: &[&str] = &["CODEOWNERS", ".github/CODEOWNERS", "docs/CODEOWNERS", ".gitlab/CODEOWNERS"];

pub(super) fn checks() -> Vec<Check> {
    let c = Category::RepoHealth;
    vec![
        Check::new("repo-001", ".gitignore present", c, Severity::Medium, gitignore),
        Check::new("repo-002", "Formatter configuration", c, Severity::Low, formatter),
        Check::new("repo-003", "node_modules not committed", c, Severity::Medium, node_modules_ignored),
        Check::new("repo-004", "Issue and pull request templates", c, Severity::Low, templates),
        Check::new("repo-005", "Code owners defined", c, Severity::Low, codeowners),
    ]
}

fn gitignore(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    Ok(CheckOutcome::from_bool(
        ctx.repo.has_root_file(".gitignore"),
        ".gitignore present",
        "No .gitignore, build output and local files end up in commits",
    )
    .auto_fixable_if_failed())
}

fn formatter(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let configured = ctx.first_existing(FORMATTER_CONFIGS).is_some()
        || ctx
            .repo
            .package_json
            .as_ref()
            .map(|p| p.field("prettier").is_some())
            .unwrap_or(false)
        || pyproject_has_tool(ctx, &["black", "ruff", "isort"]);
    Ok(CheckOutcome::from_bool(
        configured,
        "Formatting is configured",
        "No .editorconfig or formatter configuration",
    ))
}

fn node_modules_ignored(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_node_manifest() {
        return Ok(CheckOutcome::not_applicable("no package.json"));
    }
    if ctx.gitignore_covers("node_modules") {
        return Ok(CheckOutcome::pass(".gitignore excludes node_modules"));
    }
    Ok(if ctx.repo.has_root_dir("node_modules") {
        CheckOutcome::fail("node_modules is present and not ignored, it will be committed")
    } else {
        CheckOutcome::fail(".gitignore does not exclude node_modules")
    }
    .auto_fixable())
}

fn templates(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let found = ctx.any_path(|p| {
        let text = p.to_string_lossy().to_lowercase();
        (p.starts_with(".github") || p.starts_with(".gitlab") || p.starts_with("docs"))
            && (text.contains("issue_template")
                || text.contains("pull_request_template")
                || text.contains("merge_request_templates"))
    }) || ctx.repo.find_root_file("PULL_REQUEST_TEMPLATE.md").is_some();
    Ok(CheckOutcome::from_bool(
        found,
        "Issue or pull request templates present",
        "No issue or pull request templates",
    ))
}

fn codeowners(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    Ok(match CODEOWNERS_PATHS.iter().find(|p| ctx.exists(p)) {
        Some(path) => CheckOutcome::pass(format!("Ownership defined in {path}")),
        None => CheckOutcome::fail("No CODEOWNERS file, reviews are not routed"),
    })
}
