//! Framework-specific checks (`fw-*`)
//!
//! Every check here is gated on its framework being detected, so a repository
//! only ever pays for the frameworks it actually uses.

use super::base::{
    file_name, sample, static_regex, summarize_hits, Check, CheckContext, CheckOutcome, Hit,
};
use crate::models::{Category, Severity};
use regex::Regex;
use std::path::Path;

const REACT_FRAMEWORKS: &[&str] = &["react", "nextjs", "gatsby", "remix", "react-native", "expo"];

static_regex!(
    jsx_map_pattern,
    r"\.map\(\s*(?:\([^)]*\)|\w+)\s*=>\s*\(?\s*<[A-Za-z][^>]*>"
);
static_regex!(django_debug_pattern, r"(?m)^\s*DEBUG\s*=\s*True\b");
static_regex!(flask_debug_pattern, r"\.run\([^)]*debug\s*=\s*True");
static_regex!(vue_for_pattern, r"<[A-Za-z][\w-]*\s[^>]*\bv-for\s*=[^>]*>");
static_regex!(
    express_error_handler_pattern,
    r"\(\s*(err|error)\s*,\s*req\w*\s*,\s*res\w*\s*,\s*next\w*\s*\)"
);

pub(super) fn checks() -> Vec<Check> {
    let c = Category::FrameworkSpecific;
    vec![
        Check::new("fw-001", "React list items have keys", c, Severity::Medium, react_list_keys),
        Check::new("fw-002", "Next.js error pages", c, Severity::Low, nextjs_error_pages),
        Check::new("fw-003", "Express security headers", c, Severity::Medium, express_helmet),
        Check::new("fw-004", "Django DEBUG disabled", c, Severity::High, django_debug),
        Check::new("fw-005", "Flask debug mode disabled", c, Severity::High, flask_debug),
        Check::new("fw-006", "Vue v-for items have keys", c, Severity::Medium, vue_for_keys),
        Check::new("fw-007", "Express error handler", c, Severity::Medium, express_error_handler),
    ]
}

/// Matches of `pattern` whose text lacks `required`, across the sampled `files`
fn matches_missing(
    ctx: &CheckContext<'_>,
    files: &[&Path],
    pattern: &Regex,
    required: &[&str],
) -> Vec<Hit> {
    let mut hits = Vec::new();
    for path in sample(files) {
        let Some(content) = ctx.read(path) else {
            continue;
        };
        for m in pattern.find_iter(&content) {
            if required.iter().any(|r| m.as_str().contains(r)) {
                continue;
            }
            hits.push(Hit {
                path: path.to_path_buf(),
                line: content[..m.start()].matches('\n').count() + 1,
            });
        }
    }
    hits
}

fn react_list_keys(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(REACT_FRAMEWORKS) {
        return Ok(CheckOutcome::not_applicable("React is not used"));
    }
    let files = ctx.production_sources(&["jsx", "tsx", "js"]);
    let hits = matches_missing(ctx, &files, jsx_map_pattern(), &["key="]);
    Ok(if hits.is_empty() {
        CheckOutcome::pass("Rendered lists carry a key prop")
    } else {
        CheckOutcome::fail(format!(
            "Elements rendered from .map() without a key: {}",
            summarize_hits(&hits)
        ))
    })
}

fn nextjs_error_pages(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_framework("nextjs") {
        return Ok(CheckOutcome::not_applicable("Next.js is not used"));
    }
    let found = ctx.any_path(|p| {
        let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let router_dir = p.components().any(|c| {
            let c = c.as_os_str();
            c == "pages" || c == "app"
        });
        router_dir && matches!(stem, "_error" | "404" | "500" | "error" | "not-found" | "global-error")
    });
    Ok(CheckOutcome::from_bool(
        found,
        "Custom error pages defined",
        "No custom error or not-found page, users see the framework default",
    ))
}

fn express_helmet(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_framework("express") {
        return Ok(CheckOutcome::not_applicable("Express is not used"));
    }
    Ok(CheckOutcome::from_bool(
        ctx.repo.has_dependency("helmet"),
        "helmet sets security headers",
        "Express app without helmet, security headers are not set",
    ))
}

/// Settings modules that are meant for local development only
fn is_dev_settings(path: &Path) -> bool {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();
    ["dev", "local", "test"].iter().any(|m| stem.contains(m))
}

fn django_debug(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_framework("django") {
        return Ok(CheckOutcome::not_applicable("Django is not used"));
    }
    let settings: Vec<&Path> = ctx
        .production_sources(&["py"])
        .into_iter()
        .filter(|p| {
            let name = file_name(p);
            let in_settings_dir = p
                .parent()
                .and_then(|d| d.file_name())
                .map(|d| d == "settings")
                .unwrap_or(false);
            (name.starts_with("settings") || in_settings_dir) && !is_dev_settings(p)
        })
        .collect();
    let hits = ctx.grep(&settings, django_debug_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("DEBUG is not hardcoded to True")
    } else {
        CheckOutcome::fail(format!(
            "DEBUG = True in settings, read it from the environment: {}",
            summarize_hits(&hits)
        ))
    })
}

fn flask_debug(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_framework("flask") {
        return Ok(CheckOutcome::not_applicable("Flask is not used"));
    }
    let files = ctx.production_sources(&["py"]);
    let hits = ctx.grep(&files, flask_debug_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("Flask debug mode is not enabled in code")
    } else {
        CheckOutcome::fail(format!(
            "app.run(debug=True) exposes the Werkzeug debugger: {}",
            summarize_hits(&hits)
        ))
    })
}

fn vue_for_keys(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(&["vue", "nuxt"]) {
        return Ok(CheckOutcome::not_applicable("Vue is not used"));
    }
    let files = ctx.production_sources(&["vue"]);
    let hits = matches_missing(ctx, &files, vue_for_pattern(), &[":key", "v-bind:key"]);
    Ok(if hits.is_empty() {
        CheckOutcome::pass("v-for elements are keyed")
    } else {
        CheckOutcome::fail(format!(
            "v-for without :key: {}",
            summarize_hits(&hits)
        ))
    })
}

fn express_error_handler(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_framework("express") {
        return Ok(CheckOutcome::not_applicable("Express is not used"));
    }
    let files = ctx.production_sources(&["js", "ts", "mjs", "cjs"]);
    let hits = ctx.grep(&files, express_error_handler_pattern());
    Ok(CheckOutcome::from_bool(
        !hits.is_empty(),
        "Express error-handling middleware registered",
        "No (err, req, res, next) error handler, unhandled errors leak stack traces",
    ))
}
