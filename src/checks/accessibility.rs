//! Accessibility checks (`a11y-*`)

use super::base::{sample, static_regex, summarize_hits, Check, CheckContext, CheckOutcome, Hit, MARKUP_EXTENSIONS};
use crate::models::{Category, Severity};
use regex::Regex;
use std::path::Path;

static_regex!(img_tag, r"(?i)<img\b[^>]*>");
static_regex!(alt_attribute, r"(?i)(\s|:)alt\s*=|\{\s*\.\.\.");
static_regex!(html_tag, r"(?i)<html\b[^>]*>");
static_regex!(lang_attribute, r"(?i)\blang\s*=");
static_regex!(
    clickable_non_interactive,
    r"<(div|span|li)\b[^>]*\s(onClick|@click|v-on:click|\(click\))\s*=[^>]*>"
);
static_regex!(role_attribute, r"\brole\s*=");

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Accessibility;
    vec![
        Check::new("a11y-001", "Images have alt text", c, Severity::Medium, image_alt),
        Check::new("a11y-002", "Documents declare a language", c, Severity::Low, html_lang),
        Check::new("a11y-003", "Clickable elements are accessible", c, Severity::Low, clickable_elements),
    ]
}

/// Tags matched by `tag` that do not satisfy `attribute`
fn tags_missing(ctx: &CheckContext<'_>, files: &[&Path], tag: &Regex, attribute: &Regex) -> Vec<Hit> {
    let mut hits = Vec::new();
    for path in sample(files) {
        let Some(content) = ctx.read(path) else {
            continue;
        };
        for m in tag.find_iter(&content) {
            if !attribute.is_match(m.as_str()) {
                hits.push(Hit {
                    path: path.to_path_buf(),
                    line: content[..m.start()].matches('\n').count() + 1,
                });
            }
        }
    }
    hits
}

fn image_alt(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(MARKUP_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no markup or component files"));
    }
    let hits = tags_missing(ctx, &files, img_tag(), alt_attribute());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("Every <img> has an alt attribute")
    } else {
        CheckOutcome::fail(format!(
            "{} images without alt text: {}",
            hits.len(),
            summarize_hits(&hits)
        ))
    })
}

fn html_lang(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(MARKUP_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no markup or component files"));
    }
    let hits = tags_missing(ctx, &files, html_tag(), lang_attribute());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("<html> elements declare lang")
    } else {
        CheckOutcome::fail(format!(
            "<html> without a lang attribute: {}",
            summarize_hits(&hits)
        ))
        .auto_fixable()
    })
}

fn clickable_elements(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(MARKUP_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no markup or component files"));
    }
    let hits = tags_missing(ctx, &files, clickable_non_interactive(), role_attribute());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("Click handlers sit on interactive elements")
    } else {
        CheckOutcome::fail(format!(
            "Click handlers on non-interactive elements without a role, use <button>: {}",
            summarize_hits(&hits)
        ))
    })
}
