//! Code quality checks (`cq-*`)
//!
//! Marker, debug-output and stub detection is line based and heuristic. The
//! mock/placeholder checks only look at code that ships, so fixtures, tests
//! and scripts never count against a repository.

use super::base::{
    is_comment_line, static_regex, summarize_hits, summarize_paths, Check, CheckContext,
    CheckOutcome, JS_EXTENSIONS, MARKUP_EXTENSIONS, SOURCE_EXTENSIONS,
};
use crate::models::{Category, Severity};
use std::path::Path;

/// More markers than this fails cq-001
const MAX_TODO_MARKERS: usize = 10;

/// More debug statements than this fails cq-002
const MAX_DEBUG_STATEMENTS: usize = 5;

/// Files longer than this are flagged by cq-005
const MAX_FILE_LINES: usize = 1000;

const ESLINT_CONFIGS: &[&str] = &[
    ".eslintrc",
    ".eslintrc.js",
    ".eslintrc.cjs",
    ".eslintrc.json",
    ".eslintrc.yml",
    ".eslintrc.yaml",
    "eslint.config.js",
    "eslint.config.mjs",
    "eslint.config.cjs",
    "eslint.config.ts",
    "biome.json",
    "biome.jsonc",
    ".oxlintrc.json",
];

const PYTHON_LINT_CONFIGS: &[&str] = &[".flake8", ".pylintrc", "pylintrc", "ruff.toml", ".ruff.toml"];

static_regex!(
    todo_pattern,
    r"(?i)\b(TODO|FIXME|HACK|XXX)\b[\s:(]|\bBUG\s*:"
);
static_regex!(
    debug_pattern,
    r"\bconsole\.(log|debug|trace)\s*\(|^\s*debugger\s*;?\s*$|\bpdb\.set_trace\(\)|^\s*breakpoint\(\)"
);
static_regex!(ts_strict_pattern, r#""strict"\s*:\s*true"#);
static_regex!(
    mock_data_pattern,
    r"\b(mockData|mock_data|mockUsers|mock_users|fakeData|fake_data|dummyData|dummy_data|sampleData|MOCK_[A-Z_]+|FAKE_[A-Z_]+|DUMMY_[A-Z_]+)\b|\bfaker\.\w+"
);
static_regex!(
    placeholder_pattern,
    r"(?i)lorem ipsum|\bplaceholder text\b|\bjohn doe\b|\bjane doe\b|\bexample@example\.com\b|\bfoo@bar\.com\b|your[-_ ]?api[-_ ]?key[-_ ]?here|\bREPLACE_ME\b|\bCHANGEME\b|\bTBD\b:"
);
static_regex!(
    stub_pattern,
    r#"(?i)throw\s+new\s+Error\(\s*['"`]not (yet )?implemented|raise\s+NotImplementedError|\btodo!\(|\bunimplemented!\(|panic\(\s*"not implemented"|return\s+['"]stub['"]"#
);
static_regex!(
    localhost_pattern,
    r"(?i)\bhttps?://(localhost|127\.0\.0\.1|0\.0\.0\.0)\b"
);
static_regex!(env_read_pattern, r"process\.env|import\.meta\.env|os\.environ|getenv");
static_regex!(
    empty_catch_pattern,
    r"catch\s*(\([^)]*\))?\s*\{\s*\}|except[^:\n]*:[ \t]*\n[ \t]*pass\b"
);

pub(super) fn checks() -> Vec<Check> {
    let c = Category::CodeQuality;
    vec![
        Check::new("cq-001", "TODO/FIXME markers under control", c, Severity::Low, todo_markers),
        Check::new("cq-002", "No leftover debug statements", c, Severity::Medium, debug_statements),
        Check::new("cq-003", "Linter configured", c, Severity::Medium, linter_configured),
        Check::new("cq-004", "TypeScript strict mode", c, Severity::Medium, typescript_strict),
        Check::new("cq-005", "No oversized source files", c, Severity::Low, large_files),
        Check::new("cq-006", "No mock data in production code", c, Severity::High, mock_data)
            .mock_placeholder(),
        Check::new("cq-007", "No placeholder content", c, Severity::Medium, placeholder_text)
            .mock_placeholder(),
        Check::new("cq-008", "No stub implementations", c, Severity::High, stub_implementations)
            .mock_placeholder(),
        Check::new("cq-009", "No hardcoded localhost endpoints", c, Severity::Low, hardcoded_localhost)
            .mock_placeholder(),
        Check::new("cq-010", "No swallowed exceptions", c, Severity::Medium, empty_catch),
    ]
}

fn todo_markers(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.grep(&files, todo_pattern());
    Ok(match hits.len() {
        0 => CheckOutcome::pass("No TODO/FIXME markers"),
        n if n <= MAX_TODO_MARKERS => {
            CheckOutcome::pass(format!("{n} TODO/FIXME markers (limit {MAX_TODO_MARKERS})"))
        }
        n => CheckOutcome::fail(format!(
            "{n} TODO/FIXME markers, resolve or track them in an issue tracker: {}",
            summarize_hits(&hits)
        )),
    })
}

fn debug_statements(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut exts = JS_EXTENSIONS.to_vec();
    exts.push("py");
    let files = ctx.production_sources(&exts);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }
    let hits = ctx.scan_lines(&files, |line| {
        !is_comment_line(line) && debug_pattern().is_match(line)
    });
    Ok(if hits.len() > MAX_DEBUG_STATEMENTS {
        CheckOutcome::fail(format!(
            "{} debug statements left in production code: {}",
            hits.len(),
            summarize_hits(&hits)
        ))
        .auto_fixable()
    } else {
        CheckOutcome::pass(format!("{} debug statements", hits.len()))
    })
}

fn linter_configured(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let repo = ctx.repo;
    let js = repo.has_language("javascript") || repo.has_language("typescript");
    let python = repo.has_language("python");
    if !js && !python {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }

    let mut missing = Vec::new();
    if js {
        let configured = ctx.first_existing(ESLINT_CONFIGS).is_some()
            || repo
                .package_json
                .as_ref()
                .map(|p| p.field("eslintConfig").is_some() || p.script("lint").is_some())
                .unwrap_or(false)
            || ctx.find_dependency(&["eslint", "@biomejs/biome", "oxlint"]).is_some();
        if !configured {
            missing.push("JavaScript/TypeScript (eslint or biome)");
        }
    }
    if python {
        let configured = ctx.first_existing(PYTHON_LINT_CONFIGS).is_some()
            || pyproject_has_tool(ctx, &["ruff", "pylint", "flake8"])
            || ctx
                .read("setup.cfg")
                .map(|c| c.contains("[flake8]") || c.contains("[pylint"))
                .unwrap_or(false);
        if !configured {
            missing.push("Python (ruff, flake8 or pylint)");
        }
    }

    Ok(if missing.is_empty() {
        CheckOutcome::pass("Linter configuration found")
    } else {
        CheckOutcome::fail(format!("No linter configured for {}", missing.join(" and ")))
    })
}

/// Whether `pyproject.toml` has a `[tool.<name>]` table for any of `tools`
pub(super) fn pyproject_has_tool(ctx: &CheckContext<'_>, tools: &[&str]) -> bool {
    let Some(content) = ctx.read("pyproject.toml") else {
        return false;
    };
    let Ok(doc) = content.parse::<toml::Table>() else {
        return false;
    };
    doc.get("tool")
        .and_then(|t| t.as_table())
        .map(|t| tools.iter().any(|name| t.contains_key(*name)))
        .unwrap_or(false)
}

fn typescript_strict(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let Some(content) = ctx.read("tsconfig.json") else {
        return Ok(CheckOutcome::not_applicable("no tsconfig.json"));
    };
    Ok(CheckOutcome::from_bool(
        ts_strict_pattern().is_match(&content),
        "TypeScript strict mode enabled",
        "tsconfig.json does not enable \"strict\": true",
    ))
}

fn large_files(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let oversized: Vec<&Path> = super::base::sample(&files)
        .into_iter()
        .filter(|p| {
            ctx.read(p)
                .map(|c| c.lines().count() > MAX_FILE_LINES)
                .unwrap_or(false)
        })
        .collect();
    Ok(if oversized.is_empty() {
        CheckOutcome::pass(format!("No source file exceeds {MAX_FILE_LINES} lines"))
    } else {
        CheckOutcome::fail(format!(
            "{} files exceed {MAX_FILE_LINES} lines: {}",
            oversized.len(),
            summarize_paths(&oversized)
        ))
    })
}

fn mock_data(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.scan_lines(&files, |line| {
        !is_comment_line(line) && mock_data_pattern().is_match(line)
    });
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No mock data in production code")
    } else {
        CheckOutcome::fail(format!(
            "Mock or fake data referenced from production code: {}",
            summarize_hits(&hits)
        ))
    })
}

fn placeholder_text(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut exts = SOURCE_EXTENSIONS.to_vec();
    exts.extend_from_slice(MARKUP_EXTENSIONS);
    let files = ctx.production_sources(&exts);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.grep(&files, placeholder_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No placeholder content")
    } else {
        CheckOutcome::fail(format!(
            "Placeholder content found: {}",
            summarize_hits(&hits)
        ))
    })
}

fn stub_implementations(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.scan_lines(&files, |line| {
        !is_comment_line(line) && stub_pattern().is_match(line)
    });
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No stub implementations")
    } else {
        CheckOutcome::fail(format!(
            "{} unimplemented code paths: {}",
            hits.len(),
            summarize_hits(&hits)
        ))
    })
}

fn hardcoded_localhost(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    // An environment lookup with a localhost fallback is fine
    let hits = ctx.scan_lines(&files, |line| {
        !is_comment_line(line)
            && localhost_pattern().is_match(line)
            && !env_read_pattern().is_match(line)
    });
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No hardcoded localhost endpoints")
    } else {
        CheckOutcome::fail(format!(
            "Hardcoded localhost endpoints, read them from configuration: {}",
            summarize_hits(&hits)
        ))
    })
}

fn empty_catch(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut exts = JS_EXTENSIONS.to_vec();
    exts.push("py");
    let files = ctx.production_sources(&exts);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }
    let hits = ctx.grep_content(&files, empty_catch_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No empty catch blocks")
    } else {
        CheckOutcome::fail(format!(
            "{} exceptions silently swallowed: {}",
            hits.len(),
            summarize_hits(&hits)
        ))
    })
}
