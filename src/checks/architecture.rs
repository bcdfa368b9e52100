//! Project structure checks (`arch-*`)

use super::base::{
    static_regex, summarize_hits, summarize_paths, Check, CheckContext, CheckOutcome,
    JS_EXTENSIONS, SOURCE_EXTENSIONS,
};
use crate::context::frameworks::{MONOREPO, SERVER_FRAMEWORKS};
use crate::models::{Category, Severity};
use std::path::{Component, Path};

/// Conventional top-level source directories
const SOURCE_DIRS: &[&str] = &[
    "src", "lib", "app", "pkg", "cmd", "internal", "packages", "apps", "services", "server",
    "client", "components", "pages", "api", "modules",
];

/// More source files than this directly at the root fails arch-001
const MAX_ROOT_SOURCE_FILES: usize = 5;

/// More imports than this in one file fails arch-002
const MAX_IMPORTS_PER_FILE: usize = 30;

static_regex!(
    import_pattern,
    r#"^\s*(import\s|from\s+\S+\s+import\s|export\s+\*\s+from\s)|\brequire\(\s*['"]"#
);
static_regex!(deep_relative_import, r#"(from\s+|require\(\s*|import\s*\(\s*)['"](\.\./){4,}"#);
static_regex!(env_read_pattern, r"process\.env\b|import\.meta\.env|os\.environ|os\.getenv|getenv\(");

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Architecture;
    vec![
        Check::new("arch-001", "Source code is organized in directories", c, Severity::Low, source_layout),
        Check::new("arch-002", "No import-heavy modules", c, Severity::Low, import_heavy_modules),
        Check::new("arch-003", "Configuration separated from code", c, Severity::Medium, config_separation),
        Check::new("arch-004", "No deeply nested relative imports", c, Severity::Low, deep_relative_imports),
        Check::new("arch-005", "Workspace packages are named", c, Severity::Low, workspace_packages_named),
    ]
}

fn is_root_level(path: &Path) -> bool {
    path.components().count() == 1
}

fn source_layout(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let sources = ctx.production_sources(SOURCE_EXTENSIONS);
    if sources.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let at_root: Vec<&Path> = sources.iter().copied().filter(|p| is_root_level(p)).collect();
    let has_source_dir = SOURCE_DIRS.iter().any(|d| ctx.repo.has_root_dir(d));

    Ok(if at_root.len() <= MAX_ROOT_SOURCE_FILES || has_source_dir {
        CheckOutcome::pass(format!(
            "{} of {} source files live in subdirectories",
            sources.len() - at_root.len(),
            sources.len()
        ))
    } else {
        CheckOutcome::fail(format!(
            "{} source files sit at the repository root without a source directory: {}",
            at_root.len(),
            summarize_paths(&at_root)
        ))
    })
}

fn import_heavy_modules(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut exts = JS_EXTENSIONS.to_vec();
    exts.push("py");
    let files = ctx.production_sources(&exts);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }
    let heavy: Vec<&Path> = super::base::sample(&files)
        .into_iter()
        .filter(|p| {
            ctx.read(p)
                .map(|c| c.lines().filter(|l| import_pattern().is_match(l)).count() > MAX_IMPORTS_PER_FILE)
                .unwrap_or(false)
        })
        .collect();
    Ok(if heavy.is_empty() {
        CheckOutcome::pass(format!("No module has more than {MAX_IMPORTS_PER_FILE} imports"))
    } else {
        CheckOutcome::fail(format!(
            "Modules with more than {MAX_IMPORTS_PER_FILE} imports, consider splitting them: {}",
            summarize_paths(&heavy)
        ))
    })
}

fn has_config_module(ctx: &CheckContext<'_>) -> bool {
    ctx.any_path(|p| {
        let in_config_dir = p.components().any(|c| match c {
            Component::Normal(s) => matches!(s.to_str(), Some("config") | Some("configs") | Some("settings")),
            _ => false,
        });
        let stem = p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_lowercase();
        in_config_dir || matches!(stem.as_str(), "config" | "settings" | "configuration" | "env")
    })
}

fn config_separation(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(SERVER_FRAMEWORKS) {
        return Ok(CheckOutcome::not_applicable("no server framework"));
    }
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    let reads_env = !ctx.grep(&files, env_read_pattern()).is_empty();
    Ok(CheckOutcome::from_bool(
        reads_env || has_config_module(ctx),
        "Runtime configuration comes from the environment or a config module",
        "Server code has no configuration layer, settings are hardcoded",
    ))
}

fn deep_relative_imports(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut exts = JS_EXTENSIONS.to_vec();
    exts.push("py");
    let files = ctx.production_sources(&exts);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }
    let hits = ctx.grep(&files, deep_relative_import());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No imports climb more than three directories")
    } else {
        CheckOutcome::fail(format!(
            "Imports reaching four or more levels up, use path aliases: {}",
            summarize_hits(&hits)
        ))
    })
}

fn workspace_packages_named(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_framework(MONOREPO) {
        return Ok(CheckOutcome::not_applicable("not a monorepo"));
    }
    let unnamed: Vec<&Path> = ctx
        .repo
        .package_json_paths
        .iter()
        .filter(|p| !is_root_level(p))
        .filter(|p| {
            ctx.read_json(p)
                .map(|v| v.get("name").and_then(|n| n.as_str()).is_none())
                .unwrap_or(true)
        })
        .map(|p| p.as_path())
        .collect();
    Ok(if unnamed.is_empty() {
        CheckOutcome::pass(format!(
            "{} workspace packages, all named",
            ctx.repo.package_json_paths.len().saturating_sub(1)
        ))
    } else {
        CheckOutcome::fail(format!(
            "Workspace packages without a valid \"name\": {}",
            summarize_paths(&unnamed)
        ))
    })
}
