//! Dependency hygiene checks (`dep-*`)

use super::base::{Check, CheckContext, CheckOutcome};
use crate::models::{Category, Severity};

const NODE_LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "npm-shrinkwrap.json",
    "bun.lockb",
    "bun.lock",
];

const PYTHON_LOCKFILES: &[&str] = &["poetry.lock", "Pipfile.lock", "uv.lock", "pdm.lock"];

const UPDATE_BOT_CONFIGS: &[&str] = &[
    ".github/dependabot.yml",
    ".github/dependabot.yaml",
    "renovate.json",
    "renovate.json5",
    ".renovaterc",
    ".renovaterc.json",
    ".github/renovate.json",
    ".gitlab/renovate.json",
];

/// More direct runtime dependencies than this fails dep-004
const MAX_DIRECT_DEPENDENCIES: usize = 100;

/// Unmaintained or superseded packages, with their replacement
const DEPRECATED_PACKAGES: &[(&str, &str)] = &[
    ("request", "fetch, undici or axios"),
    ("request-promise", "fetch, undici or axios"),
    ("node-sass", "sass"),
    ("tslint", "eslint with typescript-eslint"),
    ("babel-eslint", "@babel/eslint-parser"),
    ("gulp-util", "individual gulp plugins"),
    ("istanbul", "nyc or c8"),
    ("coffee-script", "coffeescript"),
    ("left-pad", "String.prototype.padStart"),
    ("querystring", "URLSearchParams"),
    ("pycrypto", "pycryptodome"),
    ("nose", "pytest"),
    ("distribute", "setuptools"),
];

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Dependencies;
    vec![
        Check::new("dep-001", "Lockfile committed", c, Severity::High, lockfile),
        Check::new("dep-002", "Dependency versions are bounded", c, Severity::Medium, unbounded_versions),
        Check::new("dep-003", "Automated dependency updates", c, Severity::Low, update_automation),
        Check::new("dep-004", "Reasonable dependency count", c, Severity::Low, dependency_count),
        Check::new("dep-005", "No deprecated packages", c, Severity::Medium, deprecated_packages),
        Check::new("dep-006", "No duplicate dependency declarations", c, Severity::Low, duplicate_declarations),
    ]
}

fn has_python_root_manifest(ctx: &CheckContext<'_>) -> bool {
    ctx.first_existing(&["requirements.txt", "pyproject.toml", "Pipfile"])
        .is_some()
}

fn lockfile(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let node = ctx
        .repo
        .package_json
        .as_ref()
        .map(|p| p.all_dependencies().next().is_some())
        .unwrap_or(false);
    let python = has_python_root_manifest(ctx);
    if !node && !python {
        return Ok(CheckOutcome::not_applicable("no dependency manifest at the root"));
    }

    let mut missing = Vec::new();
    if node && ctx.first_existing(NODE_LOCKFILES).is_none() {
        missing.push("package.json has no lockfile (package-lock.json, yarn.lock, pnpm-lock.yaml)");
    }
    if python && ctx.first_existing(PYTHON_LOCKFILES).is_none() {
        // A fully pinned requirements file is its own lock
        let pinned = ctx
            .repo
            .requirements_txt
            .as_ref()
            .map(|reqs| !reqs.is_empty() && reqs.iter().all(|r| r.is_pinned()))
            .unwrap_or(false);
        if !pinned {
            missing.push("Python dependencies are neither locked nor fully pinned");
        }
    }

    Ok(if missing.is_empty() {
        CheckOutcome::pass("Dependency versions are locked")
    } else {
        CheckOutcome::fail(missing.join("; "))
    })
}

fn is_unbounded_range(range: &str) -> bool {
    matches!(range.trim(), "" | "*" | "x" | "latest" | "next")
}

fn unbounded_versions(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let pkg = ctx.repo.package_json.as_ref();
    let reqs = ctx.repo.requirements_txt.as_ref();
    if pkg.is_none() && reqs.is_none() {
        return Ok(CheckOutcome::not_applicable("no dependency manifest at the root"));
    }

    let mut unbounded: Vec<String> = pkg
        .into_iter()
        .flat_map(|p| p.all_dependencies())
        .filter(|(_, range)| is_unbounded_range(range))
        .map(|(name, range)| format!("{name}@{}", if range.is_empty() { "\"\"" } else { range }))
        .collect();
    let python_locked = ctx.first_existing(PYTHON_LOCKFILES).is_some();
    if !python_locked {
        unbounded.extend(
            reqs.into_iter()
                .flatten()
                .filter(|r| r.spec.is_none())
                .map(|r| r.name.clone()),
        );
    }

    Ok(if unbounded.is_empty() {
        CheckOutcome::pass("Every dependency declares a version range")
    } else {
        CheckOutcome::fail(format!(
            "{} dependencies accept any version: {}",
            unbounded.len(),
            unbounded.join(", ")
        ))
    })
}

fn update_automation(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_node_manifest() && !ctx.repo.has_python_manifest() {
        return Ok(CheckOutcome::not_applicable("no dependency manifests"));
    }
    let configured = ctx.first_existing(UPDATE_BOT_CONFIGS).is_some()
        || ctx
            .repo
            .package_json
            .as_ref()
            .map(|p| p.field("renovate").is_some())
            .unwrap_or(false);
    Ok(CheckOutcome::from_bool(
        configured,
        "Dependabot or Renovate keeps dependencies current",
        "No Dependabot or Renovate configuration",
    ))
}

fn dependency_count(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let node = ctx.repo.package_json.as_ref().map(|p| p.dependencies.len());
    let python = ctx.repo.requirements_txt.as_ref().map(Vec::len);
    let (count, label) = match (node, python) {
        (Some(n), Some(p)) => (n.max(p), "direct dependencies"),
        (Some(n), None) => (n, "runtime dependencies in package.json"),
        (None, Some(p)) => (p, "requirements in requirements.txt"),
        (None, None) => {
            return Ok(CheckOutcome::not_applicable("no dependency manifest at the root"))
        }
    };
    Ok(if count > MAX_DIRECT_DEPENDENCIES {
        CheckOutcome::fail(format!(
            "{count} {label}, prune unused packages (limit {MAX_DIRECT_DEPENDENCIES})"
        ))
    } else {
        CheckOutcome::pass(format!("{count} {label}"))
    })
}

fn deprecated_packages(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if ctx.repo.dependencies.is_empty() {
        return Ok(CheckOutcome::not_applicable("no declared dependencies"));
    }
    let found: Vec<String> = DEPRECATED_PACKAGES
        .iter()
        .filter(|(name, _)| ctx.repo.has_dependency(name))
        .map(|(name, replacement)| format!("{name} (use {replacement})"))
        .collect();
    Ok(if found.is_empty() {
        CheckOutcome::pass("No deprecated packages")
    } else {
        CheckOutcome::fail(format!("Deprecated packages: {}", found.join(", ")))
    })
}

fn duplicate_declarations(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let Some(pkg) = ctx.repo.package_json.as_ref() else {
        return Ok(CheckOutcome::not_applicable("no package.json"));
    };
    let duplicated: Vec<&str> = pkg
        .dependencies
        .keys()
        .filter(|name| pkg.dev_dependencies.contains_key(*name))
        .map(String::as_str)
        .collect();
    Ok(if duplicated.is_empty() {
        CheckOutcome::pass("No package is both a runtime and a dev dependency")
    } else {
        CheckOutcome::fail(format!(
            "Declared in both dependencies and devDependencies: {}",
            duplicated.join(", ")
        ))
        .auto_fixable()
    })
}
