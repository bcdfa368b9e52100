//! Test suite checks (`test-*`)

use super::base::{file_name, Check, CheckContext, CheckOutcome, SOURCE_EXTENSIONS};
use super::code_quality::pyproject_has_tool;
use crate::context::frameworks::FRONTEND_FRAMEWORKS;
use crate::models::{Category, Severity};
use std::path::Path;

/// Minimum test files per production source file
const MIN_TEST_RATIO: f64 = 0.1;

/// What `npm init` writes into an empty `test` script
const NPM_DEFAULT_TEST: &str = "no test specified";

const COVERAGE_CONFIGS: &[&str] = &[
    ".nycrc",
    ".nycrc.json",
    ".nycrc.yml",
    ".c8rc",
    ".c8rc.json",
    ".coveragerc",
    "codecov.yml",
    ".codecov.yml",
    "coverage.config.js",
];

const E2E_DEPENDENCIES: &[&str] = &[
    "cypress",
    "@playwright/test",
    "playwright",
    "puppeteer",
    "webdriverio",
    "nightwatch",
    "testcafe",
    "detox",
];

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Testing;
    vec![
        Check::new("test-001", "Automated tests present", c, Severity::High, tests_present),
        Check::new("test-002", "Test script defined", c, Severity::Medium, test_script),
        Check::new("test-003", "Python tests present", c, Severity::Medium, python_tests),
        Check::new("test-004", "Test to source ratio", c, Severity::Medium, test_ratio),
        Check::new("test-005", "Coverage reporting configured", c, Severity::Low, coverage_config),
        Check::new("test-006", "End-to-end tests for the UI", c, Severity::Low, e2e_tests),
    ]
}

fn tests_present(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if ctx.source_files().is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let tests = ctx.test_files();
    Ok(if tests.is_empty() {
        CheckOutcome::fail("No test files found")
    } else {
        CheckOutcome::pass(format!("{} test files", tests.len()))
    })
}

fn test_script(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let Some(pkg) = ctx.repo.package_json.as_ref() else {
        return Ok(CheckOutcome::not_applicable("no package.json"));
    };
    Ok(match pkg.script("test") {
        Some(script) if !script.contains(NPM_DEFAULT_TEST) && !script.trim().is_empty() => {
            CheckOutcome::pass(format!("npm test runs `{script}`"))
        }
        Some(_) => CheckOutcome::fail("The test script is the npm placeholder"),
        None => CheckOutcome::fail("package.json has no test script"),
    })
}

fn is_python_test(path: &Path) -> bool {
    let name = file_name(path);
    name.ends_with(".py")
        && (name.starts_with("test_")
            || name.ends_with("_test.py")
            || name == "conftest.py"
            || path.components().any(|c| c.as_os_str() == "tests"))
}

fn python_tests(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_language("python") {
        return Ok(CheckOutcome::not_applicable("no Python sources"));
    }
    let count = ctx.repo.files.iter().filter(|p| is_python_test(p)).count();
    Ok(if count > 0 {
        CheckOutcome::pass(format!("{count} Python test modules"))
    } else {
        CheckOutcome::fail("Python code without pytest or unittest modules")
    })
}

fn test_ratio(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let production = ctx.production_sources(SOURCE_EXTENSIONS).len();
    if production == 0 {
        return Ok(CheckOutcome::not_applicable("no production source files"));
    }
    let tests = ctx.test_files().len();
    let ratio = tests as f64 / production as f64;
    let summary = format!("{tests} test files for {production} source files ({ratio:.2})");
    Ok(if ratio >= MIN_TEST_RATIO {
        CheckOutcome::pass(summary)
    } else {
        CheckOutcome::fail(format!("{summary}, below {MIN_TEST_RATIO}"))
    })
}

fn coverage_config(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if ctx.source_files().is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let in_package_json = ctx
        .repo
        .package_json
        .as_ref()
        .map(|p| {
            p.scripts.values().any(|s| {
                s.contains("--coverage") || s.contains("c8 ") || s.contains("nyc ")
            }) || p
                .field("jest")
                .map(|j| j.get("collectCoverage").is_some() || j.get("coverageThreshold").is_some())
                .unwrap_or(false)
                || p.field("nyc").is_some()
                || p.field("c8").is_some()
        })
        .unwrap_or(false);
    let in_runner_config = ctx.any_content(
        &ctx.files_named(|n| {
            n.starts_with("jest.config") || n.starts_with("vitest.config") || n.starts_with("vite.config")
        }),
        |c| c.contains("coverage"),
    );
    let configured = in_package_json
        || in_runner_config
        || ctx.first_existing(COVERAGE_CONFIGS).is_some()
        || pyproject_has_tool(ctx, &["coverage"])
        || ctx
            .read("setup.cfg")
            .map(|c| c.contains("[coverage:"))
            .unwrap_or(false);
    Ok(CheckOutcome::from_bool(
        configured,
        "Coverage reporting configured",
        "No coverage tooling configured",
    ))
}

fn e2e_tests(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(FRONTEND_FRAMEWORKS) {
        return Ok(CheckOutcome::not_applicable("no frontend framework"));
    }
    let tool = ctx.find_dependency(E2E_DEPENDENCIES);
    let has_dir = ctx.has_dir("e2e") || ctx.has_dir("cypress") || ctx.has_dir("tests/e2e");
    let has_config = !ctx
        .files_named(|n| n.starts_with("playwright.config") || n.starts_with("cypress.config"))
        .is_empty();
    Ok(match tool {
        Some(tool) => CheckOutcome::pass(format!("End-to-end tests with {tool}")),
        None if has_dir || has_config => CheckOutcome::pass("End-to-end test suite found"),
        None => CheckOutcome::fail("Frontend without browser end-to-end tests"),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_check;
    use super::*;

    #[test]
    fn test_tests_present() {
        assert!(!run_check("test-001", &[("src/app.js", "x")]).passed);
        assert!(run_check("test-001", &[("src/app.js", "x"), ("src/app.test.js", "x")]).passed);
        assert!(run_check("test-001", &[("README.md", "x")]).message.starts_with("Not applicable"));
    }

    #[test]
    fn test_npm_placeholder_script() {
        let placeholder = r#"{"scripts":{"test":"echo \"Error: no test specified\" && exit 1"}}"#;
        assert!(!run_check("test-002", &[("package.json", placeholder)]).passed);
        assert!(run_check("test-002", &[("package.json", r#"{"scripts":{"test":"vitest run"}}"#)]).passed);
        assert!(!run_check("test-002", &[("package.json", "{}")]).passed);
    }

    #[test]
    fn test_python_tests_not_applicable_to_javascript() {
        let outcome = run_check("test-003", &[("src/index.js", "x")]);
        assert!(outcome.passed);
        assert!(outcome.message.starts_with("Not applicable"));
    }

    #[test]
    fn test_python_tests() {
        assert!(is_python_test(Path::new("tests/helpers.py")));
        assert!(is_python_test(Path::new("pkg/test_models.py")));
        assert!(!is_python_test(Path::new("pkg/models.py")));
        assert!(!run_check("test-003", &[("app/main.py", "x")]).passed);
        assert!(run_check("test-003", &[("app/main.py", "x"), ("tests/test_main.py", "x")]).passed);
    }

    #[test]
    fn test_ratio_threshold() {
        let sources: Vec<(String, &str)> = (0..11).map(|i| (format!("src/m{i}.ts"), "x")).collect();
        let mut files: Vec<(&str, &str)> = sources.iter().map(|(p, c)| (p.as_str(), *c)).collect();
        files.push(("src/m0.test.ts", "x"));
        // 1 test for 11 sources
        assert!(!run_check("test-004", &files).passed);
        files.push(("src/m1.test.ts", "x"));
        assert!(run_check("test-004", &files).passed);
    }

    #[test]
    fn test_coverage_config() {
        assert!(!run_check("test-005", &[("src/a.js", "x")]).passed);
        let pkg = r#"{"scripts":{"test":"jest --coverage"}}"#;
        assert!(run_check("test-005", &[("src/a.js", "x"), ("package.json", pkg)]).passed);
        assert!(run_check("test-005", &[("a.py", "x"), (".coveragerc", "[run]\n")]).passed);
    }

    #[test]
    fn test_e2e_only_for_frontends() {
        let api = r#"{"dependencies":{"express":"4"}}"#;
        assert!(run_check("test-006", &[("package.json", api)]).message.starts_with("Not applicable"));
        let web = r#"{"dependencies":{"react":"18"}}"#;
        assert!(!run_check("test-006", &[("package.json", web)]).passed);
        let tested = r#"{"dependencies":{"react":"18"},"devDependencies":{"@playwright/test":"1"}}"#;
        assert!(run_check("test-006", &[("package.json", tested)]).passed);
    }
}
