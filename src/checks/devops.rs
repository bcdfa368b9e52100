//! Build, deploy and runtime checks (`ops-*`)

use super::base::{file_name, static_regex, Check, CheckContext, CheckOutcome, SOURCE_EXTENSIONS};
use crate::context::frameworks::SERVER_FRAMEWORKS;
use crate::models::{Category, Severity};
use std::path::{Path, PathBuf};

/// Root-level CI definitions whose content is inspected by ops-006
const CI_CONFIG_FILES: &[&str] = &[
    ".gitlab-ci.yml",
    ".travis.yml",
    "azure-pipelines.yml",
    "Jenkinsfile",
    "bitbucket-pipelines.yml",
    ".drone.yml",
    "appveyor.yml",
];

const CI_CONFIG_DIRS: &[&str] = &[".github/workflows", ".circleci", ".buildkite", "buildkite"];

const ENV_TEMPLATES: &[&str] = &[".env.example", ".env.sample", ".env.template", ".env.dist", ".env.defaults"];

static_regex!(from_pattern, r"(?im)^[ \t]*FROM[ \t]+(?:--platform=\S+[ \t]+)?(\S+)(?:[ \t]+AS[ \t]+(\S+))?");
static_regex!(user_pattern, r"(?im)^[ \t]*USER[ \t]+(\S+)");
static_regex!(
    ci_test_pattern,
    r"(?i)\b(npm|pnpm|yarn|bun)\s+(run\s+)?test\b|\b(pytest|tox|nox|jest|vitest|mocha|go\s+test|cargo\s+(test|nextest)|mvn\s+(test|verify)|gradle\w*\s+(test|check)|rspec|phpunit)\b|\bmake\s+test\b"
);
static_regex!(
    health_route_pattern,
    r#"['"`/](health|healthz|healthcheck|livez|readyz|ready|ping|status)['"`/]"#
);
static_regex!(env_read_pattern, r"process\.env\b|import\.meta\.env|os\.environ|os\.getenv|getenv\(");

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Devops;
    vec![
        Check::new("ops-001", "Continuous integration configured", c, Severity::High, ci_configured),
        Check::new("ops-002", "Containerized build", c, Severity::Medium, dockerfile),
        Check::new("ops-003", ".dockerignore present", c, Severity::Low, dockerignore),
        Check::new("ops-004", "Pinned Docker base images", c, Severity::Medium, pinned_base_image),
        Check::new("ops-005", "Container runs as non-root", c, Severity::Medium, non_root_user),
        Check::new("ops-006", "CI runs the test suite", c, Severity::Medium, ci_runs_tests),
        Check::new("ops-007", "Health check endpoint", c, Severity::Low, health_check),
        Check::new("ops-008", "Environment variables documented", c, Severity::Low, env_template),
    ]
}

fn ci_configured(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    Ok(CheckOutcome::from_bool(
        ctx.repo.has_ci,
        "CI pipeline configuration found",
        "No CI configuration (GitHub Actions, GitLab CI, CircleCI, ...)",
    ))
}

fn dockerfiles(ctx: &CheckContext<'_>) -> Vec<PathBuf> {
    ctx.repo
        .files
        .iter()
        .filter(|p| {
            let name = file_name(p);
            name == "Dockerfile" || name.starts_with("Dockerfile.") || name.ends_with(".dockerfile")
        })
        .cloned()
        .collect()
}

fn dockerfile(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if ctx.repo.has_dockerfile {
        return Ok(CheckOutcome::pass("Dockerfile at the repository root"));
    }
    let nested = dockerfiles(ctx);
    Ok(match nested.first() {
        Some(path) => CheckOutcome::pass(format!("Dockerfile found at {}", path.display())),
        None => CheckOutcome::fail("No Dockerfile, the build is not reproducible as a container"),
    })
}

fn dockerignore(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_dockerfile {
        return Ok(CheckOutcome::not_applicable("no Dockerfile at the root"));
    }
    Ok(CheckOutcome::from_bool(
        ctx.exists(".dockerignore"),
        ".dockerignore keeps the build context small",
        "No .dockerignore, the whole tree (including secrets) is sent to the build",
    )
    .auto_fixable_if_failed())
}

/// `FROM` images that float: no tag, or `latest`
fn unpinned_images(dockerfile: &str) -> Vec<String> {
    let mut stages: Vec<String> = Vec::new();
    let mut unpinned = Vec::new();
    for caps in from_pattern().captures_iter(dockerfile) {
        let image = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let lowered = image.to_lowercase();
        let known_stage = stages.iter().any(|s| *s == lowered);
        if let Some(alias) = caps.get(2) {
            stages.push(alias.as_str().to_lowercase());
        }
        if known_stage || lowered == "scratch" || image.contains("${") || image.contains('@') {
            continue;
        }
        // Registry ports contain ':' too, so only the last path segment carries the tag
        let last = image.rsplit('/').next().unwrap_or(image);
        match last.split_once(':') {
            Some((_, tag)) if tag != "latest" => {}
            _ => unpinned.push(image.to_string()),
        }
    }
    unpinned
}

fn pinned_base_image(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let Some(content) = ctx.read("Dockerfile") else {
        return Ok(CheckOutcome::not_applicable("no Dockerfile at the root"));
    };
    let unpinned = unpinned_images(&content);
    Ok(if unpinned.is_empty() {
        CheckOutcome::pass("Base images are pinned to a version")
    } else {
        CheckOutcome::fail(format!(
            "Base images without a version tag: {}",
            unpinned.join(", ")
        ))
    })
}

fn non_root_user(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let Some(content) = ctx.read("Dockerfile") else {
        return Ok(CheckOutcome::not_applicable("no Dockerfile at the root"));
    };
    let last_user = user_pattern()
        .captures_iter(&content)
        .filter_map(|c| c.get(1))
        .last()
        .map(|m| m.as_str().to_string());
    Ok(match last_user.as_deref() {
        None => CheckOutcome::fail("Dockerfile never sets USER, the container runs as root"),
        Some("root") | Some("0") | Some("0:0") => {
            CheckOutcome::fail("Dockerfile switches to the root user")
        }
        Some(user) => CheckOutcome::pass(format!("Container runs as {user}")),
    })
}

fn ci_runs_tests(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_ci {
        return Ok(CheckOutcome::not_applicable("no CI configuration"));
    }
    let mut configs: Vec<&Path> = CI_CONFIG_FILES
        .iter()
        .filter(|f| ctx.exists(f))
        .map(Path::new)
        .collect();
    configs.extend(
        ctx.repo
            .files
            .iter()
            .filter(|p| CI_CONFIG_DIRS.iter().any(|d| p.starts_with(d)))
            .map(PathBuf::as_path),
    );
    // `npm test` runs whatever the test script says
    let runs_tests = ctx.any_content(&configs, |c| ci_test_pattern().is_match(c));
    Ok(CheckOutcome::from_bool(
        runs_tests,
        "CI pipeline runs the test suite",
        "CI configuration never runs tests",
    ))
}

fn health_check(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let server = ctx.repo.has_any_framework(SERVER_FRAMEWORKS);
    if !server && !ctx.repo.has_dockerfile {
        return Ok(CheckOutcome::not_applicable("no server framework or container"));
    }
    if ctx
        .read("Dockerfile")
        .map(|c| c.contains("HEALTHCHECK"))
        .unwrap_or(false)
    {
        return Ok(CheckOutcome::pass("Dockerfile declares a HEALTHCHECK"));
    }
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    let hits = ctx.grep(&files, health_route_pattern());
    Ok(match hits.first() {
        Some(hit) => CheckOutcome::pass(format!(
            "Health endpoint at {}:{}",
            hit.path.display(),
            hit.line
        )),
        None => CheckOutcome::fail("No health check endpoint or container HEALTHCHECK"),
    })
}

fn env_template(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if ctx.grep(&files, env_read_pattern()).is_empty() {
        return Ok(CheckOutcome::not_applicable("code reads no environment variables"));
    }
    Ok(CheckOutcome::from_bool(
        ctx.first_existing(ENV_TEMPLATES).is_some(),
        "Environment variables are documented in an env template",
        "Code reads environment variables but there is no .env.example",
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_check;
    use super::*;

    #[test]
    fn test_ci_configured() {
        assert!(!run_check("ops-001", &[("a.js", "x")]).passed);
        assert!(run_check("ops-001", &[(".github/workflows/ci.yml", "on: push")]).passed);
        assert!(run_check("ops-001", &[(".gitlab-ci.yml", "test:")]).passed);
    }

    #[test]
    fn test_dockerfile_nested_counts() {
        assert!(!run_check("ops-002", &[("a.js", "x")]).passed);
        assert!(run_check("ops-002", &[("services/api/Dockerfile", "FROM node:20")]).passed);
    }

    #[test]
    fn test_dockerignore() {
        assert!(run_check("ops-003", &[("a.js", "x")]).message.starts_with("Not applicable"));
        let outcome = run_check("ops-003", &[("Dockerfile", "FROM node:20")]);
        assert!(!outcome.passed);
        assert_eq!(outcome.auto_fixable, Some(true));
    }

    #[test]
    fn test_unpinned_images() {
        let multi = "FROM node:20-alpine AS build\nRUN npm ci\nFROM build AS test\nFROM nginx\nFROM registry:5000/app:latest\nFROM scratch\n";
        assert_eq!(unpinned_images(multi), vec!["nginx", "registry:5000/app:latest"]);
        assert!(unpinned_images("FROM --platform=linux/amd64 python:3.12-slim\n").is_empty());
        assert!(unpinned_images("FROM python@sha256:abc\n").is_empty());
    }

    #[test]
    fn test_non_root_user() {
        assert!(!run_check("ops-005", &[("Dockerfile", "FROM node:20\nCMD node\n")]).passed);
        assert!(run_check("ops-005", &[("Dockerfile", "FROM node:20\nUSER node\n")]).passed);
        assert!(!run_check("ops-005", &[("Dockerfile", "FROM node:20\nUSER app\nUSER root\n")]).passed);
    }

    #[test]
    fn test_ci_runs_tests() {
        let workflow = "jobs:\n  test:\n    steps:\n      - run: npm ci\n      - run: npm test\n";
        assert!(run_check("ops-006", &[(".github/workflows/ci.yml", workflow)]).passed);
        let deploy = "jobs:\n  deploy:\n    steps:\n      - run: ./deploy.sh\n";
        assert!(!run_check("ops-006", &[(".github/workflows/cd.yml", deploy)]).passed);
    }

    #[test]
    fn test_health_check() {
        let pkg = r#"{"dependencies":{"express":"4"}}"#;
        assert!(!run_check("ops-007", &[("package.json", pkg), ("src/app.js", "app.get('/users')")]).passed);
        assert!(run_check(
            "ops-007",
            &[("package.json", pkg), ("src/app.js", "app.get('/health', ok)")]
        )
        .passed);
    }

    #[test]
    fn test_env_template() {
        let code = "const port = process.env.PORT;\n";
        assert!(!run_check("ops-008", &[("src/app.js", code)]).passed);
        assert!(run_check("ops-008", &[("src/app.js", code), (".env.example", "PORT=3000\n")]).passed);
        assert!(run_check("ops-008", &[("src/app.js", "run()")])
            .message
            .starts_with("Not applicable"));
    }
}
