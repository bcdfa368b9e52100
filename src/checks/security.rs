//! Security checks (`sec-*`)

use super::base::{
    file_name, is_comment_line, is_test_path, static_regex, summarize_hits, summarize_paths,
    Check, CheckContext, CheckOutcome, Hit, JS_EXTENSIONS, SOURCE_EXTENSIONS,
};
use crate::models::{Category, Severity};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Suffixes that mark an env file as a committed template
const ENV_TEMPLATE_SUFFIXES: &[&str] = &[".example", ".sample", ".template", ".dist", ".defaults"];

/// Text files searched for hardcoded credentials, beyond source code
const CONFIG_EXTENSIONS: &[&str] = &[
    "json", "yml", "yaml", "toml", "ini", "cfg", "conf", "properties", "xml", "sh", "tf",
];

const PRIVATE_KEY_EXTENSIONS: &[&str] = &["pem", "key", "p12", "pfx", "jks", "keystore", "ppk"];
const PRIVATE_KEY_NAMES: &[&str] = &["id_rsa", "id_dsa", "id_ecdsa", "id_ed25519"];

/// Hosts for which plain http is acceptable
const HTTP_ALLOWED_HOSTS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "0.0.0.0",
    "www.w3.org",
    "w3.org",
    "schemas.",
    "xmlns",
    "example.com",
    "example.org",
    "json-schema.org",
];

static SECRET_PATTERNS: OnceLock<Vec<SecretPattern>> = OnceLock::new();

struct SecretPattern {
    name: &'static str,
    pattern: Regex,
}

fn secret_patterns() -> &'static Vec<SecretPattern> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            ("AWS access key", r"\bAKIA[0-9A-Z]{16}\b"),
            (
                "AWS secret key",
                r"(?i)aws_secret_access_key\s*[=:]\s*['\x22]?[A-Za-z0-9/+=]{40}",
            ),
            ("GitHub token", r"\bgh[pousr]_[A-Za-z0-9]{36}\b"),
            ("Slack token", r"\bxox[baprs]-[0-9]{10,13}-[0-9]{10,13}[A-Za-z0-9-]*"),
            ("Stripe live key", r"\b[sr]k_live_[A-Za-z0-9]{24,}"),
            ("SendGrid key", r"\bSG\.[A-Za-z0-9_-]{22}\.[A-Za-z0-9_-]{43}\b"),
            ("Google API key", r"\bAIza[0-9A-Za-z_-]{35}\b"),
            ("Private key block", r"-----BEGIN (RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----"),
            (
                "Database URL with password",
                r"(?i)\b(postgres(ql)?|mysql|mongodb(\+srv)?|redis|amqp)://[^:\s/'\x22]+:[^@\s'\x22$]{3,}@",
            ),
            (
                "Hardcoded credential",
                r#"(?i)\b(api[_-]?key|secret[_-]?key|client[_-]?secret|auth[_-]?token|password|passwd)\b['"]?\s*[:=]\s*['"][^'"\s$]{8,}['"]"#,
            ),
        ]
        .into_iter()
        .map(|(name, pattern)| SecretPattern {
            name,
            pattern: Regex::new(pattern).expect("valid regex"),
        })
        .collect()
    })
}

static_regex!(dynamic_eval_js, r"\beval\s*\(|\bnew\s+Function\s*\(");
static_regex!(dynamic_eval_py, r"\b(eval|exec)\s*\(");
static_regex!(
    cors_wildcard_pattern,
    r#"(?i)access-control-allow-origin['"]?\s*[,:]\s*['"]\*['"]|\borigin\s*:\s*['"]\*['"]|\bcors\(\s*\)|CORS_(ORIGIN_ALLOW_ALL|ALLOW_ALL_ORIGINS)\s*=\s*True|allow_origins\s*=\s*\[\s*['"]\*['"]\s*\]"#
);
static_regex!(
    sql_concat_pattern,
    r#"(?i)['"`]\s*(SELECT|INSERT\s+INTO|UPDATE|DELETE\s+FROM)\b[^'"`]*['"`]\s*\+\s*[A-Za-z_]|`\s*(SELECT|INSERT\s+INTO|UPDATE|DELETE\s+FROM)\b[^`]*\$\{|\bf['"]\s*(SELECT|INSERT\s+INTO|UPDATE|DELETE\s+FROM)\b[^'"]*\{|['"]\s*(SELECT|INSERT\s+INTO|UPDATE|DELETE\s+FROM)\b[^'"]*%s['"]\s*%"#
);

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Security;
    vec![
        Check::new("sec-001", "No committed .env files", c, Severity::Blocker, committed_env),
        Check::new("sec-002", "No hardcoded secrets", c, Severity::High, hardcoded_secrets),
        Check::new("sec-003", ".gitignore excludes env files", c, Severity::Medium, gitignore_env),
        Check::new("sec-004", "No private key files", c, Severity::High, private_key_files),
        Check::new("sec-005", "No dynamic code evaluation", c, Severity::Medium, dynamic_eval),
        Check::new("sec-006", "Security policy", c, Severity::Low, security_policy),
        Check::new("sec-007", "No wildcard CORS", c, Severity::Medium, cors_wildcard),
        Check::new("sec-008", "No SQL built by string concatenation", c, Severity::High, sql_concat),
        Check::new("sec-009", "No insecure http URLs", c, Severity::Low, insecure_http),
    ]
}

/// `.env`, `.env.local`, `.env.production`, but not `.env.example`
fn is_live_env_file(name: &str) -> bool {
    if name != ".env" && !name.starts_with(".env.") {
        return false;
    }
    !ENV_TEMPLATE_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn committed_env(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut found: Vec<String> = ctx
        .repo
        .root_entries
        .iter()
        .filter(|e| !e.is_dir && is_live_env_file(&e.name))
        .map(|e| e.name.clone())
        .collect();
    for path in ctx.repo.files.iter() {
        if is_live_env_file(&file_name(path)) {
            let rel = path.display().to_string();
            if !found.contains(&rel) {
                found.push(rel);
            }
        }
    }

    Ok(if found.is_empty() {
        CheckOutcome::pass("No .env files in the repository")
    } else {
        CheckOutcome::fail(format!(
            "Environment files with live configuration are committed: {}. Remove them, rotate the secrets and commit a .env.example instead",
            found.join(", ")
        ))
    })
}

fn hardcoded_secrets(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut exts = SOURCE_EXTENSIONS.to_vec();
    exts.extend_from_slice(CONFIG_EXTENSIONS);
    let files: Vec<&Path> = ctx
        .files_with_extensions(&exts)
        .into_iter()
        .filter(|p| !is_test_path(p) && !is_lockfile(p))
        .collect();
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source or configuration files"));
    }

    let mut kinds: Vec<&'static str> = Vec::new();
    let hits: Vec<Hit> = ctx.scan_lines(&files, |line| {
        secret_patterns().iter().any(|p| p.pattern.is_match(line))
    });
    for hit in hits.iter().take(20) {
        let Some(content) = ctx.read(&hit.path) else {
            continue;
        };
        let Some(line) = content.lines().nth(hit.line - 1) else {
            continue;
        };
        for p in secret_patterns() {
            if p.pattern.is_match(line) && !kinds.contains(&p.name) {
                kinds.push(p.name);
            }
        }
    }

    Ok(if hits.is_empty() {
        CheckOutcome::pass("No hardcoded secrets detected")
    } else {
        CheckOutcome::fail(format!(
            "Possible hardcoded secrets ({}): {}",
            kinds.join(", "),
            summarize_hits(&hits)
        ))
    })
}

fn is_lockfile(path: &Path) -> bool {
    matches!(
        file_name(path).as_str(),
        "package-lock.json" | "yarn.lock" | "pnpm-lock.yaml" | "npm-shrinkwrap.json" | "composer.lock"
    )
}

fn gitignore_env(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if ctx.gitignore_patterns().is_none() {
        return Ok(CheckOutcome::fail(
            "No .gitignore, environment files are not excluded from version control",
        ));
    }
    Ok(CheckOutcome::from_bool(
        ctx.gitignore_covers(".env"),
        ".gitignore excludes .env files",
        ".gitignore does not exclude .env files",
    ))
}

fn private_key_files(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let keys: Vec<&Path> = ctx
        .repo
        .files
        .iter()
        .map(|p| p.as_path())
        .filter(|p| !is_test_path(p))
        .filter(|p| {
            super::base::has_extension(p, PRIVATE_KEY_EXTENSIONS)
                || PRIVATE_KEY_NAMES.contains(&file_name(p).as_str())
        })
        .collect();
    Ok(if keys.is_empty() {
        CheckOutcome::pass("No private key files committed")
    } else {
        CheckOutcome::fail(format!(
            "Key material committed to the repository: {}",
            summarize_paths(&keys)
        ))
    })
}

fn dynamic_eval(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let js = ctx.production_sources(JS_EXTENSIONS);
    let py = ctx.production_sources(&["py"]);
    if js.is_empty() && py.is_empty() {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }
    let mut hits = ctx.scan_lines(&js, |line| {
        !is_comment_line(line) && dynamic_eval_js().is_match(line)
    });
    hits.extend(ctx.scan_lines(&py, |line| {
        !is_comment_line(line) && dynamic_eval_py().is_match(line)
    }));
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No eval or dynamic code construction")
    } else {
        CheckOutcome::fail(format!(
            "Dynamic code evaluation: {}",
            summarize_hits(&hits)
        ))
    })
}

fn security_policy(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let found = ctx.repo.find_root_file("SECURITY.md").is_some()
        || ctx.any_path(|p| {
            p.parent().map(|d| d == Path::new(".github") || d == Path::new("docs")).unwrap_or(false)
                && file_name(p).eq_ignore_ascii_case("SECURITY.md")
        });
    Ok(CheckOutcome::from_bool(
        found,
        "SECURITY.md describes how to report vulnerabilities",
        "No SECURITY.md, add a vulnerability disclosure policy",
    ))
}

fn cors_wildcard(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.scan_lines(&files, |line| {
        !is_comment_line(line) && cors_wildcard_pattern().is_match(line)
    });
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No wildcard CORS configuration")
    } else {
        CheckOutcome::fail(format!(
            "CORS allows any origin, restrict it to known origins: {}",
            summarize_hits(&hits)
        ))
    })
}

fn sql_concat(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.grep(&files, sql_concat_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No SQL assembled from strings")
    } else {
        CheckOutcome::fail(format!(
            "SQL built by string interpolation, use parameterized queries: {}",
            summarize_hits(&hits)
        ))
    })
}

/// Whether a line contains an `http://` URL to a host that should use TLS
fn has_insecure_url(line: &str) -> bool {
    line.match_indices("http://").any(|(idx, _)| {
        let host = &line[idx + "http://".len()..];
        !host.is_empty()
            && host.starts_with(|c: char| c.is_ascii_alphanumeric())
            && !HTTP_ALLOWED_HOSTS.iter().any(|h| host.starts_with(h))
    })
}

fn insecure_http(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.scan_lines(&files, |line| !is_comment_line(line) && has_insecure_url(line));
    Ok(if hits.is_empty() {
        CheckOutcome::pass("All external URLs use https")
    } else {
        CheckOutcome::fail(format!(
            "Plain http URLs to external hosts: {}",
            summarize_hits(&hits)
        ))
        .auto_fixable()
    })
}
