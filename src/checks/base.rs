//! Base check types
//!
//! This module defines the core abstractions for production-readiness checks:
//! - [`Check`], a tagged function value registered in the catalogue
//! - [`CheckOutcome`], what a check function returns
//! - [`CheckContext`], read-only access to the repository for check functions

use crate::cache::ScanCache;
use crate::context::RepoContext;
use crate::models::{Category, Severity};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Content-scanning checks inspect at most this many files
pub const MAX_SAMPLED_FILES: usize = 200;

/// Content-scanning checks stop collecting hits after this many
pub const MAX_HITS: usize = 200;

/// Extensions treated as application source code
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "rb", "go", "java", "kt", "php", "cs", "rs",
    "vue", "svelte",
];

pub const JS_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "vue", "svelte"];

pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm", "jsx", "tsx", "vue", "svelte"];

/// Directory names whose contents are never production code
const NON_PRODUCTION_DIRS: &[&str] = &[
    "test", "tests", "__tests__", "spec", "specs", "e2e", "cypress", "__mocks__", "mocks",
    "fixtures", "__fixtures__", "examples", "example", "demo", "docs", "scripts", "stories",
    "storybook", "seeds", "seed",
];

/// Declare a function returning a lazily compiled, process-wide [`Regex`]
macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            RE.get_or_init(|| ::regex::Regex::new($pattern).expect("valid regex"))
        }
    };
}
pub(crate) use static_regex;

/// Signature of a check function
pub type CheckFn = fn(&CheckContext<'_>) -> anyhow::Result<CheckOutcome>;

/// A named rule evaluated against a repository
#[derive(Debug, Clone, Copy)]
pub struct Check {
    /// Globally unique id, `<prefix>-NNN`
    pub id: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub severity: Severity,
    /// Belongs to the mock/placeholder-concentration class
    pub mock_placeholder: bool,
    pub run: CheckFn,
}

impl Check {
    pub const fn new(
        id: &'static str,
        title: &'static str,
        category: Category,
        severity: Severity,
        run: CheckFn,
    ) -> Self {
        Self {
            id,
            title,
            category,
            severity,
            mock_placeholder: false,
            run,
        }
    }

    /// Mark as part of the mock/placeholder-concentration class
    pub const fn mock_placeholder(mut self) -> Self {
        self.mock_placeholder = true;
        self
    }
}

/// What a check function reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
    pub error: Option<String>,
    pub auto_fixable: Option<bool>,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            error: None,
            auto_fixable: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            error: None,
            auto_fixable: None,
        }
    }

    /// An inapplicable check passes so it never penalizes the score
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::pass(format!("Not applicable: {}", reason.into()))
    }

    /// Pass when `ok`, otherwise fail
    pub fn from_bool(ok: bool, pass: impl Into<String>, fail: impl Into<String>) -> Self {
        if ok {
            Self::pass(pass)
        } else {
            Self::fail(fail)
        }
    }

    pub fn auto_fixable(mut self) -> Self {
        self.auto_fixable = Some(true);
        self
    }

    /// Flag a failing outcome as auto-fixable; passing outcomes are unchanged
    pub fn auto_fixable_if_failed(self) -> Self {
        if self.passed {
            self
        } else {
            self.auto_fixable()
        }
    }

    pub fn is_not_applicable(&self) -> bool {
        self.passed && self.message.starts_with("Not applicable:")
    }
}

/// A line matched by a content-scanning check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
}

/// Read-only view of the repository handed to every check function
pub struct CheckContext<'a> {
    pub repo: &'a RepoContext,
    cache: &'a ScanCache,
}

impl<'a> CheckContext<'a> {
    pub fn new(repo: &'a RepoContext, cache: &'a ScanCache) -> Self {
        Self { repo, cache }
    }

    pub fn root(&self) -> &Path {
        &self.repo.path
    }

    /// Read a file by path relative to the repository root
    pub fn read(&self, rel: impl AsRef<Path>) -> Option<Arc<String>> {
        self.cache.read(&self.repo.path.join(rel))
    }

    pub fn read_json(&self, rel: impl AsRef<Path>) -> Option<Arc<Value>> {
        self.cache.read_json(&self.repo.path.join(rel))
    }

    /// Whether a walked file (or root entry) exists at `rel`
    pub fn exists(&self, rel: &str) -> bool {
        let rel_path = Path::new(rel);
        self.repo.files.iter().any(|p| p == rel_path)
            || self.repo.root_entries.iter().any(|e| e.name == rel)
    }

    /// First of `candidates` that exists
    pub fn first_existing<'c>(&self, candidates: &[&'c str]) -> Option<&'c str> {
        candidates.iter().copied().find(|c| self.exists(c))
    }

    /// Whether any walked file lives under the directory `dir` (relative)
    pub fn has_dir(&self, dir: &str) -> bool {
        let dir = Path::new(dir);
        self.repo.files.iter().any(|p| p.starts_with(dir))
    }

    /// First declared dependency matching one of `patterns`; a trailing `*`
    /// matches by prefix (`@sentry/*`)
    pub fn find_dependency(&self, patterns: &[&str]) -> Option<&'a str> {
        self.repo
            .dependencies
            .keys()
            .map(String::as_str)
            .find(|dep| patterns.iter().any(|p| dependency_matches(dep, p)))
    }

    /// Non-comment lines of the root `.gitignore`, `None` when there is none
    pub fn gitignore_patterns(&self) -> Option<Vec<String>> {
        let content = self.read(".gitignore")?;
        Some(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from)
                .collect(),
        )
    }

    /// Whether the root `.gitignore` has a pattern for `entry` (`.env`, `node_modules`)
    pub fn gitignore_covers(&self, entry: &str) -> bool {
        self.gitignore_patterns()
            .map(|patterns| {
                patterns.iter().any(|p| {
                    let p = p.trim_start_matches('/').trim_end_matches('/');
                    let p = p.strip_prefix("**/").unwrap_or(p);
                    p == entry || (p.ends_with('*') && entry.starts_with(p.trim_end_matches('*')))
                })
            })
            .unwrap_or(false)
    }

    /// Whether any walked file's relative path satisfies `predicate`
    pub fn any_path(&self, predicate: impl Fn(&Path) -> bool) -> bool {
        self.repo.any_file(predicate)
    }

    pub fn files_with_extensions(&self, exts: &[&str]) -> Vec<&'a Path> {
        self.repo
            .files
            .iter()
            .filter(|p| has_extension(p, exts))
            .map(PathBuf::as_path)
            .collect()
    }

    /// Files whose name (not path) satisfies `predicate`
    pub fn files_named(&self, predicate: impl Fn(&str) -> bool) -> Vec<&'a Path> {
        self.repo
            .files
            .iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(&predicate)
                    .unwrap_or(false)
            })
            .map(PathBuf::as_path)
            .collect()
    }

    /// Application source files, tests included
    pub fn source_files(&self) -> Vec<&'a Path> {
        self.files_with_extensions(SOURCE_EXTENSIONS)
            .into_iter()
            .filter(|p| !is_generated(p))
            .collect()
    }

    /// Source files that ship to production (no tests, fixtures, scripts or docs)
    pub fn production_sources(&self, exts: &[&str]) -> Vec<&'a Path> {
        self.files_with_extensions(exts)
            .into_iter()
            .filter(|p| !is_generated(p) && !is_non_production_path(p))
            .collect()
    }

    pub fn test_files(&self) -> Vec<&'a Path> {
        self.source_files()
            .into_iter()
            .filter(|p| is_test_path(p))
            .collect()
    }

    /// Lines (across the sampled `files`) matching `pattern`
    pub fn grep(&self, files: &[&Path], pattern: &Regex) -> Vec<Hit> {
        self.scan_lines(files, |line| pattern.is_match(line))
    }

    /// Lines (across the sampled `files`) for which `matches` is true
    pub fn scan_lines(&self, files: &[&Path], matches: impl Fn(&str) -> bool) -> Vec<Hit> {
        let mut hits = Vec::new();
        for path in sample(files) {
            let Some(content) = self.read(path) else {
                continue;
            };
            for (idx, line) in content.lines().enumerate() {
                if matches(line) {
                    hits.push(Hit {
                        path: path.to_path_buf(),
                        line: idx + 1,
                    });
                    if hits.len() >= MAX_HITS {
                        return hits;
                    }
                }
            }
        }
        hits
    }

    /// Whole-content matches, for patterns that span lines
    pub fn grep_content(&self, files: &[&Path], pattern: &Regex) -> Vec<Hit> {
        let mut hits = Vec::new();
        for path in sample(files) {
            let Some(content) = self.read(path) else {
                continue;
            };
            for m in pattern.find_iter(&content) {
                let line = content[..m.start()].matches('\n').count() + 1;
                hits.push(Hit {
                    path: path.to_path_buf(),
                    line,
                });
                if hits.len() >= MAX_HITS {
                    return hits;
                }
            }
        }
        hits
    }

    /// Whether any sampled file's content satisfies `predicate`
    pub fn any_content(&self, files: &[&Path], predicate: impl Fn(&str) -> bool) -> bool {
        sample(files)
            .iter()
            .any(|p| self.read(p).map(|c| predicate(&c)).unwrap_or(false))
    }
}

/// First [`MAX_SAMPLED_FILES`] of `files`; the input order is already stable
pub fn sample<'p>(files: &[&'p Path]) -> Vec<&'p Path> {
    files.iter().take(MAX_SAMPLED_FILES).copied().collect()
}

fn dependency_matches(dep: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => dep.starts_with(prefix),
        None => dep == pattern,
    }
}

/// File name of a relative path, lossily converted
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Minified bundles and declaration files
pub fn is_generated(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.ends_with(".min.js") || name.ends_with(".d.ts") || name.ends_with(".bundle.js")
}

pub fn is_test_path(path: &Path) -> bool {
    let in_test_dir = path.components().any(|c| {
        let segment = c.as_os_str().to_string_lossy();
        matches!(
            segment.as_ref(),
            "test" | "tests" | "__tests__" | "spec" | "specs" | "e2e" | "cypress"
        )
    });
    if in_test_dir {
        return true;
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let stem = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    name.contains(".test.")
        || name.contains(".spec.")
        || name == "conftest.py"
        || stem.starts_with("test_")
        || stem.ends_with("_test")
}

pub fn is_non_production_path(path: &Path) -> bool {
    if is_test_path(path) {
        return true;
    }
    path.parent()
        .map(|parent| {
            parent.components().any(|c| {
                let segment = c.as_os_str().to_string_lossy().to_lowercase();
                NON_PRODUCTION_DIRS.contains(&segment.as_str())
            })
        })
        .unwrap_or(false)
}

/// "src/a.js:3, src/b.js:9 and 4 more"
pub fn summarize_hits(hits: &[Hit]) -> String {
    const SHOWN: usize = 3;
    let shown: Vec<String> = hits
        .iter()
        .take(SHOWN)
        .map(|h| format!("{}:{}", h.path.display(), h.line))
        .collect();
    let mut out = shown.join(", ");
    if hits.len() > SHOWN {
        out.push_str(&format!(" and {} more", hits.len() - SHOWN));
    }
    out
}

/// "a, b, c and 2 more"
pub fn summarize_paths(paths: &[&Path]) -> String {
    const SHOWN: usize = 3;
    let shown: Vec<String> = paths
        .iter()
        .take(SHOWN)
        .map(|p| p.display().to_string())
        .collect();
    let mut out = shown.join(", ");
    if paths.len() > SHOWN {
        out.push_str(&format!(" and {} more", paths.len() - SHOWN));
    }
    out
}

/// Whether a line is (the start or middle of) a comment
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//")
        || trimmed.starts_with('#')
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with("<!--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path(Path::new("tests/api.rs")));
        assert!(is_test_path(Path::new("src/__tests__/App.jsx")));
        assert!(is_test_path(Path::new("src/app.test.ts")));
        assert!(is_test_path(Path::new("pkg/handler_test.go")));
        assert!(is_test_path(Path::new("app/test_views.py")));
        assert!(is_test_path(Path::new("conftest.py")));
        assert!(!is_test_path(Path::new("src/testing_utils.ts")));
        assert!(!is_test_path(Path::new("src/app.ts")));
    }

    #[test]
    fn test_non_production_paths() {
        assert!(is_non_production_path(Path::new("scripts/seed.js")));
        assert!(is_non_production_path(Path::new("src/__mocks__/api.js")));
        assert!(is_non_production_path(Path::new("docs/example.py")));
        assert!(!is_non_production_path(Path::new("src/server.js")));
        // A root file named like a directory is still production code
        assert!(!is_non_production_path(Path::new("scripts.js")));
    }

    #[test]
    fn test_outcome_constructors() {
        let na = CheckOutcome::not_applicable("no Python sources");
        assert!(na.passed);
        assert!(na.is_not_applicable());
        assert_eq!(na.message, "Not applicable: no Python sources");

        let fail = CheckOutcome::fail("bad").auto_fixable();
        assert!(!fail.passed);
        assert_eq!(fail.auto_fixable, Some(true));
        assert!(!CheckOutcome::pass("ok").is_not_applicable());
    }

    #[test]
    fn test_summarize_hits() {
        let hits: Vec<Hit> = (1..=5)
            .map(|i| Hit {
                path: PathBuf::from("src/a.js"),
                line: i,
            })
            .collect();
        assert_eq!(
            summarize_hits(&hits),
            "src/a.js:1, src/a.js:2, src/a.js:3 and 2 more"
        );
        assert_eq!(summarize_hits(&hits[..1]), "src/a.js:1");
    }

    #[test]
    fn test_dependency_patterns() {
        assert!(dependency_matches("@sentry/node", "@sentry/*"));
        assert!(dependency_matches("pino", "pino"));
        assert!(!dependency_matches("pino-pretty", "pino"));
    }

    #[test]
    fn test_gitignore_covers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "# deps\n/node_modules/\n.env*\n").unwrap();
        let cache = ScanCache::new();
        let repo = crate::context::analyze_repo(dir.path(), &cache);
        let ctx = CheckContext::new(&repo, &cache);
        assert!(ctx.gitignore_covers("node_modules"));
        assert!(ctx.gitignore_covers(".env"));
        assert!(ctx.gitignore_covers(".env.local"));
        assert!(!ctx.gitignore_covers("dist"));
    }

    #[test]
    fn test_generated_files() {
        assert!(is_generated(Path::new("public/app.min.js")));
        assert!(is_generated(Path::new("types/index.d.ts")));
        assert!(!is_generated(Path::new("src/index.ts")));
    }
}
