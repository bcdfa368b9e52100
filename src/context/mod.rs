//! Repository context analysis
//!
//! Produces a [`RepoContext`]: an immutable snapshot of one pass over the
//! repository. The tree is walked exactly once; checks read structural facts
//! (languages, manifests, root entries, the file list) from the context
//! instead of walking again.
//!
//! Analysis never fails. A missing or unparsable manifest leaves its field
//! `None`, and an unreadable root yields an empty context.

pub mod frameworks;
pub mod manifests;
pub mod packages;

pub use manifests::{PackageJson, Requirement};
pub use packages::{DetectedPackage, PackageCategory, RiskLevel};

use crate::cache::ScanCache;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Root-level files that indicate a CI pipeline
const CI_FILES: &[&str] = &[
    ".gitlab-ci.yml",
    ".travis.yml",
    "azure-pipelines.yml",
    "Jenkinsfile",
    "bitbucket-pipelines.yml",
    ".drone.yml",
    "appveyor.yml",
];

/// Root-level directories that indicate a CI pipeline
const CI_DIRS: &[&str] = &[".github", ".circleci", ".buildkite", "buildkite"];

/// One entry of the repository root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Snapshot of one repository scan pass
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoContext {
    pub path: PathBuf,
    pub package_json: Option<PackageJson>,
    pub requirements_txt: Option<Vec<Requirement>>,
    pub package_json_paths: Vec<PathBuf>,
    pub requirements_paths: Vec<PathBuf>,
    pub has_dockerfile: bool,
    #[serde(rename = "hasCI")]
    pub has_ci: bool,
    pub frameworks: BTreeSet<String>,
    pub languages: BTreeSet<String>,
    pub detected_packages: Vec<DetectedPackage>,
    /// Every dependency across every manifest found, name → version range
    pub dependencies: BTreeMap<String, String>,
    /// Relative paths of every walked file, sorted
    #[serde(skip)]
    pub files: Arc<Vec<PathBuf>>,
    #[serde(skip)]
    pub root_entries: Vec<RootEntry>,
}

impl RepoContext {
    pub fn has_framework(&self, id: &str) -> bool {
        self.frameworks.contains(id)
    }

    pub fn has_any_framework(&self, ids: &[&str]) -> bool {
        ids.iter().any(|id| self.has_framework(id))
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains(language)
    }

    /// Dependency declared in any manifest of the tree
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Niche package detected in the root manifests
    pub fn has_package(&self, name: &str) -> bool {
        self.detected_packages.iter().any(|p| p.name == name)
    }

    pub fn has_root_file(&self, name: &str) -> bool {
        self.root_entries.iter().any(|e| !e.is_dir && e.name == name)
    }

    pub fn has_root_dir(&self, name: &str) -> bool {
        self.root_entries.iter().any(|e| e.is_dir && e.name == name)
    }

    /// Case-insensitive lookup of a root file, returning its real name
    pub fn find_root_file(&self, name: &str) -> Option<&str> {
        self.root_entries
            .iter()
            .find(|e| !e.is_dir && e.name.eq_ignore_ascii_case(name))
            .map(|e| e.name.as_str())
    }

    /// Any walked file matching `predicate` on its relative path
    pub fn any_file(&self, predicate: impl Fn(&Path) -> bool) -> bool {
        self.files.iter().any(|p| predicate(p))
    }

    pub fn has_node_manifest(&self) -> bool {
        !self.package_json_paths.is_empty()
    }

    pub fn has_python_manifest(&self) -> bool {
        !self.requirements_paths.is_empty()
    }
}

/// Analyze the repository at `repo_path`
pub fn analyze_repo(repo_path: &Path, cache: &ScanCache) -> RepoContext {
    let root_entries = list_root(repo_path);

    let package_json = cache
        .read_json(&repo_path.join("package.json"))
        .and_then(|v| PackageJson::from_value(&v));
    let requirements_txt = cache
        .read(&repo_path.join("requirements.txt"))
        .map(|content| manifests::parse_requirements(&content));

    let has_dockerfile = root_entries
        .iter()
        .any(|e| !e.is_dir && e.name == "Dockerfile");
    let has_ci = root_entries.iter().any(|e| {
        (e.is_dir && CI_DIRS.contains(&e.name.as_str()))
            || (!e.is_dir && CI_FILES.contains(&e.name.as_str()))
    });

    let files = cache.walk(repo_path);

    let package_json_paths: Vec<PathBuf> = files
        .iter()
        .filter(|p| p.file_name().map(|n| n == "package.json").unwrap_or(false))
        .cloned()
        .collect();
    let requirements_paths: Vec<PathBuf> = files
        .iter()
        .filter(|p| manifests::is_python_manifest(p))
        .cloned()
        .collect();

    let mut frameworks = BTreeSet::new();
    let mut dependencies = BTreeMap::new();

    for rel in &package_json_paths {
        let Some(pkg) = cache
            .read_json(&repo_path.join(rel))
            .and_then(|v| PackageJson::from_value(&v))
        else {
            debug!("Skipping unreadable manifest {}", rel.display());
            continue;
        };
        frameworks::detect_node_frameworks(&pkg, &mut frameworks);
        for (name, version) in pkg.all_dependencies() {
            dependencies
                .entry(name.to_string())
                .or_insert_with(|| version.to_string());
        }
    }
    for (marker, id) in frameworks::MONOREPO_FILES {
        if root_entries.iter().any(|e| !e.is_dir && e.name == *marker) {
            frameworks.insert((*id).to_string());
            frameworks.insert(frameworks::MONOREPO.to_string());
        }
    }

    for rel in &requirements_paths {
        let Some(content) = cache.read(&repo_path.join(rel)) else {
            continue;
        };
        frameworks::detect_python_frameworks(&content, &mut frameworks);
        if rel.extension().map(|e| e == "txt").unwrap_or(false) {
            for req in manifests::parse_requirements(&content) {
                dependencies
                    .entry(req.name)
                    .or_insert_with(|| req.spec.unwrap_or_default());
            }
        }
    }

    let languages: BTreeSet<String> = files
        .iter()
        .filter_map(|p| frameworks::language_for(p))
        .map(String::from)
        .collect();

    let root_deps = package_json
        .iter()
        .flat_map(|pkg| pkg.all_dependencies().map(|(n, v)| (n, Some(v))));
    let python_deps = requirements_txt
        .iter()
        .flatten()
        .map(|r| (r.name.as_str(), r.spec.as_deref()));
    let detected_packages = packages::detect_packages(root_deps.chain(python_deps));

    info!(
        "Analyzed {}: {} files, languages {:?}, frameworks {:?}, {} niche packages",
        repo_path.display(),
        files.len(),
        languages,
        frameworks,
        detected_packages.len()
    );

    RepoContext {
        path: repo_path.to_path_buf(),
        package_json,
        requirements_txt,
        package_json_paths,
        requirements_paths,
        has_dockerfile,
        has_ci,
        frameworks,
        languages,
        detected_packages,
        dependencies,
        files,
        root_entries,
    }
}

fn list_root(repo_path: &Path) -> Vec<RootEntry> {
    let entries = match std::fs::read_dir(repo_path) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", repo_path.display(), e);
            return Vec::new();
        }
    };
    let mut root: Vec<RootEntry> = entries
        .filter_map(|e| e.ok())
        .map(|e| RootEntry {
            name: e.file_name().to_string_lossy().into_owned(),
            is_dir: e.file_type().map(|t| t.is_dir()).unwrap_or(false),
        })
        .collect();
    root.sort_by(|a, b| a.name.cmp(&b.name));
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_react_repo_context() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r#"{"name":"web","dependencies":{"react":"^18.0.0","openai":"^4.0.0"}}"#,
        );
        write(root, "src/App.jsx", "export default function App() {}");
        write(root, "Dockerfile", "FROM node:20");

        let ctx = analyze_repo(root, &ScanCache::new());
        assert!(ctx.has_framework("react"));
        assert!(!ctx.has_framework("vue"));
        assert!(ctx.has_language("javascript"));
        assert!(ctx.has_dockerfile);
        assert!(!ctx.has_ci);
        assert_eq!(ctx.package_json_paths, vec![PathBuf::from("package.json")]);
        assert!(ctx.has_package("openai"));
        assert!(ctx.requirements_txt.is_none());
    }

    #[test]
    fn test_monorepo_nested_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "package.json", r#"{"private":true,"workspaces":["apps/*"]}"#);
        write(root, "apps/api/package.json", r#"{"dependencies":{"express":"4"}}"#);
        write(root, "apps/web/package.json", r#"{"dependencies":{"next":"14"}}"#);
        write(root, "services/ml/requirements.txt", "fastapi==0.110\n");
        write(root, "turbo.json", "{}");
        fs::create_dir_all(root.join(".github/workflows")).unwrap();

        let ctx = analyze_repo(root, &ScanCache::new());
        assert_eq!(ctx.package_json_paths.len(), 3);
        assert_eq!(
            ctx.requirements_paths,
            vec![PathBuf::from("services/ml/requirements.txt")]
        );
        for fw in ["express", "nextjs", "fastapi", "monorepo", "turborepo"] {
            assert!(ctx.has_framework(fw), "missing {fw}");
        }
        assert!(ctx.has_ci);
        assert!(ctx.has_dependency("express"));
        assert!(ctx.has_dependency("fastapi"));
        // Niche classification only considers root manifests
        assert!(ctx.detected_packages.is_empty());
    }

    #[test]
    fn test_malformed_manifest_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "package.json", "{ nope");
        let ctx = analyze_repo(dir.path(), &ScanCache::new());
        assert!(ctx.package_json.is_none());
        assert_eq!(ctx.package_json_paths.len(), 1);
        assert!(ctx.frameworks.is_empty());
    }

    #[test]
    fn test_missing_path_yields_empty_context() {
        let ctx = analyze_repo(Path::new("/no/such/repo/anywhere"), &ScanCache::new());
        assert!(ctx.files.is_empty());
        assert!(ctx.root_entries.is_empty());
        assert!(!ctx.has_ci);
        assert!(ctx.package_json.is_none());
    }

    #[test]
    fn test_python_requirements_root() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "requirements.txt", "Django==4.2\ntorch>=2\n");
        write(dir.path(), "app/views.py", "def index(): pass\n");
        let ctx = analyze_repo(dir.path(), &ScanCache::new());
        assert!(ctx.has_framework("django"));
        assert!(ctx.has_language("python"));
        let reqs = ctx.requirements_txt.as_ref().unwrap();
        assert_eq!(reqs.len(), 2);
        let torch = ctx.detected_packages.iter().find(|p| p.name == "torch").unwrap();
        assert_eq!(torch.version.as_deref(), Some(">=2"));
    }
}
