//! Framework and language fingerprinting
//!
//! Frameworks are recognised from dependency names in every `package.json`
//! found in the tree, from monorepo markers, and by substring match against
//! Python manifests. Languages come from file extensions.

use super::manifests::PackageJson;
use std::collections::BTreeSet;
use std::path::Path;

/// npm package name → framework identifier
const NODE_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "react"),
    ("react-dom", "react"),
    ("next", "nextjs"),
    ("vue", "vue"),
    ("nuxt", "nuxt"),
    ("@angular/core", "angular"),
    ("svelte", "svelte"),
    ("@sveltejs/kit", "sveltekit"),
    ("express", "express"),
    ("fastify", "fastify"),
    ("koa", "koa"),
    ("@nestjs/core", "nestjs"),
    ("hono", "hono"),
    ("react-native", "react-native"),
    ("expo", "expo"),
    ("electron", "electron"),
    ("gatsby", "gatsby"),
    ("@remix-run/react", "remix"),
    ("astro", "astro"),
    ("solid-js", "solid"),
];

/// Monorepo tooling packages → pseudo-framework identifier
const MONOREPO_PACKAGES: &[(&str, &str)] = &[
    ("lerna", "lerna"),
    ("nx", "nx"),
    ("@nrwl/workspace", "nx"),
    ("turbo", "turborepo"),
];

/// Root-level monorepo marker files → pseudo-framework identifier
pub(crate) const MONOREPO_FILES: &[(&str, &str)] = &[
    ("lerna.json", "lerna"),
    ("nx.json", "nx"),
    ("turbo.json", "turborepo"),
    ("pnpm-workspace.yaml", "pnpm-workspaces"),
];

/// Python frameworks, matched as lowercase substrings of manifest text
const PYTHON_FRAMEWORKS: &[&str] = &[
    "django",
    "flask",
    "fastapi",
    "streamlit",
    "tornado",
    "pyramid",
    "starlette",
    "celery",
];

/// Frameworks that render a browser UI
pub const FRONTEND_FRAMEWORKS: &[&str] = &[
    "react", "nextjs", "vue", "nuxt", "angular", "svelte", "sveltekit", "gatsby", "remix", "astro",
    "solid",
];

/// Frameworks that serve HTTP
pub const SERVER_FRAMEWORKS: &[&str] = &[
    "express", "fastify", "koa", "nestjs", "hono", "nextjs", "nuxt", "remix", "sveltekit", "django",
    "flask", "fastapi", "tornado", "pyramid", "starlette",
];

pub const MONOREPO: &str = "monorepo";

/// Add frameworks implied by one `package.json`
pub fn detect_node_frameworks(pkg: &PackageJson, frameworks: &mut BTreeSet<String>) {
    for (dep, _) in pkg.all_dependencies() {
        for (name, id) in NODE_FRAMEWORKS.iter().chain(MONOREPO_PACKAGES) {
            if dep == *name {
                frameworks.insert((*id).to_string());
            }
        }
    }
    if MONOREPO_PACKAGES.iter().any(|(name, _)| pkg.has_dependency(name)) {
        frameworks.insert(MONOREPO.to_string());
    }
    if pkg.workspaces.is_some() {
        frameworks.insert(MONOREPO.to_string());
    }
}

/// Add frameworks mentioned anywhere in a Python manifest
pub fn detect_python_frameworks(content: &str, frameworks: &mut BTreeSet<String>) {
    let lower = content.to_lowercase();
    for name in PYTHON_FRAMEWORKS {
        if lower.contains(name) {
            frameworks.insert((*name).to_string());
        }
    }
}

/// Map a file to its language by extension
pub fn language_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let language = match ext.as_str() {
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "py" | "pyi" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "swift" => "swift",
        "dart" => "dart",
        "vue" => "vue",
        "svelte" => "svelte",
        "sh" | "bash" => "shell",
        "html" | "htm" => "html",
        "css" | "scss" | "sass" | "less" => "css",
        _ => return None,
    };
    Some(language)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(json: &str) -> PackageJson {
        PackageJson::from_value(&serde_json::from_str(json).unwrap()).unwrap()
    }

    #[test]
    fn test_node_framework_detection() {
        let mut frameworks = BTreeSet::new();
        detect_node_frameworks(
            &pkg(r#"{"dependencies":{"react":"^18.0.0","express":"4"},"devDependencies":{"turbo":"1"}}"#),
            &mut frameworks,
        );
        assert!(frameworks.contains("react"));
        assert!(frameworks.contains("express"));
        assert!(frameworks.contains("turborepo"));
        assert!(frameworks.contains(MONOREPO));
        assert!(!frameworks.contains("vue"));
    }

    #[test]
    fn test_workspaces_marks_monorepo() {
        let mut frameworks = BTreeSet::new();
        detect_node_frameworks(&pkg(r#"{"workspaces":["packages/*"]}"#), &mut frameworks);
        assert_eq!(frameworks.into_iter().collect::<Vec<_>>(), vec![MONOREPO]);
    }

    #[test]
    fn test_python_substring_detection() {
        let mut frameworks = BTreeSet::new();
        detect_python_frameworks("Flask==2.3\nFlask-Cors\ngunicorn\n", &mut frameworks);
        assert!(frameworks.contains("flask"));
        assert!(!frameworks.contains("django"));
    }

    #[test]
    fn test_language_for() {
        assert_eq!(language_for(Path::new("src/App.tsx")), Some("typescript"));
        assert_eq!(language_for(Path::new("main.PY")), Some("python"));
        assert_eq!(language_for(Path::new("README.md")), None);
        assert_eq!(language_for(Path::new("Makefile")), None);
    }
}
