//! Manifest parsing (package.json, requirements files)
//!
//! Parsing is deliberately lenient: a manifest that cannot be understood
//! degrades to "absent" rather than failing the scan.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// The parts of a `package.json` the checks care about
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    pub private: Option<bool>,
    pub scripts: BTreeMap<String, String>,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub workspaces: Option<Value>,
    /// The full document, for keys without a typed field (`jest`, `eslintConfig`, ...)
    #[serde(skip)]
    pub raw: Value,
}

impl PackageJson {
    /// Build from a parsed JSON document; `None` unless the root is an object
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            name: obj.get("name").and_then(Value::as_str).map(String::from),
            version: obj.get("version").and_then(Value::as_str).map(String::from),
            private: obj.get("private").and_then(Value::as_bool),
            scripts: string_map(obj.get("scripts")),
            dependencies: string_map(obj.get("dependencies")),
            dev_dependencies: string_map(obj.get("devDependencies")),
            workspaces: obj.get("workspaces").cloned(),
            raw: value.clone(),
        })
    }

    /// Runtime and dev dependency names with their version ranges
    pub fn all_dependencies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependencies
            .iter()
            .chain(self.dev_dependencies.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }

    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    /// Untyped access to any top-level key
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// One line of a pip requirements file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// Lowercased distribution name
    pub name: String,
    /// Version specifier as written (`==2.0`, `>=1,<2`), if any
    pub spec: Option<String>,
}

impl Requirement {
    /// Pinned to an exact version (`==` or `===`)
    pub fn is_pinned(&self) -> bool {
        self.spec
            .as_deref()
            .map(|s| s.trim_start().starts_with("=="))
            .unwrap_or(false)
    }
}

/// Parse a pip requirements file, skipping options, includes and editables
pub fn parse_requirements(content: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    for line in content.lines() {
        let line = line.split(" #").next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if line.contains("://") && !line.contains('@') {
            // Bare URL requirement, no name to extract
            continue;
        }

        let name_end = line
            .find(|c: char| "=<>!~[;@ ".contains(c))
            .unwrap_or(line.len());
        let name = line[..name_end].trim().to_lowercase();
        if name.is_empty() {
            continue;
        }

        let rest = &line[name_end..];
        // Drop extras and environment markers around the specifier
        let rest = match rest.find(']') {
            Some(i) if rest.starts_with('[') => &rest[i + 1..],
            _ => rest,
        };
        let rest = rest.split(';').next().unwrap_or("").trim();
        let spec = if rest.is_empty() || rest.starts_with('@') {
            None
        } else {
            Some(rest.to_string())
        };

        requirements.push(Requirement { name, spec });
    }
    requirements
}

/// Whether a relative path names a Python dependency manifest
pub fn is_python_manifest(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if matches!(
        file_name,
        "pyproject.toml" | "Pipfile" | "setup.py" | "setup.cfg"
    ) {
        return true;
    }
    if !file_name.ends_with(".txt") {
        return false;
    }
    if file_name.starts_with("requirements") {
        return true;
    }
    // requirements/base.txt, requirements/dev.txt
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|n| n == "requirements")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_json_from_value() {
        let value: Value = serde_json::from_str(
            r#"{
                "name": "web",
                "private": true,
                "scripts": {"test": "jest"},
                "dependencies": {"react": "^18.0.0"},
                "devDependencies": {"jest": "^29.0.0"},
                "workspaces": ["packages/*"],
                "jest": {"coverageThreshold": {}}
            }"#,
        )
        .unwrap();
        let pkg = PackageJson::from_value(&value).unwrap();
        assert_eq!(pkg.name.as_deref(), Some("web"));
        assert_eq!(pkg.private, Some(true));
        assert_eq!(pkg.script("test"), Some("jest"));
        assert!(pkg.has_dependency("react"));
        assert!(pkg.has_dependency("jest"));
        assert!(pkg.workspaces.is_some());
        assert!(pkg.field("jest").is_some());
        assert_eq!(pkg.all_dependencies().count(), 2);
    }

    #[test]
    fn test_package_json_rejects_non_object() {
        assert!(PackageJson::from_value(&Value::Array(vec![])).is_none());
    }

    #[test]
    fn test_parse_requirements() {
        let reqs = parse_requirements(
            "# web\nDjango==4.2\nrequests>=2.0 # http\n-r base.txt\nuvicorn[standard]==0.23; python_version>'3.8'\n\nnumpy\nmypkg @ git+https://example.org/x.git\n",
        );
        let names: Vec<&str> = reqs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["django", "requests", "uvicorn", "numpy", "mypkg"]);
        assert_eq!(reqs[0].spec.as_deref(), Some("==4.2"));
        assert!(reqs[0].is_pinned());
        assert!(!reqs[1].is_pinned());
        assert_eq!(reqs[2].spec.as_deref(), Some("==0.23"));
        assert!(reqs[3].spec.is_none());
        assert!(reqs[4].spec.is_none());
    }

    #[test]
    fn test_is_python_manifest() {
        assert!(is_python_manifest(Path::new("requirements.txt")));
        assert!(is_python_manifest(Path::new("api/requirements-dev.txt")));
        assert!(is_python_manifest(Path::new("requirements/base.txt")));
        assert!(is_python_manifest(Path::new("svc/pyproject.toml")));
        assert!(!is_python_manifest(Path::new("notes.txt")));
        assert!(!is_python_manifest(Path::new("package.json")));
    }
}
