//! Check registry
//!
//! Every check is a plain `fn(&CheckContext) -> Result<CheckOutcome>` tagged
//! with id, title, category and severity. The base set runs for every
//! repository; checks that only make sense for some ecosystems report
//! "not applicable" (which passes) from inside their own body. A second,
//! smaller set is contributed by niche packages found during detection.

pub mod base;

mod accessibility;
mod ai;
mod architecture;
mod code_quality;
mod data_quality;
mod dependencies;
mod devops;
mod documentation;
mod framework;
mod observability;
mod packages;
mod performance;
mod repo_health;
mod security;
mod testing;

pub use base::{Check, CheckContext, CheckOutcome};

use crate::context::RepoContext;
use crate::models::Category;
use std::collections::HashSet;

/// The fixed set that runs for every repository, in registry order
pub fn base_checks() -> Vec<Check> {
    let mut checks = Vec::with_capacity(64);
    checks.extend(code_quality::checks());
    checks.extend(security::checks());
    checks.extend(dependencies::checks());
    checks.extend(devops::checks());
    checks.extend(architecture::checks());
    checks.extend(framework::checks());
    checks.extend(testing::checks());
    checks.extend(documentation::checks());
    checks.extend(performance::checks());
    checks.extend(ai::checks());
    checks.extend(accessibility::checks());
    checks.extend(observability::checks());
    checks.extend(data_quality::checks());
    checks.extend(repo_health::checks());
    checks
}

/// Checks contributed by niche packages, paired with the packages that enable them
pub fn package_checks() -> Vec<(Check, &'static [&'static str])> {
    packages::checks()
        .into_iter()
        .map(|check| {
            let enabled_by = packages::PACKAGE_RULES
                .iter()
                .find(|(id, _)| *id == check.id)
                .map(|(_, pkgs)| *pkgs)
                .unwrap_or(&[]);
            (check, enabled_by)
        })
        .collect()
}

/// Base set plus the package checks enabled by `context.detected_packages`,
/// deduplicated by id, base checks first
pub fn get_applicable_checks(context: &RepoContext) -> Vec<Check> {
    let mut seen: HashSet<&'static str> = HashSet::new();
    let mut checks: Vec<Check> = Vec::new();

    for check in base_checks() {
        if seen.insert(check.id) {
            checks.push(check);
        }
    }

    for (check, enabled_by) in package_checks() {
        let enabled = context
            .detected_packages
            .iter()
            .any(|p| enabled_by.contains(&p.name.as_str()));
        if enabled && seen.insert(check.id) {
            checks.push(check);
        }
    }

    checks
}

/// Every known check, base and package-contributed
pub fn all_checks() -> Vec<Check> {
    let mut checks = base_checks();
    checks.extend(package_checks().into_iter().map(|(check, _)| check));
    checks
}

pub fn find_check(id: &str) -> Option<Check> {
    all_checks().into_iter().find(|c| c.id == id)
}

/// Checks of one category, for `shipready checks --category`
pub fn checks_in(category: Category) -> Vec<Check> {
    all_checks()
        .into_iter()
        .filter(|c| c.category == category)
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::cache::ScanCache;
    use crate::context::analyze_repo;

    /// Write `files` into a fresh temp repository and run check `id` against it
    pub(crate) fn run_check(id: &str, files: &[(&str, &str)]) -> CheckOutcome {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, content).unwrap();
        }
        let cache = ScanCache::new();
        let repo = analyze_repo(dir.path(), &cache);
        let check = find_check(id).unwrap_or_else(|| panic!("unknown check {id}"));
        (check.run)(&CheckContext::new(&repo, &cache)).unwrap()
    }
}
