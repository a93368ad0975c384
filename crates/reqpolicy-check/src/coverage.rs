//! Every global package is either pinned or blacklisted, never both.

use crate::report::{FAILURE_CLASS_COVERAGE_DUPE, FAILURE_CLASS_COVERAGE_UNCOVERED, Finding};
use reqpolicy_kernel::DeclarationSet;

/// Two independent diagnostics: `dupe` for any package both pinned and
/// blacklisted, `uncovered` for a global package that is neither.
pub fn check_blacklist_coverage(
    global: &DeclarationSet,
    constraints: &DeclarationSet,
    blacklist: &DeclarationSet,
) -> Vec<Finding> {
    let dupes = constraints
        .names()
        .filter(|name| blacklist.contains(name))
        .map(|name| {
            Finding::new(
                FAILURE_CLASS_COVERAGE_DUPE,
                name,
                format!(
                    "{name} is in both {} and {}",
                    blacklist.source(),
                    constraints.source()
                ),
            )
        });
    let uncovered = global
        .names()
        .filter(|name| !constraints.contains(name) && !blacklist.contains(name))
        .map(|name| {
            Finding::new(
                FAILURE_CLASS_COVERAGE_UNCOVERED,
                name,
                format!(
                    "{name:?} appears in {} but not {} or {}",
                    global.source(),
                    constraints.source(),
                    blacklist.source()
                ),
            )
        });
    dupes.chain(uncovered).collect()
}
