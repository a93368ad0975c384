//! A changed global entry must still overlap the parent revision's range.

use crate::report::{FAILURE_CLASS_NO_PARENT_OVERLAP, Finding};
use reqpolicy_kernel::{DeclarationSet, SpecifierSet, version_required};

/// For each package present in both lists whose declaration changed, every
/// clause's required version must be accepted by some parent declaration.
/// Pre-releases are allowed on the parent side.
pub fn check_parent_overlap(parent: &DeclarationSet, head: &DeclarationSet) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (name, entries) in head.iter() {
        let parents: Vec<SpecifierSet> = parent
            .declarations(name)
            .filter_map(|decl| decl.specifiers.parse().ok())
            .collect();
        if parents.is_empty() {
            continue;
        }
        for entry in entries {
            let decl = &entry.declaration;
            if parent.declarations(name).any(|p| p.value_eq(decl)) {
                continue;
            }
            let Ok(set) = decl.specifiers.parse::<SpecifierSet>() else {
                continue;
            };
            for clause in set.clauses() {
                let required = version_required(clause.operator().as_str(), clause.version());
                if !parents.iter().any(|p| p.contains_with(&required, true)) {
                    findings.push(
                        Finding::new(
                            FAILURE_CLASS_NO_PARENT_OVERLAP,
                            name,
                            format!(
                                "Requirement {} does not overlap with parent (needs {required})",
                                entry.line
                            ),
                        )
                        .in_file(head.source()),
                    );
                }
            }
        }
    }
    findings
}
