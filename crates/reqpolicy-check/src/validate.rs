//! Project declarations against the global allow-list.

use crate::project::ProjectRequirements;
use crate::report::{
    FAILURE_CLASS_EXCLUSIONS, FAILURE_CLASS_NO_FLOOR, FAILURE_CLASS_NO_GLOBAL_MATCH,
    FAILURE_CLASS_NOT_IN_GLOBAL, FAILURE_CLASS_POST_RELEASE, FAILURE_CLASS_VARIANT_COUNT,
    Finding,
};
use reqpolicy_kernel::{Declaration, DeclarationSet, Operator, SpecifierSet, Version, specifier};
use std::collections::BTreeMap;

/// Validate every non-blacklisted package of every project file.
pub fn validate(
    project: &ProjectRequirements,
    blacklist: &DeclarationSet,
    global: &DeclarationSet,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (file, reqs) in &project.files {
        tracing::debug!(file = %file, "validating");
        for (name, decls) in reqs {
            findings.extend(
                validate_package(name, decls, blacklist, global)
                    .into_iter()
                    .map(|finding| finding.in_file(file)),
            );
        }
    }
    findings
}

fn validate_package(
    name: &str,
    decls: &[Declaration],
    blacklist: &DeclarationSet,
    global: &DeclarationSet,
) -> Vec<Finding> {
    if blacklist.contains(name) {
        return Vec::new();
    }
    let globals: Vec<&Declaration> = global.declarations(name).collect();
    if globals.is_empty() {
        let lines: Vec<String> = decls.iter().map(|d| d.to_line(';')).collect();
        return vec![Finding::new(
            FAILURE_CLASS_NOT_IN_GLOBAL,
            name,
            format!("Requirement {lines:?} not in global requirements"),
        )];
    }

    let mut findings = Vec::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for decl in decls {
        if decl.extras.is_empty() {
            *counts.entry("").or_default() += 1;
        }
        for extra in &decl.extras {
            *counts.entry(extra.as_str()).or_default() += 1;
        }

        if let Err(finding) = match_global(decl, &globals) {
            findings.push(finding);
            continue;
        }
        if !specifier::has_floor(&decl.specifiers) {
            findings.push(Finding::new(
                FAILURE_CLASS_NO_FLOOR,
                name,
                format!("Requirement for package {name} has no lower bound"),
            ));
            continue;
        }
        if uses_post_release(&decl.specifiers) {
            findings.push(Finding::new(
                FAILURE_CLASS_POST_RELEASE,
                name,
                format!("Requirement for package {name} uses a post release"),
            ));
        }
    }

    for (extra, count) in counts {
        if count != globals.len() {
            let label = if extra.is_empty() {
                name.to_string()
            } else {
                format!("{name}[{extra}]")
            };
            findings.push(Finding::new(
                FAILURE_CLASS_VARIANT_COUNT,
                name,
                format!(
                    "Package {label} requirement does not match number of lines ({}) in global requirements",
                    globals.len()
                ),
            ));
        }
    }
    findings
}

/// Find the global entry with the same package, location, and marker, then
/// require the local exclusions to be a subset of its exclusions.
fn match_global(decl: &Declaration, globals: &[&Declaration]) -> Result<(), Finding> {
    let mut mismatches = Vec::new();
    for candidate in globals {
        let differing: Vec<String> = [
            ("location", &decl.location, &candidate.location),
            ("marker", &decl.marker, &candidate.marker),
        ]
        .into_iter()
        .filter(|(_, ours, theirs)| ours != theirs)
        .map(|(field, ours, theirs)| format!("{field} {ours:?} does not match {theirs:?}"))
        .collect();
        if !differing.is_empty() {
            mismatches.extend(differing);
            continue;
        }

        let local = specifier::exclusions(&decl.specifiers);
        let global = specifier::exclusions(&candidate.specifiers);
        if local.is_subset(&global) {
            return Ok(());
        }
        let unexpected: Vec<&String> = local.difference(&global).collect();
        return Err(Finding::new(
            FAILURE_CLASS_EXCLUSIONS,
            &decl.package,
            format!(
                "Requirement for package {} excludes a version not excluded in the global list.\n  \
                 Local settings : {local:?}\n  \
                 Global settings: {global:?}\n  \
                 Unexpected     : {unexpected:?}",
                decl.package
            ),
        ));
    }
    Err(Finding::new(
        FAILURE_CLASS_NO_GLOBAL_MATCH,
        &decl.package,
        format!(
            "Could not find a global requirements entry to match package {} ({}). \
             If the package is already included in the global list, the name or \
             platform markers there may not match the local settings.",
            decl.package,
            mismatches.join("; ")
        ),
    ))
}

/// A clause other than `!=` naming a post-release.
fn uses_post_release(specifiers: &str) -> bool {
    specifiers.parse::<SpecifierSet>().is_ok_and(|set| {
        set.clauses().iter().any(|clause| {
            clause.operator() != Operator::NotEqual
                && clause
                    .version()
                    .parse::<Version>()
                    .is_ok_and(|v| v.is_postrelease())
        })
    })
}
