//! Lower-constraints: each floor must be pinned exactly.

use crate::project::ProjectRequirements;
use crate::report::{
    FAILURE_CLASS_LOWER_FLOOR_MISMATCH, FAILURE_CLASS_LOWER_MISSING, FAILURE_CLASS_LOWER_NO_MATCH,
    FAILURE_CLASS_LOWER_OUT_OF_RANGE, Finding,
};
use reqpolicy_kernel::{DeclarationSet, MarkerMatch, find_constraint, specifier};

pub const DEFAULT_SKIP_FILES: [&str; 1] = ["doc/requirements.txt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerConstraintOptions {
    /// Project files that are not needed for unit or functional tests.
    pub skip_files: Vec<String>,
    pub marker_match: MarkerMatch,
}

impl Default for LowerConstraintOptions {
    fn default() -> Self {
        Self {
            skip_files: DEFAULT_SKIP_FILES
                .iter()
                .map(ToString::to_string)
                .collect(),
            marker_match: MarkerMatch::Literal,
        }
    }
}

pub fn validate_lower_constraints(
    project: &ProjectRequirements,
    constraints: &DeclarationSet,
    blacklist: &DeclarationSet,
    options: &LowerConstraintOptions,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (file, reqs) in &project.files {
        if options.skip_files.iter().any(|skip| skip == file) {
            continue;
        }
        tracing::debug!(file = %file, "validating lower constraints");

        for (name, decls) in reqs {
            if blacklist.contains(name) {
                continue;
            }
            if !constraints.contains(name) {
                findings.push(
                    Finding::new(
                        FAILURE_CLASS_LOWER_MISSING,
                        name,
                        format!(
                            "Package {name:?} is used in {file} but not in lower-constraints.txt"
                        ),
                    )
                    .in_file(file),
                );
                continue;
            }

            for decl in decls {
                let Some(constraint) =
                    find_constraint(decl, constraints.declarations(name), options.marker_match)
                else {
                    findings.push(
                        Finding::new(
                            FAILURE_CLASS_LOWER_NO_MATCH,
                            name,
                            format!(
                                "Unable to find constraint for {name} matching {:?} or without any markers.",
                                decl.marker
                            ),
                        )
                        .in_file(file),
                    );
                    continue;
                };

                let version = constraint.specifiers.trim_start_matches('=');
                if !specifier::contains(&decl.specifiers, version) {
                    findings.push(
                        Finding::new(
                            FAILURE_CLASS_LOWER_OUT_OF_RANGE,
                            name,
                            format!(
                                "Package {name:?} is constrained to {version} which is incompatible with the settings {} from {file}.",
                                decl.to_line(';')
                            ),
                        )
                        .in_file(file),
                    );
                }

                // A missing floor is reported by `validate`.
                let Some(expected) = specifier::floor_version(&decl.specifiers) else {
                    continue;
                };
                if version != expected {
                    findings.push(
                        Finding::new(
                            FAILURE_CLASS_LOWER_FLOOR_MISMATCH,
                            name,
                            format!(
                                "Package {name:?} is constrained to {version} which does not match the minimum version specifier {expected} in {file}"
                            ),
                        )
                        .in_file(file),
                    );
                }
            }
        }
    }
    findings
}
