//! Findings and the report they roll up into.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const CHECK_REPORT_SCHEMA: u32 = 1;

pub const FAILURE_CLASS_PARSE: &str = "requirements.parse.invalid";
pub const FAILURE_CLASS_DUPLICATE: &str = "project.duplicate";
pub const WARNING_CLASS_NO_TRAILING_NEWLINE: &str = "project.trailing_newline.missing";

pub const FAILURE_CLASS_CONSTRAINT_FORMAT: &str = "constraints.format.not_exact_pin";
pub const FAILURE_CLASS_CONSTRAINT_INCOMPATIBLE: &str = "constraints.incompatible";

pub const FAILURE_CLASS_NOT_IN_GLOBAL: &str = "validate.not_in_global";
pub const FAILURE_CLASS_NO_GLOBAL_MATCH: &str = "validate.no_global_match";
pub const FAILURE_CLASS_EXCLUSIONS: &str = "validate.exclusions.not_subset";
pub const FAILURE_CLASS_NO_FLOOR: &str = "validate.floor.missing";
pub const FAILURE_CLASS_POST_RELEASE: &str = "validate.post_release";
pub const FAILURE_CLASS_VARIANT_COUNT: &str = "validate.variant_count";

pub const FAILURE_CLASS_LOWER_MISSING: &str = "lower_constraints.missing";
pub const FAILURE_CLASS_LOWER_NO_MATCH: &str = "lower_constraints.no_marker_match";
pub const FAILURE_CLASS_LOWER_OUT_OF_RANGE: &str = "lower_constraints.out_of_range";
pub const FAILURE_CLASS_LOWER_FLOOR_MISMATCH: &str = "lower_constraints.floor_mismatch";

pub const FAILURE_CLASS_COVERAGE_UNCOVERED: &str = "coverage.uncovered";
pub const FAILURE_CLASS_COVERAGE_DUPE: &str = "coverage.dupe";

pub const FAILURE_CLASS_EXISTS_GLOBAL: &str = "exists.not_in_global";
pub const FAILURE_CLASS_EXISTS_CONSTRAINTS: &str = "exists.not_in_constraints";
pub const FAILURE_CLASS_EXISTS_ABOVE_PIN: &str = "exists.above_pin";

pub const FAILURE_CLASS_NO_PARENT_OVERLAP: &str = "overlap.no_parent_overlap";

/// One diagnostic. Never fatal on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub class: String,
    pub package: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    pub message: String,
}

impl Finding {
    pub fn new(class: &str, package: &str, message: impl Into<String>) -> Self {
        Self {
            class: class.to_string(),
            package: package.to_string(),
            file: String::new(),
            message: message.into(),
        }
    }

    pub fn in_file(mut self, file: &str) -> Self {
        self.file = file.to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub checked_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub schema: u32,
    pub check_kind: String,
    pub result: String,
    pub failure_classes: Vec<String>,
    pub warning_classes: Vec<String>,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub summary: CheckSummary,
}

impl CheckReport {
    /// Roll findings up; the run is rejected iff any error was recorded.
    pub fn from_findings(
        check_kind: &str,
        checked_count: usize,
        errors: Vec<Finding>,
        warnings: Vec<Finding>,
    ) -> Self {
        let result = if errors.is_empty() {
            "accepted".to_string()
        } else {
            "rejected".to_string()
        };
        Self {
            schema: CHECK_REPORT_SCHEMA,
            check_kind: check_kind.to_string(),
            result,
            failure_classes: collect_classes(&errors),
            warning_classes: collect_classes(&warnings),
            summary: CheckSummary {
                checked_count,
                error_count: errors.len(),
                warning_count: warnings.len(),
            },
            errors,
            warnings,
        }
    }

    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

fn collect_classes(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .map(|finding| finding.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
