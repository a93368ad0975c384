//! # Reqpolicy Check
//!
//! Cross-file rule engine. Each check takes parsed [`DeclarationSet`]s (or a
//! processed [`ProjectRequirements`]) and returns a list of [`Finding`]s;
//! an empty list is a pass. Nothing here stops at the first failure.
//!
//! | Check | Inputs |
//! |-------|--------|
//! | [`check_compatible`] | global, upper-constraints |
//! | [`check_constraint_format`] | upper-constraints text |
//! | [`validate`] | project, blacklist, global |
//! | [`validate_lower_constraints`] | project, lower-constraints, blacklist |
//! | [`check_blacklist_coverage`] | global, upper-constraints, blacklist |
//! | [`check_exists`] | project, global, upper-constraints, blacklist |
//! | [`check_parent_overlap`] | parent global, head global |
//!
//! [`DeclarationSet`]: reqpolicy_kernel::DeclarationSet

pub mod compatible;
pub mod coverage;
pub mod exists;
pub mod lower;
pub mod overlap;
pub mod project;
pub mod report;
pub mod validate;

pub use compatible::{check_compatible, check_constraint_format};
pub use coverage::check_blacklist_coverage;
pub use exists::check_exists;
pub use lower::{DEFAULT_SKIP_FILES, LowerConstraintOptions, validate_lower_constraints};
pub use overlap::check_parent_overlap;
pub use project::{
    FileRequirements, ProjectRequirements, ProjectSource, extra_key, is_extra_key,
    missing_newline_warning,
};
pub use report::{CheckReport, CheckSummary, Finding};
pub use validate::validate;

pub const CHECK_KIND_VALIDATE_CONSTRAINTS: &str = "reqpolicy.validate_constraints.v1";
pub const CHECK_KIND_VALIDATE_PROJECT: &str = "reqpolicy.validate_project.v1";
pub const CHECK_KIND_COVERAGE: &str = "reqpolicy.coverage.v1";
pub const CHECK_KIND_EXISTS: &str = "reqpolicy.exists.v1";
pub const CHECK_KIND_PARENT_OVERLAP: &str = "reqpolicy.parent_overlap.v1";
