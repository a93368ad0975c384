pub mod cap;
pub mod check_coverage;
pub mod check_exists;
pub mod check_overlap;
pub mod merge_constraints;
pub mod sort;
pub mod update;
pub mod validate_constraints;
pub mod validate_project;
