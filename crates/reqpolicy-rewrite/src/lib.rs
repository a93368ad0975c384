//! # Reqpolicy Rewrite
//!
//! Transforms that produce new requirement text. Every function returns the
//! full rewritten content; callers decide where it is written.
//!
//! - [`cap`]: add `~=` bounds from a frozen snapshot.
//! - [`freeze`]: combine per-interpreter freezes into a constraints list.
//! - [`sync`]: align a project's files with the global spelling.
//! - [`sort`]: order the global list inside its sections.

pub mod cap;
pub mod freeze;
pub mod sort;
pub mod sync;

pub use cap::{Capper, FrozenVersions, frozen_versions};
pub use freeze::{
    Freeze, FreezeError, FrozenPackages, clone_versions, combine_freezes, merge_constraints,
    parse_freeze, parse_version_map,
};
pub use sort::sort_sections;
pub use sync::{
    Change, SYNC_TARGETS, SyncError, SyncOptions, SyncOutcome, global_lines, managed_setup_py,
    sync_requirements,
};
