//! # Reqpolicy Kernel
//!
//! The data model shared by every reqpolicy tool: one requirement line
//! becomes a [`Declaration`], a whole file becomes a [`DeclarationSet`],
//! and the [`specifier`] and [`marker`] modules answer the only two
//! questions validators ask of those records: "does this version fit this
//! range?" and "which constraint applies under this environment guard?".
//!
//! ## Architecture
//!
//! ```text
//! raw line ──parse_line──▶ Line::{Declaration, Comment}
//!     │
//! file text ──DeclarationSet::parse──▶ name → [(Declaration, origin line)]
//!     │
//! SpecifierSet / Version       ← containment, exclusions, floors
//! Marker / find_constraint     ← environment-guard matching
//! ```
//!
//! Everything here is pure and synchronous. Nothing is cached between
//! calls; callers parse their inputs fresh on every run.

pub mod declaration;
pub mod declaration_set;
pub mod error;
pub mod marker;
pub mod specifier;
pub mod version;

pub use declaration::{
    Declaration, Line, REQS_HEADER, canonical_name, is_pass_through, parse_line, to_content,
};
pub use declaration_set::{DeclarationSet, Entry, ParseOptions};
pub use error::{MarkerError, ParseError, VersionError};
pub use marker::{Marker, MarkerMatch, find_constraint};
pub use specifier::{
    Operator, Specifier, SpecifierSet, exclusions, floor_version, has_floor, is_subset,
};
pub use version::{Version, decrease_version, increase_version, version_required};
