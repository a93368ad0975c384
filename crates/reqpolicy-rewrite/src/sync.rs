//! Requirements sync: rewrite a project's file to the global spelling of
//! every package it declares.

use reqpolicy_kernel::{
    Declaration, Line, ParseError, REQS_HEADER, is_pass_through, parse_line, to_content,
};
use std::collections::BTreeMap;
use std::fmt;

const MANAGED_SETUP_PY: &str = "\
# THIS FILE IS MANAGED BY THE GLOBAL REQUIREMENTS REPO - DO NOT EDIT
import setuptools

setuptools.setup(
    setup_requires=['pbr'],
    pbr=True)
";

/// Project files the sync rewrites, relative to the project root.
pub const SYNC_TARGETS: [&str; 8] = [
    "requirements.txt",
    "tools/pip-requires",
    "test-requirements.txt",
    "tools/test-requires",
    "requirements-py2.txt",
    "test-requirements-py2.txt",
    "requirements-py3.txt",
    "test-requirements-py3.txt",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Keep packages the global list does not know.
    pub soft_update: bool,
    /// Also sync `hacking`, which projects otherwise align on their own.
    pub hacking: bool,
    /// Drop unknown packages with a warning instead of failing.
    pub allow_non_standard: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub name: String,
    pub old: String,
    pub new: String,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<30.30} ->   {}", self.old, self.new)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub content: String,
    pub changes: Vec<Change>,
    /// Non-standard packages removed under `allow_non_standard`.
    pub dropped: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("'{name}' is not in global-requirements.txt")]
    NonStandard { name: String, line: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn sync_pass_through(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with("-e") || is_pass_through(line)
}

/// `None` for lines that carry no declaration.
fn package_of(line: &str) -> Result<Option<String>, ParseError> {
    let Line::Declaration(decl) = parse_line(line, true)? else {
        return Ok(None);
    };
    Ok(Some(decl.package))
}

/// Canonical package name to the trimmed global line.
pub fn global_lines(content: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let mut reqs = BTreeMap::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if sync_pass_through(line) {
            continue;
        }
        let name = package_of(line).map_err(|e| e.at("global-requirements.txt", idx + 1))?;
        if let Some(name) = name {
            reqs.insert(name, line.to_string());
        }
    }
    Ok(reqs)
}

/// Rewrite `dest` so each known package uses the global line verbatim.
///
/// Comments, blanks, and pass-through lines are copied as is, the ordering
/// header is added when missing.
pub fn sync_requirements(
    global: &BTreeMap<String, String>,
    dest: &str,
    options: &SyncOptions,
) -> Result<SyncOutcome, SyncError> {
    let mut outcome = SyncOutcome::default();
    let has_header = dest
        .lines()
        .take(REQS_HEADER.len())
        .eq(REQS_HEADER.iter().copied());
    if !has_header {
        outcome.content = to_content(std::iter::empty::<&Declaration>(), ';', true);
    }

    for old_line in dest.split_inclusive('\n') {
        let old = old_line.trim();
        if sync_pass_through(old) {
            outcome.content.push_str(old_line);
            continue;
        }
        let Some(name) = package_of(old)? else {
            outcome.content.push_str(old_line);
            continue;
        };
        if name.contains("hacking") && !options.hacking {
            outcome.content.push_str(old_line);
            continue;
        }
        match global.get(&name) {
            Some(new) if new == old => outcome.content.push_str(old_line),
            Some(new) => {
                outcome.changes.push(Change {
                    name: name.clone(),
                    old: old.to_string(),
                    new: new.clone(),
                });
                outcome.content.push_str(new);
                outcome.content.push('\n');
            }
            None if options.soft_update => outcome.content.push_str(old_line),
            None if options.allow_non_standard => {
                tracing::warn!(package = %name, "not in global-requirements.txt, dropping");
                outcome.dropped.push(name);
            }
            None => {
                return Err(SyncError::NonStandard {
                    name,
                    line: old.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

/// The managed `setup.py` for a pbr project, or `None` when the project
/// does not use pbr or is pbr itself.
pub fn managed_setup_py(setup_py: Option<&str>, setup_cfg: Option<&str>) -> Option<&'static str> {
    let setup_py = setup_py?;
    if !setup_py.contains("pbr") {
        return None;
    }
    if setup_cfg.is_some_and(|cfg| cfg.contains("name = pbr")) {
        return None;
    }
    Some(MANAGED_SETUP_PY)
}
