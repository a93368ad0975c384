//! Reading a project checkout: its requirements files and setup.cfg extras.

use crate::support::read_text_or_exit;
use reqpolicy_check::{ProjectRequirements, ProjectSource};
use std::collections::BTreeMap;
use std::path::Path;

pub const REQUIREMENTS_FILES: [&str; 4] = [
    "requirements.txt",
    "test-requirements.txt",
    "doc/requirements.txt",
    "driver-requirements.txt",
];

pub const LOWER_CONSTRAINTS_FILE: &str = "lower-constraints.txt";

/// The `[extras]` section of a setup.cfg: extra name to its requirement
/// lines, one per line. Continuation lines are indented; `#` and `;` start
/// comments.
pub fn setup_cfg_extras(text: &str) -> BTreeMap<String, String> {
    let mut extras: BTreeMap<String, String> = BTreeMap::new();
    let mut in_section = false;
    let mut current: Option<String> = None;
    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_section = trimmed == "[extras]";
            current = None;
            continue;
        }
        if !in_section || trimmed.is_empty() || trimmed.starts_with(['#', ';']) {
            continue;
        }
        if raw.starts_with([' ', '\t']) {
            if let Some(value) = current.as_ref().and_then(|key| extras.get_mut(key)) {
                value.push_str(trimmed);
                value.push('\n');
            }
            continue;
        }
        let Some((key, value)) = trimmed.split_once(['=', ':']) else {
            current = None;
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();
        let entry = extras.entry(key.clone()).or_default();
        if !value.is_empty() {
            entry.push_str(value);
            entry.push('\n');
        }
        current = Some(key);
    }
    extras
}

/// Collect the requirements files that exist under `root`, in a fixed order.
pub fn read_sources(root: &Path) -> Vec<ProjectSource> {
    REQUIREMENTS_FILES
        .iter()
        .filter(|name| root.join(name).is_file())
        .map(|name| ProjectSource::new(*name, read_text_or_exit(root.join(name))))
        .collect()
}

pub fn read_extras(root: &Path) -> BTreeMap<String, String> {
    let setup_cfg = root.join("setup.cfg");
    if !setup_cfg.is_file() {
        return BTreeMap::new();
    }
    setup_cfg_extras(&read_text_or_exit(setup_cfg))
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Read and process the project at `root`; exits on I/O or grammar errors.
pub fn load_project_or_exit(root: &str, strict: bool) -> ProjectRequirements {
    let root = Path::new(root);
    if !root.is_dir() {
        eprintln!("error: project directory not found: {}", root.display());
        std::process::exit(2);
    }
    let sources = read_sources(root);
    let extras = read_extras(root);
    ProjectRequirements::process(&project_name(root), &sources, &extras, strict).unwrap_or_else(
        |e| {
            eprintln!("error: {e}");
            std::process::exit(2);
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_multi_line_extras() {
        let cfg = "\
[metadata]
name = demo

[extras]
# optional backends
mysql = PyMySQL>=0.7.6
test =
    fixtures>=3.0.0
    oslotest>=3.2.0 # Apache-2.0
empty =

[entry_points]
console_scripts =
    demo = demo.cmd:main
";
        let extras = setup_cfg_extras(cfg);
        assert_eq!(
            extras,
            BTreeMap::from([
                ("empty".to_string(), String::new()),
                ("mysql".to_string(), "PyMySQL>=0.7.6\n".to_string()),
                (
                    "test".to_string(),
                    "fixtures>=3.0.0\noslotest>=3.2.0 # Apache-2.0\n".to_string()
                ),
            ])
        );
    }

    #[test]
    fn missing_section_gives_no_extras() {
        assert!(setup_cfg_extras("[metadata]\nname = demo\n").is_empty());
    }
}
