//! Combining per-interpreter freezes into one constraints list.
//!
//! A package frozen at the same version under every interpreter becomes a
//! bare `name===version` pin; otherwise each (version, interpreter) pair gets
//! its own `python_version` marker line.

use reqpolicy_kernel::canonical_name;
use std::collections::{BTreeMap, BTreeSet};

/// `(package, version)` pairs from one `pip freeze`.
pub type FrozenPackages = Vec<(String, String)>;

/// One interpreter's freeze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Freeze {
    pub python_version: String,
    pub packages: FrozenPackages,
}

impl Freeze {
    pub fn new(python_version: impl Into<String>, packages: FrozenPackages) -> Self {
        Self {
            python_version: python_version.into(),
            packages,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FreezeError {
    #[error("irregular freeze line: {0}")]
    IrregularLine(String),

    #[error("freeze line has no == pin: {0}")]
    MissingPin(String),

    #[error("duplicate python {0}")]
    DuplicatePython(String),

    #[error("invalid version map entry {0:?}, expected SOURCE:TARGET")]
    BadVersionMap(String),
}

/// Parse `pip freeze` output. Option lines (`-e ...`) are an error.
pub fn parse_freeze(text: &str) -> Result<FrozenPackages, FreezeError> {
    let mut result = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.starts_with('-') {
            return Err(FreezeError::IrregularLine(line.to_string()));
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (package, rest) = line
            .split_once("==")
            .ok_or_else(|| FreezeError::MissingPin(line.to_string()))?;
        // `===` pins from an earlier merge read the same as `==`.
        let version = rest
            .trim_start_matches('=')
            .split("==")
            .next()
            .unwrap_or_default();
        result.push((package.to_string(), version.to_string()));
    }
    Ok(result)
}

/// One line per constraint, without trailing newlines, sorted by package.
pub fn combine_freezes(
    freezes: &[Freeze],
    blacklist: &[String],
) -> Result<Vec<String>, FreezeError> {
    let excludes: BTreeSet<String> = blacklist.iter().map(|name| canonical_name(name)).collect();
    let mut reference_versions: Vec<&str> = Vec::new();
    // canonical name -> (first spelling seen, version -> interpreters)
    let mut packages: BTreeMap<String, (&str, BTreeMap<&str, Vec<&str>>)> = BTreeMap::new();
    for freeze in freezes {
        let python = freeze.python_version.as_str();
        if reference_versions.contains(&python) {
            return Err(FreezeError::DuplicatePython(python.to_string()));
        }
        reference_versions.push(python);
        for (package, version) in &freeze.packages {
            packages
                .entry(canonical_name(package))
                .or_insert_with(|| (package.as_str(), BTreeMap::new()))
                .1
                .entry(version.as_str())
                .or_default()
                .push(python);
        }
    }

    let mut lines = Vec::new();
    for (key, (package, versions)) in packages {
        if excludes.contains(&key) {
            continue;
        }
        let mut everywhere = versions
            .iter()
            .filter(|(_, pythons)| **pythons == reference_versions);
        match (versions.len(), everywhere.next()) {
            (1, Some((version, _))) => lines.push(format!("{package}==={version}")),
            _ => {
                for (version, pythons) in &versions {
                    let mut pythons = pythons.clone();
                    pythons.sort_unstable();
                    for python in pythons {
                        lines.push(format!("{package}==={version};python_version=='{python}'"));
                    }
                }
            }
        }
    }
    Ok(lines)
}

/// Parse `SOURCE:TARGET` pairs into a source → targets map.
pub fn parse_version_map<S: AsRef<str>>(
    entries: &[S],
) -> Result<BTreeMap<String, BTreeSet<String>>, FreezeError> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for entry in entries {
        let entry = entry.as_ref();
        let (source, target) = entry
            .split_once(':')
            .filter(|(s, t)| !s.is_empty() && !t.is_empty())
            .ok_or_else(|| FreezeError::BadVersionMap(entry.to_string()))?;
        map.entry(source.to_string())
            .or_default()
            .insert(target.to_string());
    }
    Ok(map)
}

/// For each present interpreter named in `version_map`, copy its freeze to
/// every mapped interpreter that has none yet.
pub fn clone_versions(
    freezes: &mut Vec<Freeze>,
    version_map: &BTreeMap<String, BTreeSet<String>>,
) {
    let present: Vec<Freeze> = freezes.clone();
    for freeze in &present {
        let Some(targets) = version_map.get(&freeze.python_version) else {
            continue;
        };
        for target in targets {
            if freezes.iter().any(|f| &f.python_version == target) {
                continue;
            }
            tracing::info!(source = %freeze.python_version, target = %target, "cloning freeze");
            freezes.push(Freeze::new(target.clone(), freeze.packages.clone()));
        }
    }
}

/// Combine constraint files already split per interpreter and sort the
/// result by canonical package name.
pub fn merge_constraints(
    freezes: &[Freeze],
    blacklist: &[String],
) -> Result<Vec<String>, FreezeError> {
    let mut lines = combine_freezes(freezes, blacklist)?;
    lines.sort_by_cached_key(|line| {
        let name_end = line.find("===").unwrap_or(line.len());
        (canonical_name(&line[..name_end]), line.clone())
    });
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freeze(python: &str, pairs: &[(&str, &str)]) -> Freeze {
        Freeze::new(
            python,
            pairs
                .iter()
                .map(|(p, v)| (p.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn parses_freeze_output() {
        let text = "# comment\n\nfixtures==1.2.0\nenum34==1.0.4  \n";
        assert_eq!(
            parse_freeze(text),
            Ok(vec![
                ("fixtures".to_string(), "1.2.0".to_string()),
                ("enum34".to_string(), "1.0.4".to_string()),
            ])
        );
        assert_eq!(
            parse_freeze("-e git+https://x#egg=y\n"),
            Err(FreezeError::IrregularLine("-e git+https://x#egg=y".to_string()))
        );
        assert!(matches!(parse_freeze("fixtures>=1\n"), Err(FreezeError::MissingPin(_))));
        assert_eq!(
            parse_freeze("fixtures===1.2.0\n"),
            Ok(vec![("fixtures".to_string(), "1.2.0".to_string())])
        );
    }

    #[test]
    fn same_items_have_no_marker() {
        let freezes = [
            freeze("2.7", &[("fixtures", "1.2.0")]),
            freeze("3.4", &[("fixtures", "1.2.0")]),
        ];
        assert_eq!(combine_freezes(&freezes, &[]), Ok(vec!["fixtures===1.2.0".to_string()]));
    }

    #[test]
    fn distinct_items_get_markers() {
        let freezes = [
            freeze("2.7", &[("fixtures", "1.2.0")]),
            freeze("3.4", &[("fixtures", "1.2.0"), ("enum", "1.5.0")]),
        ];
        assert_eq!(
            combine_freezes(&freezes, &[]),
            Ok(vec![
                "enum===1.5.0;python_version=='3.4'".to_string(),
                "fixtures===1.2.0".to_string(),
            ])
        );
    }

    #[test]
    fn different_versions_split_per_interpreter() {
        let freezes = [
            freeze("2.7", &[("fixtures", "1.2.0")]),
            freeze("3.4", &[("fixtures", "1.5.0")]),
        ];
        assert_eq!(
            combine_freezes(&freezes, &[]),
            Ok(vec![
                "fixtures===1.2.0;python_version=='2.7'".to_string(),
                "fixtures===1.5.0;python_version=='3.4'".to_string(),
            ])
        );
    }

    #[test]
    fn duplicate_python_is_an_error() {
        let freezes = [freeze("3.4", &[]), freeze("3.4", &[])];
        assert_eq!(
            combine_freezes(&freezes, &[]),
            Err(FreezeError::DuplicatePython("3.4".to_string()))
        );
    }

    #[test]
    fn blacklist_compares_canonical_names() {
        let freezes = [freeze(
            "3.5",
            &[("flake8_docstrings", "0.2.1.post1"), ("fixtures", "1.2.0")],
        )];
        let blacklist = ["Flake8-Docstrings".to_string()];
        assert_eq!(
            combine_freezes(&freezes, &blacklist),
            Ok(vec!["fixtures===1.2.0".to_string()])
        );
    }

    #[test]
    fn spellings_of_one_package_merge() {
        let freezes = [
            freeze("3.6", &[("PyYAML", "5.1")]),
            freeze("3.7", &[("pyyaml", "5.1")]),
        ];
        assert_eq!(combine_freezes(&freezes, &[]), Ok(vec!["PyYAML===5.1".to_string()]));
    }

    #[test]
    fn clones_missing_interpreters() {
        let map = parse_version_map(&["3.5:3.4", "3.5:3.6"]).unwrap_or_else(|e| panic!("{e}"));
        let mut freezes = vec![
            freeze("2.7", &[("dnspython", "1.15.0")]),
            freeze("3.5", &[("dnspython3", "1.12.0")]),
        ];
        clone_versions(&mut freezes, &map);
        let order: Vec<_> = freezes.iter().map(|f| f.python_version.as_str()).collect();
        assert_eq!(order, ["2.7", "3.5", "3.4", "3.6"]);
        assert_eq!(freezes[2].packages, freezes[1].packages);
    }

    #[test]
    fn does_not_clone_over_existing_data() {
        let map = parse_version_map(&["3.4:3.5", "3.5:3.4"]).unwrap_or_else(|e| panic!("{e}"));
        let mut freezes = vec![
            freeze("3.4", &[("dnspython3", "1.12.0")]),
            freeze("3.5", &[("other-pkg", "1.0.0")]),
        ];
        let before = freezes.clone();
        clone_versions(&mut freezes, &map);
        assert_eq!(freezes, before);
    }

    #[test]
    fn rejects_bad_version_map() {
        assert!(matches!(parse_version_map(&["3.5"]), Err(FreezeError::BadVersionMap(_))));
        assert!(matches!(parse_version_map(&[":3.4"]), Err(FreezeError::BadVersionMap(_))));
    }

    #[test]
    fn merge_sorts_case_insensitively() {
        let freezes = [
            freeze("3.6", &[("Babel", "2.0"), ("alembic", "1.0")]),
            freeze("3.7", &[("Babel", "2.0"), ("alembic", "1.1")]),
        ];
        let lines = merge_constraints(&freezes, &[]).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            lines,
            [
                "alembic===1.0;python_version=='3.6'",
                "alembic===1.1;python_version=='3.7'",
                "Babel===2.0",
            ]
        );
    }
}
