//! Version-bump capper: pin uncapped requirements to `~=` the frozen version.

use reqpolicy_kernel::{Line, canonical_name, parse_line};
use std::collections::BTreeMap;

/// Canonical package name to frozen version text.
pub type FrozenVersions = BTreeMap<String, String>;

/// Read a freeze snapshot. Lines that do not parse, and lines with no
/// version, are skipped.
pub fn frozen_versions(content: &str) -> FrozenVersions {
    let mut frozen = FrozenVersions::new();
    for line in content.lines() {
        let Ok(Line::Declaration(decl)) = parse_line(line, false) else {
            continue;
        };
        let version = decl
            .specifiers
            .rsplit(['<', '>', '='])
            .next()
            .unwrap_or_default()
            .trim();
        if !version.is_empty() {
            frozen.insert(decl.package, version.to_string());
        }
    }
    frozen
}

/// Rewrites requirement lines against a frozen snapshot.
///
/// The override table maps a package to a replacement line, or to `None`
/// to leave the package uncapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capper {
    overrides: BTreeMap<String, Option<String>>,
}

impl Capper {
    pub fn new(overrides: BTreeMap<String, Option<String>>) -> Self {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(name, replacement)| (canonical_name(&name), replacement))
                .collect(),
        }
    }

    pub fn default_overrides() -> BTreeMap<String, Option<String>> {
        BTreeMap::from([
            ("suds".to_string(), Some("suds~=0.4".to_string())),
            ("libvirt-python".to_string(), None),
            (
                "python-glanceclient".to_string(),
                Some("python-glanceclient~=0.15.0".to_string()),
            ),
        ])
    }

    pub fn with_default_overrides() -> Self {
        Self::new(Self::default_overrides())
    }

    /// Cap one line. Comments, unparseable lines, and lines already bounded
    /// by `==`, `~=` or `<` come back unchanged.
    pub fn cap_line(&self, line: &str, frozen: &FrozenVersions) -> String {
        let Ok(Line::Declaration(decl)) = parse_line(line, false) else {
            return line.to_string();
        };
        let capped = ["==", "~=", "<"];
        if capped.iter().any(|op| decl.specifiers.contains(*op)) {
            return line.to_string();
        }
        if let Some(replacement) = self.overrides.get(&decl.package) {
            return replacement.clone().unwrap_or_else(|| line.to_string());
        }
        let Some(version) = frozen.get(&decl.package) else {
            return line.to_string();
        };

        let mut out = written_name(line).to_string();
        if !decl.extras.is_empty() {
            out.push_str(&format!("[{}]", decl.extras.join(",")));
        }
        out.push_str("~=");
        out.push_str(version);
        if !decl.marker.is_empty() {
            out.push(';');
            out.push_str(&decl.marker);
        }
        if !decl.comment.is_empty() {
            out.push(' ');
            out.push_str(&decl.comment);
        }
        out
    }

    pub fn cap<'a, I>(&self, lines: I, frozen: &FrozenVersions) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .map(|line| self.cap_line(line, frozen))
            .collect()
    }
}

/// The package name as spelled in `line`.
fn written_name(line: &str) -> &str {
    let line = line.trim_start();
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        .unwrap_or(line.len());
    &line[..end]
}
