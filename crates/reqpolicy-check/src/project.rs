//! A project's requirements, parsed per file.

use crate::report::{FAILURE_CLASS_DUPLICATE, Finding, WARNING_CLASS_NO_TRAILING_NEWLINE};
use reqpolicy_kernel::{Declaration, DeclarationSet, ParseError, ParseOptions};
use std::collections::BTreeMap;

/// Package name to its declarations within one file.
pub type FileRequirements = BTreeMap<String, Vec<Declaration>>;

/// One requirements file's name (relative to the project root) and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSource {
    pub name: String,
    pub content: String,
}

impl ProjectSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Key under which a setup.cfg extra is filed, e.g. `.[test]`.
pub fn extra_key(extra: &str) -> String {
    format!(".[{extra}]")
}

pub fn is_extra_key(key: &str) -> bool {
    key.starts_with(".[") && key.ends_with(']')
}

/// Strict-mode warning for a file whose last line has no newline.
pub fn missing_newline_warning(set: &DeclarationSet) -> Option<Finding> {
    if set.ends_with_newline() {
        return None;
    }
    tracing::warn!(file = %set.source(), "requirements file does not end with a newline");
    Some(
        Finding::new(
            WARNING_CLASS_NO_TRAILING_NEWLINE,
            "",
            format!(
                "Requirements file {} does not end with a newline.",
                set.source()
            ),
        )
        .in_file(set.source()),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRequirements {
    pub name: String,
    pub files: BTreeMap<String, FileRequirements>,
    /// Strict-mode duplicate findings.
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ProjectRequirements {
    /// Parse every requirements file and every extra.
    ///
    /// Under `strict`, comment-stripped duplicates become findings and a
    /// missing trailing newline is warned about. Grammar errors abort.
    pub fn process(
        name: &str,
        files: &[ProjectSource],
        extras: &BTreeMap<String, String>,
        strict: bool,
    ) -> Result<Self, ParseError> {
        tracing::info!(project = name, "checking project requirements");
        let mut project = Self {
            name: name.to_string(),
            ..Self::default()
        };
        for source in files {
            tracing::debug!(file = %source.name, "processing requirements file");
            let reqs = project.extract(&source.name, &source.content, strict)?;
            project.files.insert(source.name.clone(), reqs);
        }
        for (extra, content) in extras {
            let key = extra_key(extra);
            tracing::debug!(extra = %key, "processing extra");
            let reqs = project.extract(&key, content, strict)?;
            project.files.insert(key, reqs);
        }
        Ok(project)
    }

    fn extract(
        &mut self,
        file: &str,
        content: &str,
        strict: bool,
    ) -> Result<FileRequirements, ParseError> {
        let set = DeclarationSet::parse(content, &ParseOptions::new(file).permit_urls(true))?;
        if strict {
            self.warnings.extend(missing_newline_warning(&set));
            let mut dupes: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for entry in set.duplicates() {
                dupes
                    .entry(entry.declaration.package.as_str())
                    .or_default()
                    .push(entry.line.as_str());
            }
            for (package, lines) in dupes {
                let all: Vec<&str> = set.get(package).iter().map(|e| e.line.as_str()).collect();
                self.errors.push(
                    Finding::new(
                        FAILURE_CLASS_DUPLICATE,
                        package,
                        format!(
                            "Requirements file has duplicate entries for package {package} : {all:?} (repeated: {lines:?})"
                        ),
                    )
                    .in_file(file),
                );
            }
        }
        let mut reqs = FileRequirements::new();
        for (package, entries) in set.iter() {
            let decls = reqs.entry(package.to_string()).or_default();
            for entry in entries {
                if !decls.contains(&entry.declaration) {
                    decls.push(entry.declaration.clone());
                }
            }
        }
        Ok(reqs)
    }

    /// Every (file, package, declarations) triple, files in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[Declaration])> {
        self.files.iter().flat_map(|(file, reqs)| {
            reqs.iter().map(move |(package, decls)| {
                (file.as_str(), package.as_str(), decls.as_slice())
            })
        })
    }

    /// Count of (file, package) pairs.
    pub fn package_count(&self) -> usize {
        self.files.values().map(BTreeMap::len).sum()
    }
}
