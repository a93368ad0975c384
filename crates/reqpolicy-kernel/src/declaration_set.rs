//! Declaration Set: every declaration of one file, grouped by package.

use crate::declaration::{Declaration, Line, canonical_name, is_pass_through, parse_line};
use crate::error::ParseError;
use std::collections::BTreeMap;

/// A declaration and the trimmed line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub declaration: Declaration,
    pub line: String,
}

/// How a file's content is parsed.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    source: String,
    permit_urls: bool,
}

impl ParseOptions {
    /// `source` names the file in error messages and findings.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            permit_urls: false,
        }
    }

    pub fn permit_urls(mut self, permit: bool) -> Self {
        self.permit_urls = permit;
        self
    }
}

/// Parsed requirements file.
///
/// Comments, blanks, and pass-through lines are kept apart in
/// [`other_lines`](Self::other_lines) and never appear as packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationSet {
    source: String,
    packages: BTreeMap<String, Vec<Entry>>,
    other_lines: Vec<String>,
    ends_with_newline: bool,
}

impl DeclarationSet {
    /// Parse a whole file. The first bad line aborts with its position.
    pub fn parse(content: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        let mut set = Self {
            source: options.source.clone(),
            ends_with_newline: content.is_empty() || content.ends_with('\n'),
            ..Self::default()
        };
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if is_pass_through(line) {
                set.other_lines.push(line.to_string());
                continue;
            }
            let parsed =
                parse_line(line, options.permit_urls).map_err(|e| e.at(&options.source, idx + 1))?;
            match parsed {
                Line::Comment(text) => set.other_lines.push(text),
                Line::Declaration(declaration) => set
                    .packages
                    .entry(declaration.package.clone())
                    .or_default()
                    .push(Entry {
                        declaration,
                        line: line.to_string(),
                    }),
            }
        }
        Ok(set)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Entries for `name` in file order; the name is canonicalized first.
    pub fn get(&self, name: &str) -> &[Entry] {
        self.packages
            .get(&canonical_name(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(&canonical_name(name))
    }

    /// Declarations for `name`, in file order.
    pub fn declarations<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a Declaration> + Clone + use<'a> {
        self.get(name).iter().map(|entry| &entry.declaration)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.packages
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Number of distinct packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn other_lines(&self) -> &[String] {
        &self.other_lines
    }

    pub fn ends_with_newline(&self) -> bool {
        self.ends_with_newline
    }

    /// Entries equal to an earlier entry of the same package once comments
    /// are stripped.
    pub fn duplicates(&self) -> Vec<&Entry> {
        let mut out = Vec::new();
        for entries in self.packages.values() {
            for (idx, entry) in entries.iter().enumerate() {
                let stripped = entry.declaration.without_comment();
                if entries[..idx]
                    .iter()
                    .any(|earlier| earlier.declaration.without_comment() == stripped)
                {
                    out.push(entry);
                }
            }
        }
        out
    }
}
