//! Declaration parser: one requirement line in, one structured record out.
//!
//! Grammar accepted by [`parse_line`]:
//!
//! ```text
//! name[ [extra1,extra2]][clauses][;marker][ #comment]
//! [-e ]location#egg=name[;marker][ #comment]
//! ```

use crate::error::ParseError;
use crate::specifier::SpecifierSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Ordering header written at the top of synced requirements files.
pub const REQS_HEADER: [&str; 3] = [
    "# The order of packages is significant, because pip processes them in the order",
    "# of appearance. Changing the order has an impact on the overall integration",
    "# process, which may cause wedges in the gate later.",
];

const TARBALL_PREFIX: &str = "http://tarballs.openstack.org/";

/// One parsed dependency line.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Declaration {
    /// Canonical name, see [`canonical_name`].
    pub package: String,
    /// Non-empty only for URL/path requirements, `-e ` prefix included.
    pub location: String,
    /// Canonical comma-joined clause list.
    pub specifiers: String,
    pub marker: String,
    /// Sorted, de-duplicated extras.
    pub extras: Vec<String>,
    pub comment: String,
}

impl Declaration {
    /// Equality on every field except the comment.
    pub fn value_eq(&self, other: &Self) -> bool {
        self.package == other.package
            && self.location == other.location
            && self.specifiers == other.specifiers
            && self.marker == other.marker
            && self.extras == other.extras
    }

    pub fn without_comment(&self) -> Self {
        Self {
            comment: String::new(),
            ..self.clone()
        }
    }

    /// Extras joined with `,`, empty for the base set.
    pub fn extra_key(&self) -> String {
        self.extras.join(",")
    }

    /// Render back to a requirement line.
    pub fn to_line(&self, marker_sep: char) -> String {
        let mut out = if self.location.is_empty() {
            let mut head = self.package.clone();
            if !self.extras.is_empty() {
                head.push('[');
                head.push_str(&self.extras.join(","));
                head.push(']');
            }
            head.push_str(&self.specifiers);
            head
        } else {
            format!("{}#egg={}", self.location, self.package)
        };
        if !self.marker.is_empty() {
            out.push(marker_sep);
            out.push_str(&self.marker);
        }
        if !self.comment.is_empty() {
            out.push(' ');
            out.push_str(&self.comment);
        }
        out
    }
}

/// A classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Declaration(Declaration),
    /// Comment-only or blank line, trimmed.
    Comment(String),
}

/// Lower-case and fold `_` to `-`.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}

/// Index and flag options, plus tarball URLs, that tooling copies verbatim
/// rather than treating as packages.
pub fn is_pass_through(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(TARBALL_PREFIX)
        || ["-f", "-r", "-c", "-i", "--"]
            .iter()
            .any(|flag| line.starts_with(flag))
}

fn named_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[(?P<extras>[^\]]*)\])?\s*(?P<specs>.*)$",
        )
        .expect("declaration name regex must compile")
    })
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$")
            .expect("identifier regex must compile")
    })
}

/// Split `text` at the first `#` into (body, comment).
fn split_comment(text: &str) -> (&str, String) {
    match text.find('#') {
        Some(idx) => (&text[..idx], text[idx..].trim().to_string()),
        None => (text, String::new()),
    }
}

/// Classify and parse one line.
///
/// `permit_urls` gates location requirements; policy files are parsed with
/// it off so URL installs are rejected there.
pub fn parse_line(line: &str, permit_urls: bool) -> Result<Line, ParseError> {
    let text = line.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(Line::Comment(text.to_string()));
    }
    let (body, _) = split_comment(text);
    if body.starts_with("-e") || body.contains("://") {
        if !permit_urls {
            return Err(ParseError::UrlNotPermitted {
                line: text.to_string(),
            });
        }
        return parse_location(text).map(Line::Declaration);
    }
    if text.starts_with('-') {
        return Err(ParseError::OptionLine {
            line: text.to_string(),
        });
    }
    parse_named(text).map(Line::Declaration)
}

fn parse_named(text: &str) -> Result<Declaration, ParseError> {
    let (body, comment) = split_comment(text);
    let (head, marker) = match body.split_once(';') {
        Some((head, marker)) => (head.trim(), marker.trim().to_string()),
        None => (body.trim(), String::new()),
    };
    let caps = named_regex()
        .captures(head)
        .ok_or_else(|| ParseError::malformed(text, "missing package name"))?;

    let extras = match caps.name("extras") {
        Some(raw) => parse_extras(text, raw.as_str())?,
        None => Vec::new(),
    };

    let mut specs = caps.name("specs").map_or("", |m| m.as_str()).trim();
    if let Some(inner) = specs.strip_prefix('(') {
        specs = inner
            .strip_suffix(')')
            .ok_or_else(|| ParseError::malformed(text, "unbalanced parenthesis"))?
            .trim();
    }
    let specifiers = specs
        .parse::<SpecifierSet>()
        .map_err(|e| ParseError::malformed(text, format!("bad specifier: {e}")))?
        .canonical();

    Ok(Declaration {
        package: canonical_name(&caps["name"]),
        location: String::new(),
        specifiers,
        marker,
        extras,
        comment,
    })
}

fn parse_extras(text: &str, raw: &str) -> Result<Vec<String>, ParseError> {
    let mut extras = Vec::new();
    for extra in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if !identifier_regex().is_match(extra) {
            return Err(ParseError::malformed(text, format!("bad extra {extra:?}")));
        }
        extras.push(canonical_name(extra));
    }
    extras.sort();
    extras.dedup();
    Ok(extras)
}

fn parse_location(text: &str) -> Result<Declaration, ParseError> {
    let idx = text.find("#egg=").ok_or_else(|| ParseError::MissingEgg {
        line: text.to_string(),
    })?;
    let location = text[..idx].trim().to_string();
    if location == "-e" || location.is_empty() {
        return Err(ParseError::malformed(text, "empty location"));
    }

    let fragment = &text[idx + "#egg=".len()..];
    let name_len = fragment
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        .unwrap_or(fragment.len());
    let name = &fragment[..name_len];
    if !identifier_regex().is_match(name) {
        return Err(ParseError::MissingEgg {
            line: text.to_string(),
        });
    }

    let (rest, comment) = split_comment(&fragment[name_len..]);
    let rest = rest.trim();
    let marker = if rest.is_empty() {
        String::new()
    } else if let Some(marker) = rest.strip_prefix(';') {
        marker.trim().to_string()
    } else {
        return Err(ParseError::malformed(
            text,
            format!("unexpected text after egg name: {rest:?}"),
        ));
    };

    Ok(Declaration {
        package: canonical_name(name),
        location,
        specifiers: String::new(),
        marker,
        extras: Vec::new(),
        comment,
    })
}

/// Render a requirements file, one declaration per line.
pub fn to_content<'a, I>(decls: I, marker_sep: char, with_header: bool) -> String
where
    I: IntoIterator<Item = &'a Declaration>,
{
    let mut out = String::new();
    if with_header {
        for line in REQS_HEADER {
            out.push_str(line);
            out.push('\n');
        }
    }
    for decl in decls {
        out.push_str(&decl.to_line(marker_sep));
        out.push('\n');
    }
    out
}
