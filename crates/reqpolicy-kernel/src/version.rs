//! Version tokens.
//!
//! Two independent views of a version string live here:
//!
//! - [`Version`]: the structured, totally ordered form used by specifier
//!   containment. Epoch, dotted release, pre-release (`a`/`b`/`rc`),
//!   post-release, dev-release, and local label.
//! - [`increase_version`] / [`decrease_version`]: plain text arithmetic on
//!   the rightmost integer segment, used to probe whether two ranges
//!   overlap across a strict bound.

use crate::error::VersionError;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Pre-release phase, ordered alpha < beta < release candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LocalSegment {
    Alpha(String),
    Num(u64),
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha(s) => write!(f, "{s}"),
            Self::Num(n) => write!(f, "{n}"),
        }
    }
}

/// Where the pre-release component places a version relative to its
/// final release. Variant order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PhaseKey {
    DevOnly,
    Pre(PreKind, u64),
    Final,
}

/// A parsed version token.
///
/// Equality follows ordering: `1.0` and `1.0.0` are equal.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreKind, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    local: Option<Vec<LocalSegment>>,
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)^\s*v?
            (?:(?P<epoch>[0-9]+)!)?
            (?P<release>[0-9]+(?:\.[0-9]+)*)
            (?P<pre>[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
            (?P<post>(?:-(?P<post_n1>[0-9]+))|(?:[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?))?
            (?P<dev>[-_.]?dev[-_.]?(?P<dev_n>[0-9]+)?)?
            (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
            \s*$",
        )
        .expect("version regex must compile")
    })
}

fn parse_number(text: &str, source: &str) -> Result<u64, VersionError> {
    text.parse::<u64>()
        .map_err(|_| VersionError(source.to_string()))
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = version_re()
            .captures(s)
            .ok_or_else(|| VersionError(s.to_string()))?;

        let epoch = match caps.name("epoch") {
            Some(m) => parse_number(m.as_str(), s)?,
            None => 0,
        };
        let release = caps["release"]
            .split('.')
            .map(|part| parse_number(part, s))
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => {
                let kind = match label.as_str().to_ascii_lowercase().as_str() {
                    "a" | "alpha" => PreKind::Alpha,
                    "b" | "beta" => PreKind::Beta,
                    _ => PreKind::Rc,
                };
                let n = match caps.name("pre_n") {
                    Some(m) => parse_number(m.as_str(), s)?,
                    None => 0,
                };
                Some((kind, n))
            }
            None => None,
        };

        let post = if caps.name("post").is_some() {
            match caps.name("post_n1").or_else(|| caps.name("post_n2")) {
                Some(m) => Some(parse_number(m.as_str(), s)?),
                None => Some(0),
            }
        } else {
            None
        };

        let dev = if caps.name("dev").is_some() {
            match caps.name("dev_n") {
                Some(m) => Some(parse_number(m.as_str(), s)?),
                None => Some(0),
            }
        } else {
            None
        };

        let local = caps.name("local").map(|m| {
            m.as_str()
                .split(['-', '_', '.'])
                .map(|seg| match seg.parse::<u64>() {
                    Ok(n) if seg.bytes().all(|b| b.is_ascii_digit()) => LocalSegment::Num(n),
                    _ => LocalSegment::Alpha(seg.to_ascii_lowercase()),
                })
                .collect()
        });

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }
}

fn trimmed_release(release: &[u64]) -> &[u64] {
    let end = release
        .iter()
        .rposition(|&n| n != 0)
        .map_or(0, |idx| idx + 1);
    &release[..end]
}

impl Version {
    /// Pre-releases and dev-releases both count as pre-releases.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    pub fn has_local(&self) -> bool {
        self.local.is_some()
    }

    /// The same version with any `+local` label removed.
    pub fn public(&self) -> Self {
        Self {
            local: None,
            ..self.clone()
        }
    }

    /// True when epoch and release segments agree, ignoring every suffix.
    pub fn same_base(&self, other: &Self) -> bool {
        self.epoch == other.epoch
            && trimmed_release(&self.release) == trimmed_release(&other.release)
    }

    fn phase_key(&self) -> PhaseKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PhaseKey::DevOnly,
            (Some((kind, n)), _, _) => PhaseKey::Pre(kind, n),
            (None, _, _) => PhaseKey::Final,
        }
    }

    fn dev_key(&self) -> (bool, u64) {
        match self.dev {
            Some(n) => (false, n),
            None => (true, 0),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| trimmed_release(&self.release).cmp(trimmed_release(&other.release)))
            .then_with(|| self.phase_key().cmp(&other.phase_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{n}", kind.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if let Some(local) = &self.local {
            let parts: Vec<String> = local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", parts.join("."))?;
        }
        Ok(())
    }
}

fn integer_segment(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Bump the rightmost integer-like dot segment: `1.2.3` → `1.2.4`.
///
/// Tokens without any integer segment are returned unchanged.
pub fn increase_version(version: &str) -> String {
    let mut items: Vec<String> = version.split('.').map(str::to_string).collect();
    for item in items.iter_mut().rev() {
        if let Some(n) = integer_segment(item) {
            *item = n.saturating_add(1).to_string();
            break;
        }
    }
    items.join(".")
}

/// Step the rightmost integer-like dot segment down, borrowing leftward.
///
/// `1.2.0` → `1.1.9`, `1.0` → `0.9`. A token whose integer segments are
/// all zero has nothing to borrow from and is returned unchanged.
pub fn decrease_version(version: &str) -> String {
    let mut items: Vec<String> = version.split('.').map(str::to_string).collect();
    for idx in (0..items.len()).rev() {
        let Some(n) = integer_segment(&items[idx]) else {
            continue;
        };
        if n > 0 {
            items[idx] = (n - 1).to_string();
            return items.join(".");
        }
        items[idx] = "9".to_string();
    }
    version.to_string()
}

/// The nearest version a clause admits: strict bounds are stepped inward.
pub fn version_required(op: &str, version: &str) -> String {
    match op {
        ">" => increase_version(version),
        "<" => decrease_version(version),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn trailing_zeros_compare_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0.1") > v("1.0"));
        assert!(v("1.10") > v("1.9"));
    }

    #[test]
    fn suffix_ordering_around_a_release() {
        let ordered = [
            "1.0.dev0",
            "1.0a1",
            "1.0a2.dev1",
            "1.0a2",
            "1.0b1",
            "1.0rc1",
            "1.0",
            "1.0.post1.dev3",
            "1.0.post1",
            "1.0.post2",
            "1.1.dev1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn alternate_spellings_normalize() {
        assert_eq!(v("1.0alpha1"), v("1.0a1"));
        assert_eq!(v("1.0-rc.2"), v("1.0rc2"));
        assert_eq!(v("1.0c3"), v("1.0rc3"));
        assert_eq!(v("1.0-1"), v("1.0.post1"));
        assert_eq!(v("V2.0"), v("2.0"));
        assert_eq!(v("1!2.0").to_string(), "1!2.0");
        assert_eq!(v("1.0RC1").to_string(), "1.0rc1");
    }

    #[test]
    fn epoch_dominates_release() {
        assert!(v("1!0.1") > v("9.9"));
    }

    #[test]
    fn local_labels_sort_after_public() {
        assert!(v("1.0+abc") > v("1.0"));
        assert!(v("1.0+5") > v("1.0+abc"));
        assert!(!v("1.0+5").public().has_local());
    }

    #[test]
    fn classification() {
        assert!(v("2.0b1").is_prerelease());
        assert!(v("2.0.dev4").is_prerelease());
        assert!(!v("2.0.post1").is_prerelease());
        assert!(v("2.0.post1").is_postrelease());
        assert!(v("2.0.post1").same_base(&v("2.0")));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("latest".parse::<Version>().is_err());
        assert!("1.0.*".parse::<Version>().is_err());
    }

    #[test]
    fn increase_bumps_rightmost_integer() {
        assert_eq!(increase_version("1.2.3"), "1.2.4");
        assert_eq!(increase_version("1.9"), "1.10");
        assert_eq!(increase_version("2"), "3");
        assert_eq!(increase_version("1.0.b1"), "1.1.b1");
    }

    #[test]
    fn decrease_borrows_leftward() {
        assert_eq!(decrease_version("1.2.3"), "1.2.2");
        assert_eq!(decrease_version("1.2.0"), "1.1.9");
        assert_eq!(decrease_version("1.0"), "0.9");
        assert_eq!(decrease_version("2.0.0"), "1.9.9");
        assert_eq!(decrease_version("0.0"), "0.0");
    }

    #[test]
    fn required_version_steps_strict_bounds() {
        assert_eq!(version_required(">", "1.5"), "1.6");
        assert_eq!(version_required("<", "2.0"), "1.9");
        assert_eq!(version_required(">=", "1.5"), "1.5");
    }
}
