//! Specifier algebra: version comparison clauses and sets of them.
//!
//! A specifier-set string is the canonical comma-joined, sorted clause list
//! stored on a [`Declaration`](crate::Declaration). The free functions at
//! the bottom operate on that string form directly because validators
//! compare clause *text*, not parsed ranges:
//!
//! - [`exclusions`]: clauses that narrow a range from its upper end.
//! - [`is_subset`]: syntactic inclusion of exclusions. This is a
//!   conservative approximation of semantic subset, not interval
//!   arithmetic; `<2.0` is not considered a subset of `<3.0`.
//! - [`has_floor`] / [`floor_version`]: the declared minimum.

use crate::error::ParseError;
use crate::version::Version;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `~=`
    Compatible,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `===`
    Arbitrary,
}

impl Operator {
    // Longest spelling first so `===` is not read as `==` + `=1.0`.
    const SPELLINGS: [(&'static str, Operator); 8] = [
        ("===", Operator::Arbitrary),
        ("~=", Operator::Compatible),
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("<=", Operator::LessEqual),
        (">=", Operator::GreaterEqual),
        ("<", Operator::Less),
        (">", Operator::Greater),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compatible => "~=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::Arbitrary => "===",
        }
    }

    /// Split a leading operator off `text`.
    pub fn strip_prefix(text: &str) -> Option<(Self, &str)> {
        Self::SPELLINGS
            .iter()
            .find_map(|(spelling, op)| text.strip_prefix(*spelling).map(|rest| (*op, rest)))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparison clause, e.g. `>=1.2`.
///
/// The version text is kept as written so canonical specifier strings
/// round-trip byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    op: Operator,
    version: String,
    parsed: Option<Version>,
    wildcard: bool,
}

impl FromStr for Specifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (op, rest) = Operator::strip_prefix(text)
            .ok_or_else(|| ParseError::malformed(text, "clause has no comparison operator"))?;
        let version = rest.trim();
        if version.is_empty() || version.chars().any(char::is_whitespace) {
            return Err(ParseError::malformed(text, "clause has no version"));
        }

        if op == Operator::Arbitrary {
            return Ok(Self {
                op,
                version: version.to_string(),
                parsed: version.parse().ok(),
                wildcard: false,
            });
        }

        let (core, wildcard) = match version.strip_suffix(".*") {
            Some(core) if matches!(op, Operator::Equal | Operator::NotEqual) => (core, true),
            Some(_) => {
                return Err(ParseError::malformed(
                    text,
                    format!("wildcard not allowed with {op}"),
                ));
            }
            None => (version, false),
        };
        let parsed: Version = core
            .parse()
            .map_err(|e| ParseError::malformed(text, format!("{e}")))?;
        if op == Operator::Compatible && parsed.release.len() < 2 {
            return Err(ParseError::malformed(
                text,
                "~= needs at least two release segments",
            ));
        }
        Ok(Self {
            op,
            version: version.to_string(),
            parsed: Some(parsed),
            wildcard,
        })
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

impl Specifier {
    pub fn operator(&self) -> Operator {
        self.op
    }

    /// The version text as written, including any `.*` suffix.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether this clause opts a set into accepting pre-releases.
    pub fn names_prerelease(&self) -> bool {
        matches!(
            self.op,
            Operator::Equal
                | Operator::GreaterEqual
                | Operator::LessEqual
                | Operator::Compatible
                | Operator::Arbitrary
        ) && self.parsed.as_ref().is_some_and(Version::is_prerelease)
    }

    /// Test one candidate. `candidate` is the parsed form of `text`, if any;
    /// only `===` can match a token that does not parse.
    pub fn contains(&self, text: &str, candidate: Option<&Version>) -> bool {
        match (self.op, candidate, self.parsed.as_ref()) {
            (Operator::Arbitrary, _, _) => text.trim().eq_ignore_ascii_case(&self.version),
            (_, Some(candidate), Some(spec)) => self.compare(candidate, spec),
            _ => false,
        }
    }

    fn compare(&self, candidate: &Version, spec: &Version) -> bool {
        match self.op {
            Operator::Equal => self.equal(candidate, spec),
            Operator::NotEqual => !self.equal(candidate, spec),
            Operator::LessEqual => candidate.public() <= *spec,
            Operator::GreaterEqual => candidate.public() >= *spec,
            Operator::Less => {
                let candidate = candidate.public();
                candidate < *spec
                    && !(candidate.is_prerelease()
                        && !spec.is_prerelease()
                        && candidate.same_base(spec))
            }
            Operator::Greater => {
                let public = candidate.public();
                public > *spec
                    && !(public.is_postrelease()
                        && !spec.is_postrelease()
                        && public.same_base(spec))
                    && !(candidate.has_local() && candidate.same_base(spec))
            }
            Operator::Compatible => {
                let mut prefix = spec.release.clone();
                prefix.pop();
                candidate.public() >= *spec
                    && release_prefix_matches(candidate, spec.epoch, &prefix)
            }
            Operator::Arbitrary => candidate == spec,
        }
    }

    fn equal(&self, candidate: &Version, spec: &Version) -> bool {
        if self.wildcard {
            return release_prefix_matches(candidate, spec.epoch, &spec.release);
        }
        if spec.has_local() {
            candidate == spec
        } else {
            candidate.public() == *spec
        }
    }
}

fn release_prefix_matches(candidate: &Version, epoch: u64, prefix: &[u64]) -> bool {
    if candidate.epoch != epoch {
        return false;
    }
    prefix
        .iter()
        .enumerate()
        .all(|(idx, want)| candidate.release.get(idx).copied().unwrap_or(0) == *want)
}

/// A parsed specifier-set; every clause must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierSet {
    clauses: Vec<Specifier>,
}

impl FromStr for SpecifierSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }
        let clauses = text
            .split(',')
            .map(|clause| {
                if clause.trim().is_empty() {
                    Err(ParseError::malformed(text, "empty clause"))
                } else {
                    clause.parse()
                }
            })
            .collect::<Result<Vec<Specifier>, _>>()?;
        Ok(Self { clauses })
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl SpecifierSet {
    pub fn clauses(&self) -> &[Specifier] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Sorted, de-duplicated, comma-joined clause text.
    pub fn canonical(&self) -> String {
        self.clauses
            .iter()
            .map(ToString::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Pre-releases are only admitted when some clause names one.
    pub fn allows_prereleases(&self) -> bool {
        self.clauses.iter().any(Specifier::names_prerelease)
    }

    /// Does `version` satisfy every clause? Pre-releases are rejected
    /// unless the set itself mentions a pre-release.
    pub fn contains(&self, version: &str) -> bool {
        self.contains_with(version, self.allows_prereleases())
    }

    /// Like [`contains`](Self::contains) with an explicit pre-release policy.
    pub fn contains_with(&self, version: &str, prereleases: bool) -> bool {
        let parsed = version.trim().parse::<Version>().ok();
        if !prereleases && parsed.as_ref().is_some_and(Version::is_prerelease) {
            return false;
        }
        self.clauses
            .iter()
            .all(|clause| clause.contains(version, parsed.as_ref()))
    }
}

/// Does `version` satisfy the specifier-set string? Unparseable sets never
/// contain anything.
pub fn contains(specifiers: &str, version: &str) -> bool {
    specifiers
        .parse::<SpecifierSet>()
        .is_ok_and(|set| set.contains(version))
}

fn clause_strings(specifiers: &str) -> impl Iterator<Item = &str> {
    specifiers
        .split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
}

/// Clauses using `!=` or `<` (including `<=`).
pub fn exclusions(specifiers: &str) -> BTreeSet<String> {
    clause_strings(specifiers)
        .filter(|clause| clause.contains("!=") || clause.contains('<'))
        .map(str::to_string)
        .collect()
}

/// True when every exclusion of `a` also appears in `b`.
pub fn is_subset(a: &str, b: &str) -> bool {
    exclusions(a).is_subset(&exclusions(b))
}

/// True when the set states a `>` or `>=` minimum.
pub fn has_floor(specifiers: &str) -> bool {
    clause_strings(specifiers).any(|clause| clause.contains('>'))
}

/// Version text of the first `>`/`>=` clause.
pub fn floor_version(specifiers: &str) -> Option<&str> {
    clause_strings(specifiers)
        .find(|clause| clause.contains('>'))
        .map(|clause| clause.trim_start_matches(['>', '=']))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(s: &str) -> SpecifierSet {
        s.parse().unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn canonical_order_is_input_independent() {
        assert_eq!(set(">=0.4.1,!=1.1.8").canonical(), "!=1.1.8,>=0.4.1");
        assert_eq!(set("!=1.1.8, >=0.4.1").canonical(), "!=1.1.8,>=0.4.1");
        assert_eq!(set(">=1.0,>=1.0").canonical(), ">=1.0");
    }

    #[test]
    fn range_containment() {
        let range = set(">=1.2,<2.0");
        assert!(range.contains("1.9"));
        assert!(range.contains("1.2"));
        assert!(!range.contains("2.0"));
        assert!(!range.contains("2.0.1"));
        assert!(!range.contains("1.1.9"));
    }

    #[test]
    fn empty_set_contains_any_final_release() {
        assert!(set("").contains("0.0.1"));
        assert!(!set("").contains("1.0rc1"));
    }

    #[test]
    fn prereleases_need_an_opt_in_clause() {
        assert!(!set(">=1.0").contains("2.0b1"));
        assert!(set(">=2.0b1").contains("2.0b2"));
        assert!(set(">=1.0").contains_with("2.0b1", true));
        assert!(!set("!=2.0b1").allows_prereleases());
    }

    #[test]
    fn strict_bounds_skip_suffixes_of_the_bound() {
        assert!(!set("<2.0").contains_with("2.0rc1", true));
        assert!(!set("<2.0rc2").contains("2.0rc1"));
        assert!(set("<2.0rc2").contains_with("2.0rc1", true));
        assert!(!set(">1.0").contains("1.0.post1"));
        assert!(set(">1.0.post1").contains("1.0.post2"));
        assert!(!set(">1.0").contains("1.0+local"));
        assert!(set(">1.0").contains("1.0.1"));
    }

    #[test]
    fn equality_forms() {
        assert!(set("==1.0").contains("1.0.0"));
        assert!(set("==1.0").contains("1.0+build5"));
        assert!(!set("==1.0+build4").contains("1.0+build5"));
        assert!(set("==1.4.*").contains("1.4.7"));
        assert!(!set("==1.4.*").contains("1.5"));
        assert!(!set("!=1.4.*").contains("1.4.2"));
        assert!(set("!=1.4.2").contains("1.4.3"));
    }

    #[test]
    fn compatible_release() {
        let compat = set("~=2.2");
        assert!(compat.contains("2.9"));
        assert!(!compat.contains("3.0"));
        let patch = set("~=1.4.5");
        assert!(patch.contains("1.4.9"));
        assert!(!patch.contains("1.5.0"));
        assert!(!patch.contains("1.4.4"));
        assert!("~=1".parse::<SpecifierSet>().is_err());
    }

    #[test]
    fn arbitrary_equality_is_textual() {
        assert!(set("===1.2.5").contains("1.2.5"));
        assert!(!set("===1.2.5").contains("1.2.5.0"));
        assert!(set("===foobar").contains("FooBar"));
    }

    #[test]
    fn malformed_clauses() {
        assert!(">=".parse::<SpecifierSet>().is_err());
        assert!("1.0".parse::<SpecifierSet>().is_err());
        assert!(">=1.0,".parse::<SpecifierSet>().is_err());
        assert!(">=1.*".parse::<SpecifierSet>().is_err());
    }

    #[test]
    fn exclusion_subset() {
        assert!(is_subset("<2.0", "<2.0,!=1.5"));
        assert!(!is_subset("<2.0,!=1.5", "<2.0"));
        assert!(is_subset(">=1.0", "!=1.5"));
        assert_eq!(
            exclusions("!=1.5,<=3.0,>=1.0").into_iter().collect::<Vec<_>>(),
            vec!["!=1.5".to_string(), "<=3.0".to_string()]
        );
    }

    #[test]
    fn floors() {
        assert!(has_floor("!=1.5,>=1.0"));
        assert!(has_floor(">1.0"));
        assert!(!has_floor("<2.0"));
        assert!(!has_floor(""));
        assert_eq!(floor_version("!=2.4,>=2.3.0"), Some("2.3.0"));
        assert_eq!(floor_version(">1.1"), Some("1.1"));
        assert_eq!(floor_version("<3"), None);
    }
}
