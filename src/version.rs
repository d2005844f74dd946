//! Semantic Versioning 2.0.0 version numbers: parsing, display, and
//! precedence ordering.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::Error;

/// A single dot-separated identifier within a prerelease or build
/// metadata string, distinguishing purely numeric identifiers (which
/// order numerically) from alphanumeric ones (which order lexically).
#[derive(Clone, Debug, Eq, PartialEq)]
enum Identifier {
    Numeric(u64),
    AlphaNumeric(String),
}

impl Identifier {
    fn parse(segment: &str) -> Result<Self, Error> {
        if segment.is_empty() {
            return Err(Error::ParseFailure(
                "identifier must not be empty".to_string(),
            ));
        }

        if segment.bytes().all(|b| b.is_ascii_digit()) {
            if segment.len() > 1 && segment.starts_with('0') {
                return Err(Error::ParseFailure(format!(
                    "numeric identifier must not have a leading zero: {segment}"
                )));
            }
            let value = segment.parse::<u64>().map_err(|_| {
                Error::ParseFailure(format!("numeric identifier out of range: {segment}"))
            })?;
            return Ok(Identifier::Numeric(value));
        }

        if !segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(Error::ParseFailure(format!(
                "identifier contains invalid characters: {segment}"
            )));
        }

        Ok(Identifier::AlphaNumeric(segment.to_string()))
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::AlphaNumeric(s) => write!(f, "{s}"),
        }
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::AlphaNumeric(a), Identifier::AlphaNumeric(b)) => a.cmp(b),
            // Numeric identifiers always have lower precedence than alphanumeric ones.
            (Identifier::Numeric(_), Identifier::AlphaNumeric(_)) => Ordering::Less,
            (Identifier::AlphaNumeric(_), Identifier::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A Semantic Versioning 2.0.0 version number.
///
/// Precedence (`Ord`, `PartialOrd`) follows semver.org §11 exactly and
/// ignores build metadata. `Eq`/`Hash` additionally compare build
/// metadata, so two versions can be `Ord`-equal (same precedence) while
/// not `Eq` (different build metadata). This divergence from the usual
/// `Eq`/`Ord`-consistency convention is deliberate: it lets callers ask
/// both "do these have the same precedence" and "are these the exact
/// same version" without two separate types.
#[derive(Clone, Debug)]
pub struct SemanticVersion {
    major: u64,
    minor: u64,
    patch: u64,
    prerelease: Vec<Identifier>,
    build_metadata: Option<String>,
}

impl SemanticVersion {
    /// Construct a version directly from its numeric components, an
    /// optional prerelease string, and optional build metadata.
    pub fn new(
        major: u64,
        minor: u64,
        patch: u64,
        prerelease: Option<&str>,
        build_metadata: Option<&str>,
    ) -> Result<Self, Error> {
        let prerelease = match prerelease {
            Some(s) => parse_identifiers(s)?,
            None => Vec::new(),
        };

        if let Some(meta) = build_metadata {
            validate_build_metadata(meta)?;
        }

        Ok(SemanticVersion {
            major,
            minor,
            patch,
            prerelease,
            build_metadata: build_metadata.map(str::to_string),
        })
    }

    /// Parse a version from its canonical textual form.
    pub fn parse(input: &str) -> Result<Self, Error> {
        if input.is_empty() {
            return Err(Error::ParseFailure("version string is empty".to_string()));
        }

        // Build metadata is introduced by the first '+' and extends to the
        // end of the string; it may itself contain no further '+' or '-'
        // delimiters that matter, since everything after the first '+' is
        // build metadata verbatim.
        let (rest, build_metadata) = match input.find('+') {
            Some(idx) => (&input[..idx], Some(&input[idx + 1..])),
            None => (input, None),
        };

        // Prerelease is introduced by the first '-' found after the three
        // numeric core components; splitting on the first '-' in `rest` is
        // correct because none of major/minor/patch may themselves contain
        // a '-'.
        let (core, prerelease) = match rest.find('-') {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };

        let mut parts = core.split('.');
        let major = parse_numeric_field(parts.next(), "major")?;
        let minor = parse_numeric_field(parts.next(), "minor")?;
        let patch = parse_numeric_field(parts.next(), "patch")?;
        if parts.next().is_some() {
            return Err(Error::ParseFailure(format!(
                "version core has too many components: {core}"
            )));
        }

        if let Some(meta) = build_metadata {
            validate_build_metadata(meta)?;
        }

        let prerelease = match prerelease {
            Some(s) => parse_identifiers(s)?,
            None => Vec::new(),
        };

        Ok(SemanticVersion {
            major,
            minor,
            patch,
            prerelease,
            build_metadata: build_metadata.map(str::to_string),
        })
    }

    /// The major version component.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// The minor version component.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// The patch version component.
    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Whether this version carries a prerelease tag.
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// The `(major, minor, patch)` triple as a tuple, with prerelease and
    /// build metadata stripped.
    pub fn core(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    fn prerelease_string(&self) -> Option<String> {
        if self.prerelease.is_empty() {
            None
        } else {
            Some(
                self.prerelease
                    .iter()
                    .map(Identifier::to_string)
                    .collect::<Vec<_>>()
                    .join("."),
            )
        }
    }
}

fn parse_numeric_field(field: Option<&str>, name: &str) -> Result<u64, Error> {
    let field = field.ok_or_else(|| Error::ParseFailure(format!("missing {name} component")))?;
    if field.is_empty() {
        return Err(Error::ParseFailure(format!("empty {name} component")));
    }
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ParseFailure(format!(
            "{name} component is not numeric: {field}"
        )));
    }
    if field.len() > 1 && field.starts_with('0') {
        return Err(Error::ParseFailure(format!(
            "{name} component has a leading zero: {field}"
        )));
    }
    field
        .parse::<u64>()
        .map_err(|_| Error::ParseFailure(format!("{name} component out of range: {field}")))
}

fn parse_identifiers(s: &str) -> Result<Vec<Identifier>, Error> {
    if s.is_empty() {
        return Err(Error::ParseFailure(
            "prerelease must not be empty".to_string(),
        ));
    }
    s.split('.').map(Identifier::parse).collect()
}

fn validate_build_metadata(meta: &str) -> Result<(), Error> {
    if meta.is_empty() {
        return Err(Error::ParseFailure(
            "build metadata must not be empty".to_string(),
        ));
    }
    for segment in meta.split('.') {
        if segment.is_empty()
            || !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(Error::ParseFailure(format!(
                "build metadata contains invalid characters: {meta}"
            )));
        }
    }
    Ok(())
}

impl FromStr for SemanticVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemanticVersion::parse(s)
    }
}

impl Display for SemanticVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = self.prerelease_string() {
            write!(f, "-{pre}")?;
        }
        if let Some(meta) = &self.build_metadata {
            write!(f, "+{meta}")?;
        }
        Ok(())
    }
}

/// Full identity comparison, including build metadata.
impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.prerelease == other.prerelease
            && self.build_metadata == other.build_metadata
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.prerelease.hash(state);
        self.build_metadata.hash(state);
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Identifier::Numeric(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Identifier::AlphaNumeric(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// Precedence ordering per semver.org §11. Build metadata is ignored.
impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                // A version with a prerelease has lower precedence.
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (true, true) => compare_prerelease(&self.prerelease, &other.prerelease),
            })
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_prerelease(a: &[Identifier], b: &[Identifier]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    // Shared prefix matched; fewer identifiers has lower precedence.
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0.0.0")]
    #[case("1.0.2")]
    #[case("12.345.6789")]
    #[case("1.0.2-alpha.1")]
    #[case("1.0.2+dailybuild")]
    #[case("1.0.2-alpha.1+dailybuild")]
    fn parses_valid_versions(#[case] input: &str) {
        assert!(SemanticVersion::parse(input).is_ok(), "{input}");
    }

    #[rstest]
    #[case("0")]
    #[case("1.0")]
    #[case("-1.0.0")]
    #[case("01.0.0")]
    #[case("1.0.0a1")]
    #[case("1.0.0-alpha.01")]
    #[case("1.0.0-alpha$1")]
    #[case("1.0.0+build$1")]
    fn rejects_invalid_versions(#[case] input: &str) {
        assert!(SemanticVersion::parse(input).is_err(), "{input}");
    }

    #[test]
    fn display_round_trips_canonical_form() {
        for input in [
            "0.0.0",
            "1.0.2",
            "12.345.6789",
            "1.0.2-alpha.1",
            "1.0.2+dailybuild",
            "1.0.2-alpha.1+dailybuild",
        ] {
            let version = SemanticVersion::parse(input).unwrap();
            assert_eq!(version.to_string(), input);
        }
    }

    #[test]
    fn prerelease_has_lower_precedence_than_release() {
        let release = SemanticVersion::parse("1.0.0").unwrap();
        let prerelease = SemanticVersion::parse("1.0.0-alpha").unwrap();
        assert!(prerelease < release);
    }

    #[test]
    fn prerelease_identifiers_compare_numerically_then_lexically() {
        let a = SemanticVersion::parse("1.0.0-alpha.1").unwrap();
        let b = SemanticVersion::parse("1.0.0-alpha.2").unwrap();
        assert!(a < b);

        let numeric = SemanticVersion::parse("1.0.0-1").unwrap();
        let alpha = SemanticVersion::parse("1.0.0-a").unwrap();
        assert!(numeric < alpha);
    }

    #[test]
    fn fewer_prerelease_identifiers_sort_first_on_shared_prefix() {
        let shorter = SemanticVersion::parse("1.0.0-alpha").unwrap();
        let longer = SemanticVersion::parse("1.0.0-alpha.1").unwrap();
        assert!(shorter < longer);
    }

    #[test]
    fn build_metadata_excluded_from_precedence_but_included_in_equality() {
        let a = SemanticVersion::parse("1.0.0+build1").unwrap();
        let b = SemanticVersion::parse("1.0.0+build2").unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_ne!(a, b);
    }
}
