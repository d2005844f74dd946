//! The requirement lattice: predicates over [`SemanticVersion`] and
//! their pairwise intersection.

use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::version::SemanticVersion;

/// Controls whether [`Requirement::CompatibleWith`] treats a patch-version
/// bump as compatible for `0.y.z` releases.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Strictness {
    /// Patch versions must match exactly for `0.y.z` bases.
    Strict,
    /// Patch versions may vary for `0.y.z` bases, as for any other major.
    AllowVersionZeroPatches,
}

fn strictest(a: Strictness, b: Strictness) -> Strictness {
    match a {
        Strictness::Strict => Strictness::Strict,
        Strictness::AllowVersionZeroPatches => b,
    }
}

/// A predicate over [`SemanticVersion`]s.
#[derive(Clone, Debug)]
pub enum Requirement {
    /// Satisfied by every version.
    Any,
    /// Satisfied by versions with precedence greater than or equal to the given version.
    AtLeast(SemanticVersion),
    /// Satisfied by versions "compatible with" the given base version, per [`Strictness`].
    CompatibleWith(SemanticVersion, Strictness),
    /// Satisfied only by a version identical (including prerelease and build metadata) to the given version.
    Exactly(SemanticVersion),
    /// Satisfied iff every member requirement is satisfied.
    Compound(Vec<Requirement>),
}

impl Requirement {
    /// Whether `version` satisfies this requirement.
    pub fn satisfied_by(&self, version: &SemanticVersion) -> bool {
        match self {
            Requirement::Any => true,
            Requirement::AtLeast(min) => version >= min,
            Requirement::CompatibleWith(base, strictness) => {
                compatible_with(base, *strictness, version)
            }
            Requirement::Exactly(exact) => version == exact,
            Requirement::Compound(members) => members.iter().all(|r| r.satisfied_by(version)),
        }
    }

    /// Whether this requirement, taken alone, explicitly names a
    /// prerelease of the exact `(major, minor, patch)` it pins or bounds.
    /// Used by the resolver to decide whether prerelease candidates are
    /// in-scope for a given requirement (§4.G: prereleases are opt-in).
    pub fn allows_prerelease_of(&self, core: (u64, u64, u64)) -> bool {
        match self {
            Requirement::Any => false,
            Requirement::AtLeast(v) | Requirement::CompatibleWith(v, _) | Requirement::Exactly(v) => {
                v.is_prerelease() && v.core() == core
            }
            Requirement::Compound(members) => members.iter().any(|r| r.allows_prerelease_of(core)),
        }
    }

    /// Computes the tightest requirement whose satisfying set is the
    /// intersection of `self` and `other`'s satisfying sets, or `None` if
    /// the two are mutually exclusive.
    pub fn intersect(&self, other: &Requirement) -> Option<Requirement> {
        use Requirement::*;

        match (self, other) {
            (Any, r) | (r, Any) => Some(r.clone()),

            (Exactly(v), r) | (r, Exactly(v)) => {
                if r.satisfied_by(v) {
                    Some(Exactly(v.clone()))
                } else {
                    None
                }
            }

            (AtLeast(a), AtLeast(b)) => Some(AtLeast(if a >= b { a.clone() } else { b.clone() })),

            (AtLeast(min), CompatibleWith(base, strictness))
            | (CompatibleWith(base, strictness), AtLeast(min)) => {
                if AtLeast(min.clone()).satisfied_by(base) {
                    Some(CompatibleWith(base.clone(), *strictness))
                } else if (CompatibleWith(base.clone(), *strictness)).satisfied_by(min) {
                    Some(CompatibleWith(min.clone(), *strictness))
                } else {
                    None
                }
            }

            (CompatibleWith(a, s1), CompatibleWith(b, s2)) => {
                let joined = strictest(*s1, *s2);
                if (CompatibleWith(a.clone(), *s1)).satisfied_by(b) {
                    Some(CompatibleWith(b.clone(), joined))
                } else if (CompatibleWith(b.clone(), *s2)).satisfied_by(a) {
                    Some(CompatibleWith(a.clone(), joined))
                } else {
                    None
                }
            }

            (Compound(members), r) | (r, Compound(members)) => {
                let mut flattened = members.clone();
                match r {
                    Compound(other_members) => flattened.extend(other_members.clone()),
                    other => flattened.push(other.clone()),
                }
                Some(Compound(flattened))
            }
        }
    }
}

fn compatible_with(base: &SemanticVersion, strictness: Strictness, version: &SemanticVersion) -> bool {
    if version.major() != base.major() {
        return false;
    }

    if base.major() == 0 {
        if version.minor() != base.minor() {
            return false;
        }
        if strictness == Strictness::Strict && version.patch() != base.patch() {
            return false;
        }
    }

    version >= base
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Any => write!(f, "*"),
            Requirement::AtLeast(v) => write!(f, ">={v}"),
            Requirement::CompatibleWith(v, _) => write!(f, "~>{v}"),
            Requirement::Exactly(v) => write!(f, "=={v}"),
            Requirement::Compound(members) => {
                write!(f, "{{ ")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " && ")?;
                    }
                    write!(f, "{m}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// Structural equality. `Compound` members compare as a multiset: order
/// does not matter, but multiplicity does.
impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        use Requirement::*;
        match (self, other) {
            (Any, Any) => true,
            (AtLeast(a), AtLeast(b)) => a == b,
            (CompatibleWith(a, sa), CompatibleWith(b, sb)) => a == b && sa == sb,
            (Exactly(a), Exactly(b)) => a == b,
            (Compound(a), Compound(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut a_sorted: Vec<String> = a.iter().map(|r| format!("{r:?}")).collect();
                let mut b_sorted: Vec<String> = b.iter().map(|r| format!("{r:?}")).collect();
                a_sorted.sort();
                b_sorted.sort();
                a_sorted == b_sorted
            }
            _ => false,
        }
    }
}

impl Eq for Requirement {}

/// Order-independent hash, consistent with the multiset `Eq` above:
/// member hashes are combined with `wrapping_add` rather than XOR, since
/// XOR cancels when an even number of equal hashes combine.
impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Requirement::Any => 0u8.hash(state),
            Requirement::AtLeast(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            Requirement::CompatibleWith(v, s) => {
                2u8.hash(state);
                v.hash(state);
                s.hash(state);
            }
            Requirement::Exactly(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            Requirement::Compound(members) => {
                4u8.hash(state);
                let mut combined: u64 = 0;
                for member in members {
                    let mut hasher = std::collections::hash_map::DefaultHasher::new();
                    member.hash(&mut hasher);
                    combined = combined.wrapping_add(hasher.finish());
                }
                combined.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn any_is_identity_for_intersect() {
        let r = Requirement::AtLeast(v("1.0.0"));
        assert_eq!(Requirement::Any.intersect(&r), Some(r.clone()));
        assert_eq!(r.intersect(&Requirement::Any), Some(r));
    }

    #[test]
    fn at_least_intersect_picks_the_max() {
        let a = Requirement::AtLeast(v("1.0.0"));
        let b = Requirement::AtLeast(v("2.0.0"));
        assert_eq!(a.intersect(&b), Some(Requirement::AtLeast(v("2.0.0"))));
    }

    #[test]
    fn exactly_intersect_requires_satisfaction() {
        let exact = Requirement::Exactly(v("1.2.3"));
        let at_least = Requirement::AtLeast(v("1.0.0"));
        assert_eq!(exact.intersect(&at_least), Some(exact.clone()));

        let too_low = Requirement::AtLeast(v("2.0.0"));
        assert_eq!(exact.intersect(&too_low), None);
    }

    #[test]
    fn compatible_with_zero_major_requires_minor_match() {
        let req = Requirement::CompatibleWith(v("0.2.0"), Strictness::Strict);
        assert!(req.satisfied_by(&v("0.2.5")));
        assert!(!req.satisfied_by(&v("0.3.0")));
        assert!(!req.satisfied_by(&v("0.2.1")));
    }

    #[test]
    fn compatible_with_allow_zero_patches_permits_patch_drift() {
        let req = Requirement::CompatibleWith(v("0.2.0"), Strictness::AllowVersionZeroPatches);
        assert!(req.satisfied_by(&v("0.2.9")));
    }

    #[rstest]
    #[case("1.0.0", "2.0.0")]
    #[case("1.5.0", "1.9.0")]
    fn compatible_with_intersect_is_commutative(#[case] a: &str, #[case] b: &str) {
        let ra = Requirement::CompatibleWith(v(a), Strictness::Strict);
        let rb = Requirement::CompatibleWith(v(b), Strictness::Strict);
        assert_eq!(ra.intersect(&rb), rb.intersect(&ra));
    }

    #[test]
    fn compound_equality_ignores_member_order() {
        let a = Requirement::Compound(vec![
            Requirement::AtLeast(v("1.0.0")),
            Requirement::Exactly(v("1.5.0")),
        ]);
        let b = Requirement::Compound(vec![
            Requirement::Exactly(v("1.5.0")),
            Requirement::AtLeast(v("1.0.0")),
        ]);
        assert_eq!(a, b);
    }
}
