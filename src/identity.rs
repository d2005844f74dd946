//! Marker traits standing in for caller-supplied identity tokens.
//!
//! The resolver never interprets a project identifier or a version's
//! metadata beyond what these traits promise. Any type satisfying the
//! bounds below can be plugged in without the core knowing anything
//! about its internal representation.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Identifies a project. Must support a strict weak ordering so that
/// worklists and installer phases can be sorted deterministically.
pub trait ProjectKey: Clone + Eq + Ord + Hash + Debug + Display {}

impl<T> ProjectKey for T where T: Clone + Eq + Ord + Hash + Debug + Display {}

/// Opaque per-version data a caller wants carried alongside a
/// [`SemanticVersion`](crate::version::SemanticVersion), e.g. a commit
/// hash or a registry source id.
pub trait Metadata: Clone + Eq + Hash + Debug {}

impl<T> Metadata for T where T: Clone + Eq + Hash + Debug {}
