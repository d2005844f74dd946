//! The project/version/dependency vocabulary the resolver and graph
//! operate over.

use std::fmt::{self, Display, Formatter};

use crate::identity::{Metadata, ProjectKey};
use crate::requirement::Requirement;
use crate::version::SemanticVersion;

/// Identifies a project by wrapping a caller-supplied key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProjectId<P: ProjectKey>(P);

impl<P: ProjectKey> ProjectId<P> {
    /// Wrap a caller-supplied project key.
    pub fn new(key: P) -> Self {
        ProjectId(key)
    }

    /// The wrapped key.
    pub fn key(&self) -> &P {
        &self.0
    }
}

impl<P: ProjectKey> PartialOrd for ProjectId<P> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: ProjectKey> Ord for ProjectId<P> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<P: ProjectKey> Display for ProjectId<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete version of a project: a SemVer number plus whatever
/// caller-supplied metadata identifies exactly which artifact it is.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SelectedVersion<M: Metadata> {
    version: SemanticVersion,
    metadata: M,
}

impl<M: Metadata> SelectedVersion<M> {
    /// Pair a SemVer version with its metadata.
    pub fn new(version: SemanticVersion, metadata: M) -> Self {
        SelectedVersion { version, metadata }
    }

    /// The SemVer version.
    pub fn version(&self) -> &SemanticVersion {
        &self.version
    }

    /// The caller-supplied metadata.
    pub fn metadata(&self) -> &M {
        &self.metadata
    }
}

impl<M: Metadata> Display for SelectedVersion<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

/// A dependency on a project, constrained by a requirement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Dependency<P: ProjectKey> {
    project: ProjectId<P>,
    requirement: Requirement,
}

impl<P: ProjectKey> Dependency<P> {
    /// Create a dependency on `project`, constrained by `requirement`.
    pub fn new(project: ProjectId<P>, requirement: Requirement) -> Self {
        Dependency {
            project,
            requirement,
        }
    }

    /// The depended-upon project.
    pub fn project(&self) -> &ProjectId<P> {
        &self.project
    }

    /// The requirement constraining the dependency.
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

impl<P: ProjectKey> Display for Dependency<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.project, self.requirement)
    }
}

/// A project paired with the version that was ultimately selected for it.
#[derive(Clone, Debug)]
pub struct ResolvedDependency<P: ProjectKey, M: Metadata> {
    project: ProjectId<P>,
    selected: SelectedVersion<M>,
}

impl<P: ProjectKey, M: Metadata> ResolvedDependency<P, M> {
    /// Pair a project with its selected version.
    pub fn new(project: ProjectId<P>, selected: SelectedVersion<M>) -> Self {
        ResolvedDependency { project, selected }
    }

    /// The project.
    pub fn project(&self) -> &ProjectId<P> {
        &self.project
    }

    /// The version selected for the project.
    pub fn selected(&self) -> &SelectedVersion<M> {
        &self.selected
    }
}

impl<P: ProjectKey, M: Metadata> Display for ResolvedDependency<P, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.project, self.selected)
    }
}
