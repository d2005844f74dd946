//! Topological layering of a resolved graph into phases where every
//! project in a phase has no dependency on another project in that same
//! phase.

use std::collections::{BTreeSet, HashSet};

use crate::dependency::{ProjectId, ResolvedDependency};
use crate::error::Error;
use crate::graph::ResolvedDependencyGraph;
use crate::identity::{Metadata, ProjectKey};

/// An ordered partitioning of a resolved graph's projects into
/// installation phases. Phase 0 contains every leaf (no dependencies);
/// phase `k+1` contains every not-yet-placed project whose dependencies
/// are all in phases `0..=k`.
#[derive(Debug)]
pub struct Installer<P: ProjectKey, M: Metadata> {
    phases: Vec<Vec<ResolvedDependency<P, M>>>,
}

impl<P: ProjectKey, M: Metadata> Installer<P, M> {
    /// Computes the phase layering of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InternalError`] if a node can never be placed,
    /// which indicates the graph was not actually acyclic (a broken
    /// invariant of [`ResolvedDependencyGraph`], not something a correct
    /// caller can trigger).
    pub fn new(graph: &ResolvedDependencyGraph<P, M>) -> Result<Self, Error> {
        let mut remaining: BTreeSet<ProjectId<P>> = graph.nodes().cloned().collect();
        let mut placed: HashSet<ProjectId<P>> = HashSet::new();
        let mut phases = Vec::new();

        while !remaining.is_empty() {
            let mut phase_projects: Vec<ProjectId<P>> = remaining
                .iter()
                .filter(|project| {
                    graph
                        .dependencies_of(project)
                        .into_iter()
                        .all(|dep| placed.contains(dep))
                })
                .cloned()
                .collect();

            if phase_projects.is_empty() {
                return Err(Error::InternalError(
                    "resolved graph contains a cycle or a dangling edge; cannot layer into phases"
                        .to_string(),
                ));
            }

            phase_projects.sort();

            let mut phase = Vec::with_capacity(phase_projects.len());
            for project in &phase_projects {
                let selected = graph
                    .project_version(project)
                    .ok_or_else(|| {
                        Error::InternalError(format!("node {project} has no selected version"))
                    })?
                    .clone();
                phase.push(ResolvedDependency::new(project.clone(), selected));
                remaining.remove(project);
                placed.insert(project.clone());
            }

            phases.push(phase);
        }

        Ok(Installer { phases })
    }

    /// The number of phases.
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// The projects (with their selected versions) in phase `index`, in
    /// ascending project order. Empty if `index` is out of range.
    pub fn phase(&self, index: usize) -> &[ResolvedDependency<P, M>] {
        self.phases.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over every phase in order.
    pub fn phases(&self) -> impl Iterator<Item = &[ResolvedDependency<P, M>]> {
        self.phases.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::SelectedVersion;
    use crate::requirement::Requirement;
    use crate::version::SemanticVersion;

    fn sv(s: &str) -> SelectedVersion<()> {
        SelectedVersion::new(SemanticVersion::parse(s).unwrap(), ())
    }

    #[test]
    fn leaves_land_in_phase_zero() {
        let mut graph: ResolvedDependencyGraph<String, ()> = ResolvedDependencyGraph::new();
        let root = ProjectId::new("root".to_string());
        let leaf = ProjectId::new("leaf".to_string());

        graph.add_root(root.clone(), sv("1.0.0"), Requirement::Any).unwrap();
        graph
            .add_edge(&root, leaf.clone(), sv("1.0.0"), Requirement::Any)
            .unwrap();

        let installer = Installer::new(&graph).unwrap();
        assert_eq!(installer.phase_count(), 2);
        assert_eq!(installer.phase(0)[0].project(), &leaf);
        assert_eq!(installer.phase(1)[0].project(), &root);
    }

    #[test]
    fn independent_projects_share_a_phase() {
        let mut graph: ResolvedDependencyGraph<String, ()> = ResolvedDependencyGraph::new();
        let a = ProjectId::new("a".to_string());
        let b = ProjectId::new("b".to_string());

        graph.add_root(a.clone(), sv("1.0.0"), Requirement::Any).unwrap();
        graph.add_root(b.clone(), sv("1.0.0"), Requirement::Any).unwrap();

        let installer = Installer::new(&graph).unwrap();
        assert_eq!(installer.phase_count(), 1);
        assert_eq!(installer.phase(0).len(), 2);
    }

    #[test]
    fn empty_graph_has_no_phases() {
        let graph: ResolvedDependencyGraph<String, ()> = ResolvedDependencyGraph::new();
        let installer = Installer::new(&graph).unwrap();
        assert_eq!(installer.phase_count(), 0);
    }
}
