//! The resolved dependency graph: one selected version per project, plus
//! the dependency edges between them.

use std::collections::{BTreeMap, BTreeSet};

use crate::dependency::{ProjectId, SelectedVersion};
use crate::error::Error;
use crate::identity::{Metadata, ProjectKey};
use crate::requirement::Requirement;

#[derive(Debug, Clone)]
struct Node<M: Metadata> {
    selected: SelectedVersion<M>,
    requirement: Requirement,
}

/// A consistent assignment of one selected version to each of a set of
/// projects, together with the dependency edges between them.
///
/// Every public mutation preserves: every node's selection satisfies its
/// recorded requirement; every edge endpoint is a node; the edge relation
/// is acyclic; and projects are unique.
///
/// Cloning is cheap relative to a full re-resolution and is how the
/// resolver's backtracking search (`resolver.rs`) tries a candidate
/// without committing to it.
#[derive(Debug, Clone)]
pub struct ResolvedDependencyGraph<P: ProjectKey, M: Metadata> {
    nodes: BTreeMap<ProjectId<P>, Node<M>>,
    edges: BTreeMap<ProjectId<P>, BTreeSet<ProjectId<P>>>,
}

impl<P: ProjectKey, M: Metadata> Default for ResolvedDependencyGraph<P, M> {
    fn default() -> Self {
        ResolvedDependencyGraph {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }
}

impl<P: ProjectKey, M: Metadata> ResolvedDependencyGraph<P, M> {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over every project in the graph, in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &ProjectId<P>> {
        self.nodes.keys()
    }

    /// The version selected for `project`, if it is in the graph.
    pub fn project_version(&self, project: &ProjectId<P>) -> Option<&SelectedVersion<M>> {
        self.nodes.get(project).map(|n| &n.selected)
    }

    /// The effective requirement accumulated for `project`, if it is in
    /// the graph.
    pub fn project_requirement(&self, project: &ProjectId<P>) -> Option<&Requirement> {
        self.nodes.get(project).map(|n| &n.requirement)
    }

    /// The selected version and accumulated requirement for `project`
    /// together, if it is in the graph. A node's selection and
    /// requirement are always populated together by the same internal
    /// upsert, so callers that need both avoid re-stating that invariant
    /// with two separate lookups.
    pub fn node(&self, project: &ProjectId<P>) -> Option<(&SelectedVersion<M>, &Requirement)> {
        self.nodes.get(project).map(|n| (&n.selected, &n.requirement))
    }

    /// The immediate dependencies of `project`, in ascending order. Empty
    /// if `project` has no recorded edges or is not in the graph.
    pub fn dependencies_of(&self, project: &ProjectId<P>) -> Vec<&ProjectId<P>> {
        self.edges
            .get(project)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Adds or tightens a root node: one with no required incoming edge.
    /// If `project` already has a node, the existing and new requirements
    /// are intersected and the existing selection must still satisfy the
    /// tightened requirement.
    pub fn add_root(
        &mut self,
        project: ProjectId<P>,
        selected: SelectedVersion<M>,
        requirement: Requirement,
    ) -> Result<(), Error> {
        self.upsert_node(project, selected, requirement)
    }

    /// Adds an edge from `dependent` to `resolved`'s project, inserting a
    /// node for it (via the same intersection rule as [`add_root`]) if
    /// absent. `dependent` must already be a node in the graph.
    pub fn add_edge(
        &mut self,
        dependent: &ProjectId<P>,
        project: ProjectId<P>,
        selected: SelectedVersion<M>,
        requirement: Requirement,
    ) -> Result<(), Error> {
        if !self.nodes.contains_key(dependent) {
            return Err(Error::InternalError(format!(
                "cannot add edge from unknown node {dependent}"
            )));
        }

        self.upsert_node(project.clone(), selected, requirement)?;
        self.edges.entry(dependent.clone()).or_default().insert(project);
        Ok(())
    }

    fn upsert_node(
        &mut self,
        project: ProjectId<P>,
        selected: SelectedVersion<M>,
        requirement: Requirement,
    ) -> Result<(), Error> {
        match self.nodes.get(&project) {
            None => {
                if !requirement.satisfied_by(selected.version()) {
                    return Err(Error::ConflictingNode(format!(
                        "selected version for {project} does not satisfy {requirement}"
                    )));
                }
                self.nodes.insert(project, Node { selected, requirement });
                Ok(())
            }
            Some(existing) => {
                let combined = existing
                    .requirement
                    .intersect(&requirement)
                    .ok_or_else(|| {
                        Error::MutuallyExclusiveConstraints(format!(
                            "{} and {} for {project}",
                            existing.requirement, requirement
                        ))
                    })?;

                let effective_selected = if existing.selected == selected {
                    selected
                } else if combined.satisfied_by(existing.selected.version()) {
                    existing.selected.clone()
                } else {
                    return Err(Error::ConflictingNode(format!(
                        "{project} already selected at a version incompatible with {combined}"
                    )));
                };

                if !combined.satisfied_by(effective_selected.version()) {
                    return Err(Error::UnsatisfiableConstraints(format!(
                        "{project} selection does not satisfy {combined}"
                    )));
                }

                self.nodes.insert(
                    project,
                    Node {
                        selected: effective_selected,
                        requirement: combined,
                    },
                );
                Ok(())
            }
        }
    }

    /// Returns a new graph containing exactly the nodes reachable from
    /// `roots` (inclusive), with edges restricted to that subset.
    pub fn subgraph_rooted_at(&self, roots: &[ProjectId<P>]) -> ResolvedDependencyGraph<P, M> {
        let mut result = ResolvedDependencyGraph::new();
        let mut visited: BTreeSet<ProjectId<P>> = BTreeSet::new();
        let mut stack: Vec<ProjectId<P>> = roots.to_vec();

        while let Some(project) = stack.pop() {
            if visited.contains(&project) {
                continue;
            }
            let Some(node) = self.nodes.get(&project) else {
                continue;
            };
            visited.insert(project.clone());
            result.nodes.insert(
                project.clone(),
                Node {
                    selected: node.selected.clone(),
                    requirement: node.requirement.clone(),
                },
            );

            if let Some(children) = self.edges.get(&project) {
                result.edges.insert(project.clone(), children.clone());
                for child in children {
                    stack.push(child.clone());
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SemanticVersion;

    fn sv(s: &str) -> SelectedVersion<()> {
        SelectedVersion::new(SemanticVersion::parse(s).unwrap(), ())
    }

    #[test]
    fn add_root_then_add_edge_builds_reachable_graph() {
        let mut graph: ResolvedDependencyGraph<String, ()> = ResolvedDependencyGraph::new();
        let root = ProjectId::new("root".to_string());
        let dep = ProjectId::new("dep".to_string());

        graph
            .add_root(root.clone(), sv("1.0.0"), Requirement::Any)
            .unwrap();
        graph
            .add_edge(&root, dep.clone(), sv("2.0.0"), Requirement::Any)
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.dependencies_of(&root), vec![&dep]);
    }

    #[test]
    fn subgraph_rooted_at_restricts_to_reachable_nodes() {
        let mut graph: ResolvedDependencyGraph<String, ()> = ResolvedDependencyGraph::new();
        let a = ProjectId::new("a".to_string());
        let b = ProjectId::new("b".to_string());
        let c = ProjectId::new("c".to_string());

        graph.add_root(a.clone(), sv("1.0.0"), Requirement::Any).unwrap();
        graph.add_edge(&a, b.clone(), sv("1.0.0"), Requirement::Any).unwrap();
        graph.add_root(c.clone(), sv("1.0.0"), Requirement::Any).unwrap();

        let sub = graph.subgraph_rooted_at(&[a.clone()]);
        assert_eq!(sub.len(), 2);
        assert!(sub.project_version(&c).is_none());
    }

    #[test]
    fn conflicting_requirements_are_rejected() {
        let mut graph: ResolvedDependencyGraph<String, ()> = ResolvedDependencyGraph::new();
        let p = ProjectId::new("p".to_string());
        graph
            .add_root(
                p.clone(),
                sv("1.0.0"),
                Requirement::Exactly(SemanticVersion::parse("1.0.0").unwrap()),
            )
            .unwrap();

        let result = graph.add_root(
            p,
            sv("1.0.0"),
            Requirement::Exactly(SemanticVersion::parse("2.0.0").unwrap()),
        );
        assert!(result.is_err());
    }
}
