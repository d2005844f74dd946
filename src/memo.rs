//! Per-project memoization: cached version domains, cached dependency
//! lookups, and **instantiations** — equivalence classes of versions
//! that declare an identical dependency set, used to prune the search
//! once one member of the class is proven infeasible.

use std::collections::{HashMap, HashSet};

use crate::dependency::{Dependency, ProjectId, SelectedVersion};
use crate::error::Error;
use crate::fetch::Fetcher;
use crate::identity::{Metadata, ProjectKey};

/// An equivalence class of versions sharing one dependency set.
#[derive(Debug)]
pub(crate) struct Instantiation<M: Metadata> {
    dependencies_hash: u64,
    versions: Vec<SelectedVersion<M>>,
    infeasible: bool,
}

impl<M: Metadata> Instantiation<M> {
    /// Whether the search has already proven this instantiation cannot
    /// lead to a solution.
    pub(crate) fn is_infeasible(&self) -> bool {
        self.infeasible
    }
}

#[derive(Debug)]
struct ProjectMemo<P: ProjectKey, M: Metadata> {
    domain: Option<Vec<SelectedVersion<M>>>,
    dependencies_cache: HashMap<SelectedVersion<M>, Vec<Dependency<P>>>,
    instantiations: Vec<Instantiation<M>>,
}

impl<P: ProjectKey, M: Metadata> Default for ProjectMemo<P, M> {
    fn default() -> Self {
        ProjectMemo {
            domain: None,
            dependencies_cache: HashMap::new(),
            instantiations: Vec::new(),
        }
    }
}

/// Caches version domains, per-version dependency lookups, and
/// instantiation classes across an entire resolution.
#[derive(Debug)]
pub(crate) struct Memo<P: ProjectKey, M: Metadata> {
    projects: HashMap<ProjectId<P>, ProjectMemo<P, M>>,
    pub(crate) available_versions_calls: usize,
    pub(crate) dependencies_of_calls: usize,
}

/// Combines a set of dependencies into an order-independent hash, using
/// `wrapping_add` so that duplicate or evenly-repeated members don't
/// cancel out, unlike a plain XOR fold.
fn hash_dependency_set<P: ProjectKey>(deps: &HashSet<Dependency<P>>) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut combined: u64 = 0;
    for dep in deps {
        let mut hasher = DefaultHasher::new();
        dep.hash(&mut hasher);
        combined = combined.wrapping_add(hasher.finish());
    }
    combined
}

impl<P: ProjectKey, M: Metadata> Memo<P, M> {
    pub(crate) fn new() -> Self {
        Memo {
            projects: HashMap::new(),
            available_versions_calls: 0,
            dependencies_of_calls: 0,
        }
    }

    /// Returns the full version domain for `project`, descending by SemVer
    /// precedence, fetching and caching it on first use.
    pub(crate) fn domain(
        &mut self,
        project: &ProjectId<P>,
        fetcher: &dyn Fetcher<P, M>,
    ) -> Result<&[SelectedVersion<M>], Error> {
        let entry = self.projects.entry(project.clone()).or_default();
        if entry.domain.is_none() {
            self.available_versions_calls += 1;
            let mut versions = fetcher.available_versions(project)?;
            versions.sort_by(|a, b| b.version().cmp(a.version()));
            entry.domain = Some(versions);
        }
        Ok(self
            .projects
            .get(project)
            .and_then(|e| e.domain.as_deref())
            .unwrap_or(&[]))
    }

    /// Returns the dependencies declared by `project` at `selected`,
    /// fetching and caching them on first use.
    pub(crate) fn dependencies(
        &mut self,
        project: &ProjectId<P>,
        selected: &SelectedVersion<M>,
        fetcher: &dyn Fetcher<P, M>,
    ) -> Result<Vec<Dependency<P>>, Error> {
        if let Some(deps) = self
            .projects
            .get(project)
            .and_then(|e| e.dependencies_cache.get(selected))
        {
            return Ok(deps.clone());
        }
        self.dependencies_of_calls += 1;
        let deps = fetcher.dependencies_of(project, selected)?;
        self.projects
            .entry(project.clone())
            .or_default()
            .dependencies_cache
            .insert(selected.clone(), deps.clone());
        Ok(deps)
    }

    /// Finds or creates the instantiation for `project` keyed by the given
    /// dependency set, records `selected` as one of its members, and
    /// reports whether that instantiation is already known infeasible.
    pub(crate) fn instantiation_is_infeasible(
        &mut self,
        project: &ProjectId<P>,
        selected: &SelectedVersion<M>,
        dependencies: &[Dependency<P>],
    ) -> bool {
        let entry = self.projects.entry(project.clone()).or_default();
        let set: HashSet<Dependency<P>> = dependencies.iter().cloned().collect();
        let hash = hash_dependency_set(&set);

        if let Some(existing) = entry
            .instantiations
            .iter_mut()
            .find(|inst| inst.dependencies_hash == hash)
        {
            if !existing.versions.iter().any(|v| v == selected) {
                existing.versions.push(selected.clone());
            }
            return existing.is_infeasible();
        }

        entry.instantiations.push(Instantiation {
            dependencies_hash: hash,
            versions: vec![selected.clone()],
            infeasible: false,
        });
        false
    }

    /// Total number of distinct domain sizes memoized so far, summed
    /// across all touched projects. Used for [`ResolveStats`](crate::resolver::ResolveStats).
    pub(crate) fn total_domain_entries(&self) -> usize {
        self.projects
            .values()
            .map(|p| p.domain.as_ref().map_or(0, Vec::len))
            .sum()
    }

    /// Marks the instantiation containing `selected` for `project` as
    /// infeasible. This state is never rolled back by backtracking —
    /// that persistence across the search is what makes the pruning
    /// effective.
    pub(crate) fn mark_infeasible(
        &mut self,
        project: &ProjectId<P>,
        dependencies: &[Dependency<P>],
    ) {
        let Some(entry) = self.projects.get_mut(project) else {
            return;
        };
        let set: HashSet<Dependency<P>> = dependencies.iter().cloned().collect();
        let hash = hash_dependency_set(&set);
        if let Some(existing) = entry
            .instantiations
            .iter_mut()
            .find(|inst| inst.dependencies_hash == hash)
        {
            existing.infeasible = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Requirement;
    use crate::version::SemanticVersion;

    fn dep(name: &str) -> Dependency<String> {
        Dependency::new(
            ProjectId::new(name.to_string()),
            Requirement::AtLeast(SemanticVersion::parse("1.0.0").unwrap()),
        )
    }

    #[test]
    fn identical_dependency_sets_hash_to_the_same_instantiation() {
        let mut memo: Memo<String, ()> = Memo::new();
        let project = ProjectId::new("root".to_string());
        let v1 = SelectedVersion::new(SemanticVersion::parse("1.0.0").unwrap(), ());
        let v2 = SelectedVersion::new(SemanticVersion::parse("1.1.0").unwrap(), ());

        let deps = vec![dep("a"), dep("b")];
        assert!(!memo.instantiation_is_infeasible(&project, &v1, &deps));
        assert!(!memo.instantiation_is_infeasible(&project, &v2, &deps));

        memo.mark_infeasible(&project, &deps);
        assert!(memo.instantiation_is_infeasible(&project, &v1, &deps));
        assert!(memo.instantiation_is_infeasible(&project, &v2, &deps));
    }

    #[test]
    fn dependency_set_hash_is_order_independent() {
        let set_a: HashSet<Dependency<String>> = vec![dep("a"), dep("b")].into_iter().collect();
        let set_b: HashSet<Dependency<String>> = vec![dep("b"), dep("a")].into_iter().collect();
        assert_eq!(hash_dependency_set(&set_a), hash_dependency_set(&set_b));
    }
}
