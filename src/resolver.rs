//! The backtracking search: turns a set of root dependencies into a
//! fully consistent [`ResolvedDependencyGraph`].

use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::dependency::{Dependency, ProjectId, SelectedVersion};
use crate::error::Error;
use crate::fetch::{Fetcher, ResolverOptions};
use crate::graph::ResolvedDependencyGraph;
use crate::identity::{Metadata, ProjectKey};
use crate::memo::Memo;
use crate::requirement::Requirement;

/// Counters describing the work a [`Resolver::resolve`] call performed,
/// regardless of whether it ultimately succeeded.
#[derive(Debug, Clone, Default)]
pub struct ResolveStats {
    /// Candidates tried and rejected before the search backtracked or succeeded.
    pub dead_ends: usize,
    /// Number of times [`Fetcher::available_versions`] was actually invoked (cache misses only).
    pub available_versions_calls: usize,
    /// Number of times [`Fetcher::dependencies_of`] was actually invoked (cache misses only).
    pub dependencies_of_calls: usize,
    /// Sum of memoized candidate-domain sizes across every project touched.
    pub memoized_domain_entries: usize,
    /// Wall-clock time spent inside [`Resolver::resolve`].
    pub elapsed: Duration,
}

/// A single project still waiting to be assigned a version, along with
/// the requirement accumulated for it so far and every already-committed
/// project that depends on it (empty for a root dependency).
#[derive(Clone)]
struct PendingProject<P: ProjectKey> {
    project: ProjectId<P>,
    requirement: Requirement,
    dependents: Vec<ProjectId<P>>,
}

/// Drives a [`Fetcher`] through a backtracking search to resolve a set of
/// dependencies into a [`ResolvedDependencyGraph`].
pub struct Resolver<P: ProjectKey, M: Metadata> {
    fetcher: Box<dyn Fetcher<P, M>>,
    options: ResolverOptions,
    memo: Memo<P, M>,
    stats: ResolveStats,
}

impl<P: ProjectKey, M: Metadata> std::fmt::Debug for Resolver<P, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl<P: ProjectKey, M: Metadata> Resolver<P, M> {
    /// Creates a resolver that drives `fetcher` for all I/O.
    pub fn new(fetcher: impl Fetcher<P, M> + 'static, options: ResolverOptions) -> Self {
        Resolver {
            fetcher: Box::new(fetcher),
            options,
            memo: Memo::new(),
            stats: ResolveStats::default(),
        }
    }

    /// Statistics from the most recently completed [`resolve`](Self::resolve) call.
    pub fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    /// Resolves `dependencies` into `initial_graph`, returning the fully
    /// consistent result or a diagnostic failure.
    pub fn resolve(
        &mut self,
        initial_graph: ResolvedDependencyGraph<P, M>,
        dependencies: Vec<Dependency<P>>,
    ) -> Result<ResolvedDependencyGraph<P, M>, Error> {
        let start = Instant::now();
        self.stats = ResolveStats::default();

        let mut graph = initial_graph;
        let mut worklist: Vec<PendingProject<P>> = Vec::new();

        let seeded = dependencies.into_iter().try_for_each(|dep| {
            self.seed(
                &mut graph,
                &mut worklist,
                None,
                dep.project().clone(),
                dep.requirement().clone(),
            )
        });

        let result = seeded.and_then(|()| self.search(&mut graph, worklist));

        self.stats.memoized_domain_entries = self.memo.total_domain_entries();
        self.stats.available_versions_calls = self.memo.available_versions_calls;
        self.stats.dependencies_of_calls = self.memo.dependencies_of_calls;
        self.stats.elapsed = start.elapsed();

        result.map(|()| graph)
    }

    /// Intersects `requirement` into the worklist entry or existing node
    /// for `project`, failing if the result is mutually exclusive or no
    /// longer satisfied by an already-committed selection. `dependent`, if
    /// given, is the already-committed project this requirement comes
    /// from, and becomes (or re-affirms) a graph edge.
    fn seed(
        &mut self,
        graph: &mut ResolvedDependencyGraph<P, M>,
        worklist: &mut Vec<PendingProject<P>>,
        dependent: Option<ProjectId<P>>,
        project: ProjectId<P>,
        requirement: Requirement,
    ) -> Result<(), Error> {
        if let Some((selected, existing)) = graph.node(&project).map(|(s, r)| (s.clone(), r.clone())) {
            let combined = existing.intersect(&requirement).ok_or_else(|| {
                Error::MutuallyExclusiveConstraints(format!(
                    "{existing} and {requirement} for {project}"
                ))
            })?;
            if !combined.satisfied_by(selected.version()) {
                return Err(Error::UnsatisfiableConstraints(format!(
                    "{project} is already selected at {selected}, which does not satisfy {combined}"
                )));
            }
            match dependent {
                Some(dependent) => graph.add_edge(&dependent, project, selected, combined)?,
                None => graph.add_root(project, selected, combined)?,
            }
            return Ok(());
        }

        if let Some(pending) = worklist.iter_mut().find(|p| p.project == project) {
            let combined = pending.requirement.intersect(&requirement).ok_or_else(|| {
                Error::MutuallyExclusiveConstraints(format!(
                    "{} and {requirement} for {project}",
                    pending.requirement
                ))
            })?;
            pending.requirement = combined;
            if let Some(dependent) = dependent {
                if !pending.dependents.contains(&dependent) {
                    pending.dependents.push(dependent);
                }
            }
        } else {
            worklist.push(PendingProject {
                project,
                requirement,
                dependents: dependent.into_iter().collect(),
            });
        }

        Ok(())
    }

    fn check_cancellation(&self) -> Result<(), Error> {
        if let Some(check) = &self.options.cancellation_check {
            if check() {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }

    /// The recursive core of the search. `worklist` holds projects not yet
    /// assigned a version; `graph` accumulates committed selections.
    ///
    /// Backtracking is structural rather than log-based: each candidate
    /// is tried against a fresh clone of `graph`/`worklist`, and `graph`
    /// is only overwritten with the clone once the whole subtree
    /// succeeds. A failed candidate therefore leaves `graph` exactly as
    /// it was. The one exception is `self.memo`'s instantiation-
    /// infeasibility table, which must persist across backtracking for
    /// the pruning described in `memo.rs` to do any good.
    fn search(
        &mut self,
        graph: &mut ResolvedDependencyGraph<P, M>,
        mut worklist: Vec<PendingProject<P>>,
    ) -> Result<(), Error> {
        self.check_cancellation()?;

        let Some(index) = self.pick_next(&worklist)? else {
            return Ok(());
        };
        let pending = worklist.remove(index);

        let domain = self
            .memo
            .domain(&pending.project, self.fetcher.as_ref())?
            .to_vec();
        let core = requirement_pinned_core(&pending.requirement);

        let mut last_error: Option<Error> = None;

        for candidate in domain
            .iter()
            .filter(|c| pending.requirement.satisfied_by(c.version()))
        {
            if candidate.version().is_prerelease() && !pending.requirement.allows_prerelease_of(core)
            {
                continue;
            }

            self.check_cancellation()?;

            if let Some(cap) = self.options.max_candidates_tried {
                if self.stats.dead_ends >= cap {
                    break;
                }
            }

            trace!("trying {} @ {candidate}", pending.project);

            let mut trial_graph = graph.clone();
            let mut trial_worklist = worklist.clone();

            match self.attempt(
                &mut trial_graph,
                &mut trial_worklist,
                &pending.project,
                &pending.requirement,
                &pending.dependents,
                candidate,
            ) {
                Ok(()) => {
                    debug!("selected {} @ {candidate}", pending.project);
                    *graph = trial_graph;
                    return Ok(());
                }
                Err(err) => {
                    self.stats.dead_ends += 1;
                    trace!("rejected {} @ {candidate}: {err}", pending.project);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::UnsatisfiableConstraints(format!(
                "no version of {} satisfies {}",
                pending.project, pending.requirement
            ))
        }))
    }

    /// Commits `candidate` as the selection for `project` within a trial
    /// graph/worklist, seeds its declared dependencies, and recurses. Any
    /// failure along the way marks the candidate's instantiation
    /// infeasible before propagating.
    fn attempt(
        &mut self,
        graph: &mut ResolvedDependencyGraph<P, M>,
        worklist: &mut Vec<PendingProject<P>>,
        project: &ProjectId<P>,
        requirement: &Requirement,
        dependents: &[ProjectId<P>],
        candidate: &SelectedVersion<M>,
    ) -> Result<(), Error> {
        let dependencies = self
            .memo
            .dependencies(project, candidate, self.fetcher.as_ref())?;

        if self
            .memo
            .instantiation_is_infeasible(project, candidate, &dependencies)
        {
            return Err(Error::UnsatisfiableConstraints(format!(
                "{project} @ {candidate} shares a known-infeasible dependency set"
            )));
        }

        if dependents.is_empty() {
            graph.add_root(project.clone(), candidate.clone(), requirement.clone())?;
        } else {
            for dependent in dependents {
                graph.add_edge(dependent, project.clone(), candidate.clone(), requirement.clone())?;
            }
        }

        for dep in &dependencies {
            if let Err(err) = self.seed(
                graph,
                worklist,
                Some(project.clone()),
                dep.project().clone(),
                dep.requirement().clone(),
            ) {
                self.memo.mark_infeasible(project, &dependencies);
                return Err(err);
            }
        }

        self.search(graph, std::mem::take(worklist)).map_err(|err| {
            self.memo.mark_infeasible(project, &dependencies);
            err
        })
    }

    /// Chooses the next project to assign, by the requirement-filtered
    /// candidate-domain size (smallest first), breaking ties by project
    /// identifier. Fetches (and memoizes) each candidate's domain along
    /// the way, since computing the filtered size requires it anyway.
    fn pick_next(&mut self, worklist: &[PendingProject<P>]) -> Result<Option<usize>, Error> {
        if worklist.is_empty() {
            return Ok(None);
        }

        let mut best: Option<(usize, usize)> = None;
        for (index, pending) in worklist.iter().enumerate() {
            let domain = self.memo.domain(&pending.project, self.fetcher.as_ref())?;
            let filtered = domain
                .iter()
                .filter(|c| pending.requirement.satisfied_by(c.version()))
                .count();

            let better = match best {
                None => true,
                Some((best_count, best_index)) => {
                    filtered < best_count
                        || (filtered == best_count
                            && worklist[index].project < worklist[best_index].project)
                }
            };
            if better {
                best = Some((filtered, index));
            }
        }

        Ok(best.map(|(_, index)| index))
    }
}

/// The `(major, minor, patch)` core a requirement pins or bounds to, used
/// to decide whether a prerelease candidate is in scope. Requirements
/// that don't pin a specific core (`Any`, `Compound`) never permit
/// prereleases via this path.
fn requirement_pinned_core(requirement: &Requirement) -> (u64, u64, u64) {
    match requirement {
        Requirement::AtLeast(v) | Requirement::CompatibleWith(v, _) | Requirement::Exactly(v) => {
            v.core()
        }
        _ => (0, 0, 0),
    }
}
