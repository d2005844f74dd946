//! The caller-implemented interface the resolver drives for I/O, and the
//! options a caller tunes before a resolution.

use crate::dependency::{Dependency, ProjectId, SelectedVersion};
use crate::error::Error;
use crate::identity::{Metadata, ProjectKey};

/// Supplies the resolver with the data it cannot derive on its own: which
/// versions of a project exist, and what each version depends on.
///
/// Both methods are called at most once per unique argument; the resolver
/// memoizes results internally (see `memo.rs`). Implementations should
/// not mutate shared state the resolver also touches, and must not block
/// indefinitely, since cancellation is only checked at the call boundary
/// between invocations, not during one.
///
/// An implementation backed by fallible I/O (a registry fetch, a
/// filesystem read) reports failure by boxing its own error into
/// [`Error::UserError`], which preserves it as the returned error's
/// [`std::error::Error::source`] instead of flattening it to a string.
pub trait Fetcher<P: ProjectKey, M: Metadata> {
    /// All versions of `project` the caller is willing to consider, in any
    /// order. The resolver sorts the result by descending SemVer
    /// precedence before use.
    fn available_versions(
        &self,
        project: &ProjectId<P>,
    ) -> Result<Vec<SelectedVersion<M>>, Error>;

    /// The dependencies declared by `project` at `selected`.
    fn dependencies_of(
        &self,
        project: &ProjectId<P>,
        selected: &SelectedVersion<M>,
    ) -> Result<Vec<Dependency<P>>, Error>;

    /// Looks up a selected version by its metadata alone, for callers that
    /// can resolve versions not returned by [`Fetcher::available_versions`]
    /// (e.g. a pinned commit). The default implementation reports that no
    /// such lookup is supported.
    fn selected_version_for_metadata(
        &self,
        _project: &ProjectId<P>,
        _metadata: &M,
    ) -> Option<SelectedVersion<M>> {
        None
    }
}

/// Tuning knobs for a single [`resolve`](crate::resolver::Resolver::resolve) call.
pub struct ResolverOptions {
    /// Polled before each [`Fetcher`] invocation; when it returns `true`,
    /// resolution stops with [`Error::Cancelled`].
    pub cancellation_check: Option<Box<dyn Fn() -> bool>>,
    /// An upper bound on the number of candidate versions tried in total,
    /// across the whole search, as a safety valve against pathological
    /// inputs. `None` means unbounded.
    pub max_candidates_tried: Option<usize>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            cancellation_check: None,
            max_candidates_tried: None,
        }
    }
}

impl std::fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverOptions")
            .field("cancellation_check", &self.cancellation_check.is_some())
            .field("max_candidates_tried", &self.max_candidates_tried)
            .finish()
    }
}
