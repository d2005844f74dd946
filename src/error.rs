//! Error handling for depgraph.

/// depgraph error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A version string did not match the SemVer 2.0.0 grammar.
    #[error("failed to parse SemVer version: {0}")]
    ParseFailure(String),

    /// A [`Fetcher`](crate::fetch::Fetcher) implementation reported an error.
    /// The original error is preserved as the [`std::error::Error::source`]
    /// rather than flattened to a string.
    #[error("fetcher reported an error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Two requirements could not be intersected into anything satisfiable.
    #[error("requirements are mutually exclusive: {0}")]
    MutuallyExclusiveConstraints(String),

    /// No candidate version could satisfy an accumulated requirement.
    #[error("no version satisfies the accumulated constraints: {0}")]
    UnsatisfiableConstraints(String),

    /// An explicit graph mutation conflicted with an existing node.
    #[error("conflicting node in resolved graph: {0}")]
    ConflictingNode(String),

    /// Resolution was interrupted via [`ResolverOptions`](crate::fetch::ResolverOptions).
    #[error("resolution was cancelled")]
    Cancelled,

    /// An internal invariant was violated. Indicates a bug in this crate.
    #[error("internal error: {0}")]
    InternalError(String),
}
