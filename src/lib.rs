#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod dependency;
mod error;
mod fetch;
mod graph;
mod identity;
mod installer;
mod memo;
mod requirement;
mod resolver;
mod version;

pub use dependency::{Dependency, ProjectId, ResolvedDependency, SelectedVersion};
pub use error::Error;
pub use fetch::{Fetcher, ResolverOptions};
pub use graph::ResolvedDependencyGraph;
pub use identity::{Metadata, ProjectKey};
pub use installer::Installer;
pub use requirement::{Requirement, Strictness};
pub use resolver::{ResolveStats, Resolver};
pub use version::SemanticVersion;
