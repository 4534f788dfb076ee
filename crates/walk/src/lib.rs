//! Walkers: turn container listings into a stream of findings.
//!
//! [`walk_share`] descends a hierarchical share depth-first, [`walk_bucket`]
//! runs once over a flat bucket, and [`enumerate`] fans both out across every
//! container of every resource. None of them ever fail: listing errors end
//! the affected sub-tree (silently, when access is denied) and the walk goes
//! on with everything else.

mod enumerate;
mod event;
mod flat;
mod tree;

pub use crate::enumerate::{ContainerKind, Report, ReportEvent, Resource, RunSummary, enumerate};
pub use crate::event::{Finding, WalkEvent, WalkStats};
pub use crate::flat::walk_bucket;
pub use crate::tree::walk_share;
pub use snuffle_rules::Reason;
pub use tokio_util::sync::CancellationToken;

/// Deepest directory nesting the tree walker descends into by default.
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Number of containers walked at once by default.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Knobs shared by every walk of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkOptions {
    /// Directories nested deeper than this are reported but not descended.
    pub max_depth: usize,
    /// Containers walked concurrently by [`enumerate`]. `1` gives fully
    /// deterministic output ordering.
    pub concurrency: usize,
}
impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}
