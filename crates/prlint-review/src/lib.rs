//! Title checking and bot feedback reconciliation for pull requests.
//!
//! Provides the title evaluator, the GitHub API seam and its octocrab client,
//! the review reconciler with its dismiss policy, the minimize sweeps, and the
//! run orchestration that ties them together.

pub mod api;
pub mod github;
pub mod lookup;
pub mod minimize;
pub mod pipeline;
pub mod reconcile;
pub mod title;
