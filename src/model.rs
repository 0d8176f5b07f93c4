//! Core data model for gh-pr-versions.
//!
//! These types describe a pull request, the timeline events recorded
//! against it, and the versions reconstructed from those events.

mod pull_request;
mod timeline;
mod version;

pub use pull_request::{PullRequest, PullRequestState, PullRequestTimeline};
pub use timeline::{CommitInfo, ReviewState, TimelineEvent};
pub use version::{GitRef, Review, Version};
