//! Pull request metadata as reported by GitHub.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::TimelineEvent;

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

impl PullRequestState {
    /// Title-cased label, e.g. `Merged`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Merged => "Merged",
        }
    }
}

/// A pull request's current metadata.
///
/// Read-only input to version reconstruction: base and head describe
/// the request as it stands now, not as it stood historically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: PullRequestState,
    pub created_at: Timestamp,

    /// Login of the author. `None` when the account was deleted.
    pub author: Option<String>,

    pub is_draft: bool,
    pub base_ref_name: String,
    pub base_ref_oid: String,

    /// `owner/name` of the head repository. `None` when the fork is gone.
    pub head_repository: Option<String>,

    pub head_ref_name: String,
    pub head_ref_oid: String,
}

/// A pull request together with its timeline, newest event first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestTimeline {
    pub pull_request: PullRequest,
    pub events: Vec<TimelineEvent>,
}
