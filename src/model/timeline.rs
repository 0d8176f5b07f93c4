//! Timeline events: the lifecycle log of a pull request.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A commit as referenced from the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub oid: String,
    pub committed_date: Timestamp,
}

/// The verdict of a formal review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Pending,
    Dismissed,
}

impl ReviewState {
    /// All states, in display order.
    pub const ALL: [Self; 5] = [
        Self::Approved,
        Self::ChangesRequested,
        Self::Commented,
        Self::Pending,
        Self::Dismissed,
    ];

    /// Singular noun used when listing reviews of this state.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Approved => "approval",
            Self::ChangesRequested => "change request",
            Self::Commented => "review",
            Self::Pending => "pending review",
            Self::Dismissed => "dismissed review",
        }
    }
}

/// One occurrence on a pull request's timeline.
///
/// Closed over the kinds that affect version reconstruction.
/// Anything else GitHub reports is kept as `Other` so that it still
/// occupies its position in the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimelineEvent {
    /// The head branch was force-pushed.
    ///
    /// `before_commit` is `None` when GitHub no longer knows the prior head.
    #[serde(rename_all = "camelCase")]
    ForcePush {
        before_commit: Option<CommitInfo>,
        created_at: Timestamp,
    },

    /// The base branch was changed.
    #[serde(rename_all = "camelCase")]
    BaseChanged {
        previous_ref_name: String,
        created_at: Timestamp,
    },

    /// The base branch was force-pushed.
    BaseForcePush,

    /// The base branch changed automatically after the old one was deleted.
    AutoBaseChangeSucceeded,

    /// A formal review.
    Review {
        author: Option<String>,
        state: ReviewState,
    },

    /// A general comment.
    Comment { author: Option<String> },

    /// The request was converted to a draft.
    ConvertedToDraft,

    /// The request was marked ready for review.
    MarkedReadyForReview,

    /// A commit became part of the request.
    Commit { commit: CommitInfo },

    /// Any event kind not listed above.
    Other,
}

impl TimelineEvent {
    /// Whether this event is a commit.
    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Commit { .. })
    }

    /// Whether this event is a head force-push, with or without a known prior head.
    pub fn is_force_push(&self) -> bool {
        matches!(self, Self::ForcePush { .. })
    }
}
