//! Versions: one logical revision of a pull request.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::ReviewState;

/// A reference to a point in history: a branch name or a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GitRef {
    /// A symbolic branch name.
    Ref { name: String },

    /// A concrete commit id.
    Commit { oid: String },
}

impl GitRef {
    pub fn branch(name: impl Into<String>) -> Self {
        Self::Ref { name: name.into() }
    }

    pub fn commit(oid: impl Into<String>) -> Self {
        Self::Commit { oid: oid.into() }
    }

    /// The commit id, if this is a concrete commit.
    pub fn oid(&self) -> Option<&str> {
        match self {
            Self::Commit { oid } => Some(oid),
            Self::Ref { .. } => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Ref { .. })
    }

    /// Short form for display: the branch name, or the first 12 characters of the commit.
    pub fn short(&self) -> &str {
        match self {
            Self::Ref { name } => name,
            Self::Commit { oid } => oid.get(..12).unwrap_or(oid),
        }
    }
}

/// A formal review attributed to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub author: Option<String>,
    pub state: ReviewState,
}

/// One logical revision of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// 1-based, oldest first.
    pub number: u32,

    /// When this version was superseded or created.
    ///
    /// May be a heuristic. `None` when nothing in the timeline pins it down.
    pub updated_at: Option<Timestamp>,

    /// Best-known base. Historical base commits are often unrecoverable,
    /// so this is frequently the base branch's name instead.
    pub possible_base_ref: GitRef,

    /// The version's head commit, or its local branch once materialized.
    pub head_ref: GitRef,

    pub was_initially_draft: bool,
    pub was_public: bool,

    /// Authors of general comments posted against this version, oldest first.
    pub comment_authors: Vec<Option<String>>,

    /// Reviews posted against this version, oldest first.
    pub reviews: Vec<Review>,
}

impl Version {
    /// Drafts that never went public are labelled as such in listings.
    pub fn is_draft_only(&self) -> bool {
        self.was_initially_draft && !self.was_public
    }
}
