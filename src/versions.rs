//! Version reconstruction: replay a pull request's timeline into versions.
//!
//! GitHub has no notion of pull request "versions". They are inferred by
//! walking the timeline backwards from the present: the open version
//! starts as the request as it stands now, and each boundary-triggering
//! event closes it and opens an older one in its place.
//!
//! Boundaries come from three sources:
//!
//! - head force-pushes, which name the prior head commit;
//! - base branch changes, which name the prior base branch;
//! - gaps between runs of commits, where some other event separates two
//!   pushes that GitHub did not otherwise record.
//!
//! Historical base commits are not recoverable from the timeline, so older
//! versions fall back to the base branch's name.

use std::mem;

use jiff::Timestamp;
use tracing::{debug, trace, warn};

use crate::model::{CommitInfo, GitRef, PullRequest, Review, TimelineEvent, Version};

/// Reconstruct the versions of a pull request, oldest first.
///
/// `events` must be ordered newest first. Always returns at least one
/// version, and the oldest version's `updated_at` is the request's
/// creation time.
pub fn reconstruct(pull_request: &PullRequest, events: &[TimelineEvent]) -> Vec<Version> {
    let mut replay = Replay::new(pull_request);
    let mut previous = None;

    for event in events {
        replay.apply(event, previous);
        previous = Some(event);
    }

    replay.finish()
}

/// A version still being assembled.
///
/// Comment and review lists are accumulated newest first and flipped
/// when the version is finished.
#[derive(Debug, Clone)]
struct Draft {
    updated_at: Option<Timestamp>,
    possible_base_ref: GitRef,
    head_ref: GitRef,
    was_initially_draft: bool,
    was_public: bool,
    comment_authors: Vec<Option<String>>,
    reviews: Vec<Review>,
}

impl Draft {
    /// The request as it stands now.
    fn current(pull_request: &PullRequest) -> Self {
        Self {
            updated_at: None,
            possible_base_ref: GitRef::commit(&pull_request.base_ref_oid),
            head_ref: GitRef::commit(&pull_request.head_ref_oid),
            was_initially_draft: pull_request.is_draft,
            was_public: !pull_request.is_draft,
            comment_authors: Vec::new(),
            reviews: Vec::new(),
        }
    }

    /// The version preceding this one. Draft state carries over; it was
    /// public only if it did not start as a draft.
    fn preceding(
        &self,
        possible_base_ref: GitRef,
        head_ref: GitRef,
        updated_at: Option<Timestamp>,
    ) -> Self {
        Self {
            updated_at,
            possible_base_ref,
            head_ref,
            was_initially_draft: self.was_initially_draft,
            was_public: !self.was_initially_draft,
            comment_authors: Vec::new(),
            reviews: Vec::new(),
        }
    }

    fn into_version(self, number: u32) -> Version {
        let Self {
            updated_at,
            possible_base_ref,
            head_ref,
            was_initially_draft,
            was_public,
            mut comment_authors,
            mut reviews,
        } = self;
        comment_authors.reverse();
        reviews.reverse();

        Version {
            number,
            updated_at,
            possible_base_ref,
            head_ref,
            was_initially_draft,
            was_public,
            comment_authors,
            reviews,
        }
    }
}

/// Replay state: the open version plus every version closed so far.
struct Replay<'a> {
    pull_request: &'a PullRequest,
    open: Draft,
    /// Newest first.
    closed: Vec<Draft>,
    seen_commit: bool,
}

impl<'a> Replay<'a> {
    fn new(pull_request: &'a PullRequest) -> Self {
        Self {
            pull_request,
            open: Draft::current(pull_request),
            closed: Vec::new(),
            seen_commit: false,
        }
    }

    /// Close the open version and make `older` the open one.
    fn open_preceding(&mut self, older: Draft) {
        let closed = mem::replace(&mut self.open, older);
        self.closed.push(closed);
    }

    fn apply(&mut self, event: &TimelineEvent, previous: Option<&TimelineEvent>) {
        match event {
            TimelineEvent::ForcePush {
                before_commit: Some(before),
                created_at,
            } => self.force_push(before, *created_at),
            TimelineEvent::ForcePush {
                before_commit: None,
                ..
            } => {
                trace!("skipping force-push with unknown prior head");
            }
            TimelineEvent::BaseChanged {
                previous_ref_name,
                created_at,
            } => self.base_changed(previous_ref_name, *created_at),
            TimelineEvent::BaseForcePush => {
                warn!("base branch was force-pushed; older base commits may be inaccurate");
            }
            TimelineEvent::AutoBaseChangeSucceeded => {
                trace!("skipping automatic base change");
            }
            TimelineEvent::Review { author, state } => {
                self.open.reviews.push(Review {
                    author: author.clone(),
                    state: *state,
                });
            }
            TimelineEvent::Comment { author } => {
                self.open.comment_authors.push(author.clone());
            }
            // Walking backwards: a conversion to draft means the request
            // was public before it, and is treated as not having started
            // as a draft. Marking ready is the mirror image.
            TimelineEvent::ConvertedToDraft => {
                self.open.was_public = true;
                self.open.was_initially_draft = false;
            }
            TimelineEvent::MarkedReadyForReview => {
                self.open.was_public = true;
                self.open.was_initially_draft = true;
            }
            TimelineEvent::Commit { commit } => self.commit(commit, previous),
            TimelineEvent::Other => {}
        }
    }

    fn force_push(&mut self, before: &CommitInfo, created_at: Timestamp) {
        self.open.updated_at = Some(created_at);

        // The event does not say what the base commit was at the time.
        let base = if self.open.possible_base_ref.is_symbolic() {
            self.open.possible_base_ref.clone()
        } else {
            GitRef::branch(&self.pull_request.base_ref_name)
        };

        debug!(before = %before.oid, %created_at, "force-push opens a new version");
        // The prior head's commit date stands in for when it was pushed.
        let older = self.open.preceding(
            base,
            GitRef::commit(&before.oid),
            Some(before.committed_date),
        );
        self.open_preceding(older);
    }

    fn base_changed(&mut self, previous_ref_name: &str, created_at: Timestamp) {
        self.open.updated_at = Some(created_at);

        debug!(previous = previous_ref_name, %created_at, "base change opens a new version");
        let older = self.open.preceding(
            GitRef::branch(previous_ref_name),
            self.open.head_ref.clone(),
            None,
        );
        self.open_preceding(older);
    }

    fn commit(&mut self, commit: &CommitInfo, previous: Option<&TimelineEvent>) {
        if self.open.updated_at.is_none() && self.open.head_ref.oid() == Some(commit.oid.as_str()) {
            self.open.updated_at = Some(commit.committed_date);
        }

        // Commits pushed together are listed together. Anything else
        // between two runs of commits means there was a separate push.
        let gap = previous.is_some_and(|p| !p.is_commit() && !p.is_force_push());
        if self.seen_commit && gap {
            debug!(oid = %commit.oid, "gap between commits opens a new version");
            let older = self.open.preceding(
                self.open.possible_base_ref.clone(),
                GitRef::commit(&commit.oid),
                Some(commit.committed_date),
            );
            self.open_preceding(older);
        }

        self.seen_commit = true;
    }

    /// Pin the oldest version to the request's creation and number everything.
    fn finish(self) -> Vec<Version> {
        let Self {
            pull_request,
            mut open,
            mut closed,
            ..
        } = self;

        open.updated_at = Some(pull_request.created_at);
        closed.push(open);

        closed
            .into_iter()
            .rev()
            .zip(1u32..)
            .map(|(draft, number)| draft.into_version(number))
            .collect()
    }
}
