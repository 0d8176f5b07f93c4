//! GitHub timeline source: pull request metadata and timeline events.
//!
//! Fetches data via the `gh` CLI's GraphQL endpoint, following every page
//! of timeline items. The response is flattened into a
//! [`PullRequestTimeline`] with events ordered newest first, ready for
//! version reconstruction.

use std::io;
use std::path::Path;
use std::process::Command;

use jiff::Timestamp;
use serde::Deserialize;
use tracing::debug;

use crate::model::{
    CommitInfo, PullRequest, PullRequestState, PullRequestTimeline, ReviewState, TimelineEvent,
};
use crate::repository::Repository;

const PULL_REQUEST_QUERY: &str = include_str!("../resources/pull_request.graphql");

/// Errors from talking to GitHub.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("failed to run gh: {0}")]
    Exec(#[from] io::Error),

    #[error("{command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("unexpected response from GitHub: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitHub query failed: {}", .0.join("; "))]
    Query(Vec<String>),
}

/// Fetch a pull request and its full timeline.
///
/// Returns `Ok(None)` when GitHub has no such pull request.
pub fn fetch_timeline(
    repository: &Repository,
    number: u64,
    gh_config: Option<&Path>,
) -> Result<Option<PullRequestTimeline>, GitHubError> {
    let owner = format!("owner={}", repository.owner());
    let name = format!("name={}", repository.name());
    let number = format!("number={number}");
    let query = format!("query={}", PULL_REQUEST_QUERY.trim());

    let json = gh(
        &[
            "api",
            "graphql",
            "--paginate",
            "--slurp",
            "-f",
            &owner,
            "-f",
            &name,
            "-F",
            &number,
            "-f",
            &query,
        ],
        gh_config,
    )?;

    parse_response(&json)
}

/// The repository `gh` treats as current, if one has been set.
pub fn default_repository(gh_config: Option<&Path>) -> Result<Option<Repository>, GitHubError> {
    let output = gh(&["repo", "set-default", "--view"], gh_config)?;
    Ok(Repository::parse(output.trim()))
}

/// Parse `gh api graphql` output: one page, or an array of pages when slurped.
pub fn parse_response(json: &str) -> Result<Option<PullRequestTimeline>, GitHubError> {
    let pages = match serde_json::from_str::<GhPages>(json)? {
        GhPages::Many(pages) => pages,
        GhPages::One(page) => vec![page],
    };

    let mut data = Vec::with_capacity(pages.len());
    let mut errors = Vec::new();
    for page in pages {
        match page {
            GhPage::Errors { errors: page_errors } => {
                errors.extend(page_errors.into_iter().map(|e| e.message));
            }
            GhPage::Data { data: page_data } => data.push(page_data),
        }
    }
    if !errors.is_empty() {
        return Err(GitHubError::Query(errors));
    }

    // Metadata comes from the first page only; later pages add timeline nodes.
    let mut pull_requests = data
        .into_iter()
        .map(|d| d.repository.and_then(|r| r.pull_request));

    let Some(Some(first)) = pull_requests.next() else {
        return Ok(None);
    };

    let mut items: Vec<GhTimelineItem> = first.timeline_items.nodes.into_iter().flatten().collect();
    for page in pull_requests.flatten() {
        items.extend(page.timeline_items.nodes.into_iter().flatten());
    }

    debug!(number = first.number, items = items.len(), "parsed pull request timeline");

    let pull_request = PullRequest {
        number: first.number,
        title: first.title,
        state: first.state,
        created_at: first.created_at,
        author: first.author.map(|a| a.login),
        is_draft: first.is_draft,
        base_ref_name: first.base_ref_name,
        base_ref_oid: first.base_ref_oid,
        head_repository: first.head_repository.map(|r| r.name_with_owner),
        head_ref_name: first.head_ref_name,
        head_ref_oid: first.head_ref_oid,
    };

    // GitHub lists the timeline oldest first.
    let events = items.into_iter().rev().map(TimelineEvent::from).collect();

    Ok(Some(PullRequestTimeline {
        pull_request,
        events,
    }))
}

// ── gh CLI helper ──

/// Run `gh` with the given args and return stdout.
fn gh(args: &[&str], gh_config: Option<&Path>) -> Result<String, GitHubError> {
    let mut command = Command::new("gh");
    command.args(args);
    if let Some(dir) = gh_config {
        command.env("GH_CONFIG_DIR", dir);
    }

    // The query text is long; the subcommand is enough to identify the call.
    let label = format!("gh {}", args.iter().take(2).copied().collect::<Vec<_>>().join(" "));
    debug!(command = %label, "running");

    let output = command.output()?;
    if !output.status.success() {
        return Err(GitHubError::Failed {
            command: label,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ── GraphQL response shapes ──

#[derive(Deserialize)]
#[serde(untagged)]
enum GhPages {
    Many(Vec<GhPage>),
    One(GhPage),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GhPage {
    Errors { errors: Vec<GhQueryError> },
    Data { data: GhData },
}

#[derive(Deserialize)]
struct GhQueryError {
    message: String,
}

#[derive(Deserialize)]
struct GhData {
    repository: Option<GhRepository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhRepository {
    pull_request: Option<GhPullRequest>,
}

#[derive(Deserialize)]
struct GhActor {
    login: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhHeadRepository {
    name_with_owner: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPullRequest {
    number: u64,
    title: String,
    state: PullRequestState,
    created_at: Timestamp,
    author: Option<GhActor>,
    is_draft: bool,
    base_ref_name: String,
    base_ref_oid: String,
    head_repository: Option<GhHeadRepository>,
    head_ref_name: String,
    head_ref_oid: String,
    timeline_items: GhTimelineItems,
}

#[derive(Deserialize)]
struct GhTimelineItems {
    nodes: Vec<Option<GhTimelineItem>>,
}

/// A timeline node, discriminated by its GraphQL type name.
#[derive(Deserialize)]
#[serde(tag = "__typename")]
enum GhTimelineItem {
    #[serde(rename_all = "camelCase")]
    HeadRefForcePushedEvent {
        created_at: Timestamp,
        before_commit: Option<CommitInfo>,
    },
    #[serde(rename_all = "camelCase")]
    BaseRefChangedEvent {
        created_at: Timestamp,
        previous_ref_name: String,
    },
    BaseRefForcePushedEvent,
    AutomaticBaseChangeSucceededEvent,
    PullRequestReview {
        author: Option<GhActor>,
        state: ReviewState,
    },
    IssueComment {
        author: Option<GhActor>,
    },
    ConvertToDraftEvent,
    ReadyForReviewEvent,
    PullRequestCommit {
        commit: CommitInfo,
    },
    #[serde(other)]
    Unknown,
}

impl From<GhTimelineItem> for TimelineEvent {
    fn from(item: GhTimelineItem) -> Self {
        match item {
            GhTimelineItem::HeadRefForcePushedEvent {
                created_at,
                before_commit,
            } => Self::ForcePush {
                before_commit,
                created_at,
            },
            GhTimelineItem::BaseRefChangedEvent {
                created_at,
                previous_ref_name,
            } => Self::BaseChanged {
                previous_ref_name,
                created_at,
            },
            GhTimelineItem::BaseRefForcePushedEvent => Self::BaseForcePush,
            GhTimelineItem::AutomaticBaseChangeSucceededEvent => Self::AutoBaseChangeSucceeded,
            GhTimelineItem::PullRequestReview { author, state } => Self::Review {
                author: author.map(|a| a.login),
                state,
            },
            GhTimelineItem::IssueComment { author } => Self::Comment {
                author: author.map(|a| a.login),
            },
            GhTimelineItem::ConvertToDraftEvent => Self::ConvertedToDraft,
            GhTimelineItem::ReadyForReviewEvent => Self::MarkedReadyForReview,
            GhTimelineItem::PullRequestCommit { commit } => Self::Commit { commit },
            GhTimelineItem::Unknown => Self::Other,
        }
    }
}
