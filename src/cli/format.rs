//! Output formatting for CLI display.

use crate::git::FetchPlan;
use crate::model::{PullRequest, ReviewState, Version};
use crate::repository::Repository;

const UNKNOWN: &str = "(unknown)";

/// `1 comment`, `2 comments`.
pub(super) fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Deduplicate, keeping first occurrences in order.
pub(super) fn unique<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// Two header lines: title and author, then state and branches.
///
/// The head repository is only shown when it differs from the base repository.
pub(super) fn format_header(pull_request: &PullRequest, repository: &Repository) -> [String; 2] {
    let author = pull_request.author.as_deref().unwrap_or(UNKNOWN);
    let title = format!(
        "{} • {repository}#{} by {author}",
        pull_request.title, pull_request.number
    );

    let head_repository = if pull_request.head_repository.as_deref()
        == Some(repository.name_with_owner().as_str())
    {
        String::new()
    } else {
        format!(
            "{}:",
            pull_request
                .head_repository
                .as_deref()
                .unwrap_or(UNKNOWN)
        )
    };
    let state = format!(
        "{} • {} <- {head_repository}{}",
        pull_request.state.label(),
        pull_request.base_ref_name,
        pull_request.head_ref_name
    );

    [title, state]
}

/// One line per version, labels right-aligned to the widest number.
pub(super) fn format_versions(versions: &[Version]) -> Vec<String> {
    let width = versions
        .last()
        .map_or(1, |v| v.number.to_string().len());
    versions.iter().map(|v| format_version(v, width)).collect()
}

/// `    v2 (2024-01-05T00:00:00Z): main..0123456789ab (1 approval by bob; 2 comments by alice)`
pub(super) fn format_version(version: &Version, width: usize) -> String {
    let label = format!("v{}", version.number);
    let updated_at = version
        .updated_at
        .map_or_else(|| "unknown".to_string(), |t| t.to_string());

    let mut line = format!(
        "    {label:>pad$} ({updated_at}): {}..{}",
        version.possible_base_ref.short(),
        version.head_ref.short(),
        pad = width + 1,
    );

    let metadata = format_metadata(version);
    if !metadata.is_empty() {
        line.push_str(&format!(" ({metadata})"));
    }
    line
}

fn format_metadata(version: &Version) -> String {
    let mut parts = Vec::new();

    if version.is_draft_only() {
        parts.push("draft".to_string());
    }

    let reviews: Vec<String> = ReviewState::ALL
        .iter()
        .filter_map(|state| {
            let authors: Vec<&str> = version
                .reviews
                .iter()
                .filter(|r| r.state == *state)
                .map(|r| r.author.as_deref().unwrap_or(UNKNOWN))
                .collect();
            if authors.is_empty() {
                return None;
            }
            Some(format!(
                "{} by {}",
                pluralize(authors.len(), state.noun()),
                unique(authors).join("; ")
            ))
        })
        .collect();
    if !reviews.is_empty() {
        parts.push(reviews.join(", "));
    }

    if !version.comment_authors.is_empty() {
        let authors = version
            .comment_authors
            .iter()
            .map(|a| a.as_deref().unwrap_or(UNKNOWN));
        parts.push(format!(
            "{} by {}",
            pluralize(version.comment_authors.len(), "comment"),
            unique(authors).join(", ")
        ));
    }

    parts.join("; ")
}

/// What a fetch will bring in, e.g. `2 versions, base, latest`.
pub(super) fn describe_fetch(plan: &FetchPlan) -> String {
    let mut contents = Vec::new();
    if !plan.versions.is_empty() {
        contents.push(pluralize(plan.versions.len(), "version"));
    }
    if plan.base {
        contents.push("base".to_string());
    }
    if plan.latest {
        contents.push("latest".to_string());
    }
    contents.join(", ")
}
