//! Git operations: materialize versions as local branches, and clear them.
//!
//! Fetching is split into planning and execution. [`plan_fetch`] is pure
//! and decides which refspecs to fetch; [`Git::fetch`] runs them.
//! Each version lands at `<prefix>/<number>/v<k>`, alongside
//! `<prefix>/<number>/base` and `<prefix>/<number>/latest`.

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::model::{GitRef, PullRequest, Version};

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Exec(#[from] io::Error),

    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("not a git repository: {0}")]
    NotARepo(String),

    #[error("invariant error: version v{0} has no head commit to fetch")]
    InvalidHead(u32),
}

/// Which refs the user asked to fetch.
///
/// Empty means everything: all versions, base, and latest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: BTreeSet<String>,
}

impl Selection {
    /// Normalize fetch arguments: bare numbers become `v<n>`.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let names = args
            .iter()
            .map(|arg| {
                let arg = arg.as_ref();
                if !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()) {
                    format!("v{arg}")
                } else {
                    arg.to_string()
                }
            })
            .collect();
        Self { names }
    }

    pub fn includes(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.contains(name)
    }
}

/// What to fetch, and where each version will land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    /// Forced refspecs, `+<oid>:<ref>`.
    pub refspecs: Vec<String>,

    /// Version numbers being fetched, with their destination refs.
    pub versions: Vec<(u32, String)>,

    /// Whether the current base is being fetched.
    pub base: bool,

    /// Whether the newest version is also being fetched as `latest`.
    pub latest: bool,
}

impl FetchPlan {
    pub fn is_empty(&self) -> bool {
        self.refspecs.is_empty()
    }
}

/// The ref a pull request's named item lands at.
pub fn version_ref(prefix: &str, pull_request: u64, name: &str) -> String {
    format!("{prefix}/{pull_request}/{name}")
}

/// Strip `refs/heads/` so a fetched ref reads as a branch name.
pub fn branch_name(full_ref: &str) -> &str {
    full_ref.strip_prefix("refs/heads/").unwrap_or(full_ref)
}

/// Decide which refspecs to fetch for a selection of versions.
pub fn plan_fetch(
    pull_request: &PullRequest,
    versions: &[Version],
    selection: &Selection,
    prefix: &str,
) -> Result<FetchPlan, GitError> {
    let mut plan = FetchPlan {
        refspecs: Vec::new(),
        versions: Vec::new(),
        base: false,
        latest: false,
    };

    for version in versions {
        let oid = version
            .head_ref
            .oid()
            .ok_or(GitError::InvalidHead(version.number))?;
        let name = format!("v{}", version.number);
        if selection.includes(&name) {
            let dest = version_ref(prefix, pull_request.number, &name);
            plan.refspecs.push(format!("+{oid}:{dest}"));
            plan.versions.push((version.number, dest));
        }
    }

    if selection.includes("base") {
        let dest = version_ref(prefix, pull_request.number, "base");
        plan.refspecs
            .push(format!("+{}:{dest}", pull_request.base_ref_oid));
        plan.base = true;
    }

    if selection.includes("latest")
        && let Some(oid) = versions.last().and_then(|v| v.head_ref.oid())
    {
        let dest = version_ref(prefix, pull_request.number, "latest");
        plan.refspecs.push(format!("+{oid}:{dest}"));
        plan.latest = true;
    }

    Ok(plan)
}

/// The fetched versions, with heads pointing at their new local branches.
pub fn materialized(versions: &[Version], plan: &FetchPlan) -> Vec<Version> {
    plan.versions
        .iter()
        .filter_map(|(number, dest)| {
            let version = versions.iter().find(|v| v.number == *number)?;
            Some(Version {
                head_ref: GitRef::branch(branch_name(dest)),
                ..version.clone()
            })
        })
        .collect()
}

/// A git repository handle.
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Find the repository containing the current directory.
    pub fn discover() -> Result<Self, GitError> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .output()?;

        if !output.status.success() {
            return Err(GitError::NotARepo(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Fetch refspecs from a remote. Returns git's progress output.
    pub fn fetch(&self, remote: &str, refspecs: &[String]) -> Result<String, GitError> {
        let mut args = vec!["fetch", remote];
        args.extend(refspecs.iter().map(String::as_str));

        let output = self.run(&args)?;
        info!(remote, refs = refspecs.len(), "fetched versions");
        Ok(output.stderr)
    }

    /// Delete every ref under `<prefix>/<pull_request>/`. Returns how many were removed.
    pub fn clear(&self, prefix: &str, pull_request: u64) -> Result<usize, GitError> {
        let pattern = version_ref(prefix, pull_request, "*");
        let output = self.run(&["for-each-ref", "--format", "%(refname)", &pattern])?;

        let refs: Vec<&str> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        for refname in &refs {
            self.run(&["update-ref", "-d", *refname])?;
        }

        info!(pull_request, removed = refs.len(), "cleared versions");
        Ok(refs.len())
    }

    // ── Helpers ──

    /// Run a git command, capturing stdout and stderr.
    fn run(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        debug!(args = %args.join(" "), "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(GitError::Failed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr,
            });
        }

        Ok(GitOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

struct GitOutput {
    stdout: String,
    stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::PullRequestState;

    fn pull_request() -> PullRequest {
        PullRequest {
            number: 12,
            title: "Spin".to_string(),
            state: PullRequestState::Open,
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            author: None,
            is_draft: false,
            base_ref_name: "main".to_string(),
            base_ref_oid: "base0".to_string(),
            head_repository: None,
            head_ref_name: "spin".to_string(),
            head_ref_oid: "head2".to_string(),
        }
    }

    fn version(number: u32, head: GitRef) -> Version {
        Version {
            number,
            updated_at: None,
            possible_base_ref: GitRef::branch("main"),
            head_ref: head,
            was_initially_draft: false,
            was_public: true,
            comment_authors: Vec::new(),
            reviews: Vec::new(),
        }
    }

    fn versions() -> Vec<Version> {
        vec![
            version(1, GitRef::commit("head1")),
            version(2, GitRef::commit("head2")),
        ]
    }

    #[test]
    fn selection_normalizes_numbers() {
        let selection = Selection::parse(&["2", "v3", "base"]);
        assert!(selection.includes("v2"));
        assert!(selection.includes("v3"));
        assert!(selection.includes("base"));
        assert!(!selection.includes("latest"));
        assert!(!selection.includes("v1"));
    }

    #[test]
    fn empty_selection_fetches_everything() {
        let plan = plan_fetch(
            &pull_request(),
            &versions(),
            &Selection::default(),
            "refs/heads/pulls",
        )
        .unwrap();

        assert_eq!(
            plan.refspecs,
            [
                "+head1:refs/heads/pulls/12/v1",
                "+head2:refs/heads/pulls/12/v2",
                "+base0:refs/heads/pulls/12/base",
                "+head2:refs/heads/pulls/12/latest",
            ]
        );
        assert!(plan.base);
        assert!(plan.latest);
    }

    #[test]
    fn selected_versions_only() {
        let plan = plan_fetch(
            &pull_request(),
            &versions(),
            &Selection::parse(&["1"]),
            "refs/heads/pulls",
        )
        .unwrap();

        assert_eq!(plan.refspecs, ["+head1:refs/heads/pulls/12/v1"]);
        assert!(!plan.base);
        assert!(!plan.latest);
        assert_eq!(plan.versions, [(1, "refs/heads/pulls/12/v1".to_string())]);
    }

    #[test]
    fn unknown_selection_plans_nothing() {
        let plan = plan_fetch(
            &pull_request(),
            &versions(),
            &Selection::parse(&["v9"]),
            "refs/heads/pulls",
        )
        .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn symbolic_head_is_an_invariant_error() {
        let versions = vec![version(1, GitRef::branch("pulls/12/v1"))];
        let err = plan_fetch(
            &pull_request(),
            &versions,
            &Selection::default(),
            "refs/heads/pulls",
        )
        .unwrap_err();
        assert!(matches!(err, GitError::InvalidHead(1)));
    }

    #[test]
    fn materialized_heads_are_branch_names() {
        let versions = versions();
        let plan = plan_fetch(
            &pull_request(),
            &versions,
            &Selection::parse(&["v2"]),
            "refs/heads/pulls",
        )
        .unwrap();

        let fetched = materialized(&versions, &plan);
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].number, 2);
        assert_eq!(fetched[0].head_ref, GitRef::branch("pulls/12/v2"));
    }

    #[test]
    fn branch_name_keeps_non_head_refs() {
        assert_eq!(branch_name("refs/heads/pulls/1/v1"), "pulls/1/v1");
        assert_eq!(branch_name("refs/remotes/origin/x"), "refs/remotes/origin/x");
    }
}
