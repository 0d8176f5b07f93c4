//! CLI interface for gh-pr-versions.
//!
//! Requires the `gh` and `git` binaries to be installed and functional.
//! Each subcommand is non-interactive: arguments in, text out.
//!
//! - `gh-pr-versions list <N>`: list reconstructed versions.
//! - `gh-pr-versions fetch <N> [VERSIONS...]`: fetch versions into local branches.
//! - `gh-pr-versions clear <N>`: delete fetched branches.

mod format;

use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::git::{self, Git, Selection};
use crate::github;
use crate::model::{PullRequestTimeline, Version};
use crate::repository::{self, Repository};
use crate::versions;

use format::{describe_fetch, format_header, format_versions};

/// Reconstruct and fetch the versions of a GitHub pull request.
#[derive(Debug, Parser)]
#[command(name = "gh-pr-versions", after_long_help = BRANCH_HELP)]
pub struct Cli {
    /// Repository as `owner/name`. Defaults to `gh repo set-default`.
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Dump the timeline and reconstructed versions as JSON.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

const BRANCH_HELP: &str = r"Branches:
  fetch creates local branches titled pulls/<N>/v1, pulls/<N>/v2, etc.
  It also fetches the base of the pull request into pulls/<N>/base and the
  latest version into pulls/<N>/latest.

Examples:
  gh-pr-versions list 42
  gh-pr-versions fetch 42
  gh-pr-versions fetch 42 1 3 base
  git diff pulls/42/v1 pulls/42/v3
  gh-pr-versions clear 42";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List versions of a pull request.
    List {
        /// Pull request number.
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },

    /// Fetch versions of a pull request into local branches.
    ///
    /// If versions are provided, only the given versions are fetched.
    /// Otherwise, all versions are fetched.
    Fetch {
        /// Pull request number.
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,

        /// Versions to fetch: `3`, `v3`, `base`, or `latest`.
        versions: Vec<String>,
    },

    /// Clear versions of a pull request which were fetched into local branches.
    Clear {
        /// Pull request number.
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },
}

/// A pull request with its versions reconstructed.
struct History {
    timeline: PullRequestTimeline,
    versions: Vec<Version>,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();
    let gh_config = config.gh_config_dir.as_deref();
    let repository = repository::resolve_repository(cli.repo.as_deref(), config, gh_config)?;

    match cli.command {
        Command::List { number } => {
            let history = load_history(&repository, number, gh_config)?;
            print_history(&repository, &history, cli.debug)?;
            for line in format_versions(&history.versions) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Fetch { number, versions } => {
            let history = load_history(&repository, number, gh_config)?;
            print_history(&repository, &history, cli.debug)?;
            cmd_fetch(config, &history, &versions)
        }
        Command::Clear { number } => cmd_clear(config, &repository, number),
    }
}

/// Fetch the timeline and reconstruct its versions.
fn load_history(
    repository: &Repository,
    number: u64,
    gh_config: Option<&Path>,
) -> Result<History, String> {
    let label = format!("{repository}#{number}");

    let timeline = github::fetch_timeline(repository, number, gh_config)
        .map_err(|e| format!("Encountered the following errors when fetching data for {label}: {e}"))?
        .ok_or_else(|| format!("Could not fetch data for {label}"))?;

    let versions = versions::reconstruct(&timeline.pull_request, &timeline.events);
    debug!(
        pull_request = %label,
        events = timeline.events.len(),
        versions = versions.len(),
        "reconstructed versions"
    );

    Ok(History { timeline, versions })
}

fn print_history(repository: &Repository, history: &History, debug: bool) -> Result<(), String> {
    let [title, state] = format_header(&history.timeline.pull_request, repository);
    println!("{title}");
    println!("{state}");
    println!();

    if debug {
        let chronological: Vec<_> = history.timeline.events.iter().rev().collect();
        let timeline = serde_json::to_string_pretty(&chronological)
            .map_err(|e| format!("failed to serialize timeline: {e}"))?;
        let versions = serde_json::to_string_pretty(&history.versions)
            .map_err(|e| format!("failed to serialize versions: {e}"))?;

        println!("Printing debug output:");
        println!();
        println!("Timeline items: {timeline}");
        println!();
        println!("Versions: {versions}");
        println!();
    }

    Ok(())
}

fn cmd_fetch(config: &Config, history: &History, requested: &[String]) -> Result<(), String> {
    let selection = Selection::parse(requested);
    let plan = git::plan_fetch(
        &history.timeline.pull_request,
        &history.versions,
        &selection,
        &config.ref_prefix,
    )
    .map_err(|e| e.to_string())?;

    if plan.is_empty() {
        return Err(format!(
            "nothing to fetch: no version matches {}",
            requested.join(", ")
        ));
    }

    let git = Git::discover().map_err(|e| e.to_string())?;

    println!("Fetching {} with Git:", describe_fetch(&plan));
    let output = git
        .fetch(&config.remote, &plan.refspecs)
        .map_err(|e| format!("failed to fetch versions: {e}"))?;
    if output.is_empty() {
        println!("No output from git command");
    } else {
        println!("{output}");
    }
    println!();

    for line in format_versions(&git::materialized(&history.versions, &plan)) {
        println!("{line}");
    }

    Ok(())
}

fn cmd_clear(config: &Config, repository: &Repository, number: u64) -> Result<(), String> {
    let git = Git::discover().map_err(|e| e.to_string())?;
    let removed = git
        .clear(&config.ref_prefix, number)
        .map_err(|e| format!("failed to clear versions: {e}"))?;

    let noun = if removed == 1 { "branch" } else { "branches" };
    println!("Removed {removed} {noun} of {repository}#{number}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_fetch_with_versions() {
        let cli = Cli::try_parse_from([
            "gh-pr-versions",
            "fetch",
            "42",
            "1",
            "v3",
            "base",
            "--repo",
            "acme/widgets",
        ])
        .unwrap();

        assert_eq!(cli.repo.as_deref(), Some("acme/widgets"));
        match cli.command {
            Command::Fetch { number, versions } => {
                assert_eq!(number, 42);
                assert_eq!(versions, ["1", "v3", "base"]);
            }
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn parses_list_with_debug() {
        let cli = Cli::try_parse_from(["gh-pr-versions", "--debug", "list", "7"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::List { number: 7 }));
    }

    #[test]
    fn rejects_zero_and_missing_numbers() {
        assert!(Cli::try_parse_from(["gh-pr-versions", "list", "0"]).is_err());
        assert!(Cli::try_parse_from(["gh-pr-versions", "clear"]).is_err());
        assert!(Cli::try_parse_from(["gh-pr-versions", "list", "abc"]).is_err());
    }
}
