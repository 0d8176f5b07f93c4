//! Repository resolution for gh-pr-versions commands.
//!
//! Every command needs to know which repository the pull request lives in.
//! Rather than requiring `--repo` on every invocation, the repository is
//! resolved through a chain:
//!
//! 1. `--repo <owner/name>`: explicit per-command override
//! 2. `GH_PR_VERSIONS_REPO` env var: process/session level
//! 3. `repository` in `~/.gh-pr-versions/config.toml`
//! 4. `gh repo set-default --view`: whatever `gh` considers current

use std::env;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::github;

/// Error message shown when no repository can be resolved.
pub const REPOSITORY_REQUIRED: &str = "could not determine current repository\n\
    Please run `gh repo set-default` to set the current repository, \
    or pass --repo <owner/name>";

/// A GitHub repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    owner: String,
    name: String,
}

impl Repository {
    /// Parse `owner/name`. Rejects whitespace, extra slashes, and empty parts.
    pub fn parse(input: &str) -> Option<Self> {
        if input.chars().any(char::is_whitespace) {
            return None;
        }
        let (owner, name) = input.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_with_owner(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolve the repository from the tiered resolution chain.
///
/// An explicit or configured value that does not parse is an error rather
/// than a fall-through, so typos are not silently replaced by `gh`'s default.
pub fn resolve_repository(
    explicit: Option<&str>,
    config: &Config,
    gh_config: Option<&Path>,
) -> Result<Repository, String> {
    let env_value = env::var("GH_PR_VERSIONS_REPO")
        .ok()
        .filter(|s| !s.is_empty());

    let candidates = [
        ("--repo", explicit.map(str::to_string)),
        ("GH_PR_VERSIONS_REPO", env_value),
        ("config", config.repository.clone()),
    ];
    for (source, value) in candidates {
        if let Some(value) = value {
            debug!(source, repository = %value, "resolved repository");
            return Repository::parse(&value)
                .ok_or_else(|| format!("invalid repository '{value}' from {source}: expected owner/name"));
        }
    }

    match github::default_repository(gh_config) {
        Ok(Some(repository)) => Ok(repository),
        Ok(None) => Err(REPOSITORY_REQUIRED.to_string()),
        Err(e) => Err(format!("{REPOSITORY_REQUIRED}\n({e})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let repo = Repository::parse("acme/widgets").unwrap();
        assert_eq!(repo.owner(), "acme");
        assert_eq!(repo.name(), "widgets");
        assert_eq!(repo.name_with_owner(), "acme/widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "widgets", "acme/", "/widgets", "acme/wid gets", "a/b/c", "no repo set\n"] {
            assert!(Repository::parse(input).is_none(), "accepted {input:?}");
        }
    }

    #[test]
    fn explicit_wins() {
        // An explicit value is returned without consulting env or `gh`.
        let config = Config::default();
        let repo = resolve_repository(Some("acme/widgets"), &config, None).unwrap();
        assert_eq!(repo.name_with_owner(), "acme/widgets");
    }

    #[test]
    fn invalid_explicit_is_an_error() {
        let config = Config::default();
        let err = resolve_repository(Some("widgets"), &config, None).unwrap_err();
        assert!(err.contains("--repo"));
    }
}
