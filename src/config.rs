//! gh-pr-versions configuration.
//!
//! Loaded from `~/.gh-pr-versions/config.toml`. Every key is optional;
//! a missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Where fetched versions land unless configured otherwise.
pub const DEFAULT_REF_PREFIX: &str = "refs/heads/pulls";

/// Errors loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// gh-pr-versions configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Remote to fetch pull request versions from.
    pub remote: String,

    /// Ref namespace for fetched versions, e.g. `refs/heads/pulls`.
    pub ref_prefix: String,

    /// `GH_CONFIG_DIR` to run `gh` with, for a non-default GitHub account.
    pub gh_config_dir: Option<PathBuf>,

    /// Default repository (`owner/name`) when `--repo` is not given.
    pub repository: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            ref_prefix: DEFAULT_REF_PREFIX.to_string(),
            gh_config_dir: None,
            repository: None,
        }
    }
}

impl Config {
    /// Load config from `~/.gh-pr-versions/config.toml`, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse config from TOML text. Unset keys take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(contents)?;
        config.ref_prefix = config.ref_prefix.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// The config file path: `~/.gh-pr-versions/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".gh-pr-versions").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.remote, "origin");
        assert_eq!(config.ref_prefix, DEFAULT_REF_PREFIX);
        assert!(config.gh_config_dir.is_none());
        assert!(config.repository.is_none());
    }

    #[test]
    fn keys_override_defaults() {
        let config = Config::from_toml(
            r#"
            remote = "upstream"
            ref-prefix = "refs/heads/review/"
            gh-config-dir = "/tmp/gh"
            repository = "acme/widgets"
            "#,
        )
        .unwrap();
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.ref_prefix, "refs/heads/review");
        assert_eq!(config.gh_config_dir, Some(PathBuf::from("/tmp/gh")));
        assert_eq!(config.repository.as_deref(), Some("acme/widgets"));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.remote, "origin");
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "remote = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
