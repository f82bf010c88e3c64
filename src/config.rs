use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::github::{GitHubError, Repository, API_BASE};
use crate::metrics::MaintainerSet;

pub const TOML_CONFIG: &str = ".issue-report.toml";
pub const LEGACY_CONFIG: &str = "config.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Malformed config line {line}: {content:?} (expected key=value)")]
    Malformed { line: usize, content: String },

    #[error("No repository given: pass org/repo or set `{0}` in the config file")]
    MissingKey(&'static str),

    #[error(transparent)]
    Repository(#[from] GitHubError),
}

/// Configuration loaded from `.issue-report.toml` or `config.txt`.
/// All fields are optional; the repository can also come from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub org: Option<String>,
    pub repo: Option<String>,
    /// Personal access token. If None, falls back to GITHUB_TOKEN env var.
    pub pat: Option<String>,
    /// Logins whose comments count as maintainer responses
    pub maintainers: Option<Vec<String>>,
    /// REST API root, for GitHub Enterprise. Defaults to api.github.com.
    pub api_url: Option<String>,
}

impl Config {
    /// Load configuration from the current directory.
    /// Returns default config if neither file exists.
    pub fn load() -> Result<Config, ConfigError> {
        let toml_path = Path::new(TOML_CONFIG);
        let legacy_path = Path::new(LEGACY_CONFIG);
        if toml_path.exists() {
            Self::load_from(toml_path)
        } else if legacy_path.exists() {
            Self::load_key_value(legacy_path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = read(path)?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_key_value(path: &Path) -> Result<Config, ConfigError> {
        let contents = read(path)?;
        Self::parse_key_value(&contents)
    }

    /// Parse `key=value` lines. Unknown keys are ignored, blank lines skipped.
    pub fn parse_key_value(contents: &str) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        for (i, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Malformed {
                line: i + 1,
                content: raw.to_string(),
            })?;
            let value = value.trim().to_string();
            match key.trim() {
                "org" => config.org = Some(value),
                "repo" => config.repo = Some(value),
                "pat" => config.pat = Some(value),
                "api_url" => config.api_url = Some(value),
                "maintainers" => {
                    config.maintainers = Some(value.split(',').map(str::to_string).collect())
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Resolve the token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn token(&self) -> Option<String> {
        self.pat
            .clone()
            .filter(|pat| !pat.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    pub fn api_base(&self) -> &str {
        self.api_url.as_deref().filter(|url| !url.is_empty()).unwrap_or(API_BASE)
    }

    /// Maintainer logins, or None when no maintainers are configured.
    pub fn maintainer_set(&self) -> Option<MaintainerSet> {
        let set: HashSet<String> = self
            .maintainers
            .as_ref()?
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        (!set.is_empty()).then_some(set)
    }

    /// The target repository: an explicit `org/repo` wins over the config file.
    pub fn repository(&self, explicit: Option<&str>) -> Result<Repository, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Repository::parse(path)?);
        }
        let org = self.org.as_deref().ok_or(ConfigError::MissingKey("org"))?;
        let repo = self.repo.as_deref().ok_or(ConfigError::MissingKey("repo"))?;
        Ok(Repository::new(org, repo)?)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}
