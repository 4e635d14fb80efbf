//! Allow-list configuration: which repos and hooks are eligible for updates.
//!
//! Only hooks whose `additional_dependencies` are plain PyPI packages can be
//! updated safely, so the tool works from an allow-list of known
//! `(repository, hook id)` pairs. Built-in defaults cover well-known hook
//! repos; a `.pinpatch.yaml` in the working directory extends them. The
//! loaded value is constructed once at start-of-run and passed down
//! explicitly to everything that needs it.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Optional user configuration, read from the working directory.
pub const ALLOWLIST_FILE_NAME: &str = ".pinpatch.yaml";

#[derive(Debug, Deserialize)]
struct RawAllowlist {
    #[serde(default)]
    repos: Vec<RawRepo>,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    repo: String,
    #[serde(default)]
    hooks: Vec<RawHook>,
}

#[derive(Debug, Deserialize)]
struct RawHook {
    id: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid allow-list in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Watched repo/hook pairs, keyed by normalized repository URL.
#[derive(Debug, Clone)]
pub struct Allowlist {
    repos: HashMap<String, HashSet<String>>,
}

impl Allowlist {
    /// Built-in defaults: hook repos whose additional dependencies are
    /// plugins published on PyPI.
    pub fn builtin() -> Self {
        let mut allowlist = Self {
            repos: HashMap::new(),
        };
        allowlist.add("https://github.com/pycqa/flake8", "flake8");
        allowlist.add("https://github.com/pre-commit/mirrors-mypy", "mypy");
        allowlist.add("https://github.com/adamchainz/blacken-docs", "blacken-docs");
        allowlist
    }

    /// The defaults merged with `.pinpatch.yaml` from `dir`, when present.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut allowlist = Self::builtin();

        let path = dir.join(ALLOWLIST_FILE_NAME);
        if !path.is_file() {
            return Ok(allowlist);
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let raw: RawAllowlist =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?;

        for repo in raw.repos {
            for hook in repo.hooks {
                allowlist.add(&repo.repo, &hook.id);
            }
        }

        Ok(allowlist)
    }

    fn add(&mut self, repo_url: &str, hook_id: &str) {
        self.repos
            .entry(normalize_repo_url(repo_url))
            .or_default()
            .insert(hook_id.to_string());
    }

    /// Hook ids watched for `repo_url`, or `None` when the repo is unlisted.
    pub fn hooks_for(&self, repo_url: &str) -> Option<&HashSet<String>> {
        self.repos.get(&normalize_repo_url(repo_url))
    }
}

/// Lowercases the URL and strips one trailing `.git` so clone-URL variants
/// of the same repository compare equal.
pub fn normalize_repo_url(url: &str) -> String {
    let url = url.to_lowercase();
    url.strip_suffix(".git").unwrap_or(&url).to_string()
}
