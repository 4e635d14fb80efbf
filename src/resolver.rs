//! Package version resolution.
//!
//! The planner only sees the [`VersionSource`] trait; the production
//! implementation asks PyPI's JSON API for each package's current release
//! and memoizes the answers for the rest of the run. Lookup failures are
//! fatal to the caller: silently keeping a stale pin would defeat the whole
//! tool.

use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const PYPI_BASE_URL: &str = "https://pypi.org/pypi";

/// Maps a package name to its currently recommended version.
pub trait VersionSource {
    /// Resolution failure for an unmonitored/unknown package must surface as
    /// [`ResolveError::UnknownPackage`]; implementations never substitute a
    /// stale or guessed version.
    fn lookup(&self, package: &str) -> Result<String, ResolveError>;
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no known version for package `{0}`")]
    UnknownPackage(String),

    #[error("version lookup for `{package}` failed: {source}")]
    Http {
        package: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to construct HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Normalizes a package name the way the index does: lowercase, with every
/// run of `-`, `_` and `.` collapsed to a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_run {
                out.push('-');
            }
            in_run = true;
        } else {
            in_run = false;
            out.extend(ch.to_lowercase());
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    info: ProjectInfo,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    version: String,
}

/// PyPI-backed version source with a per-run cache.
///
/// Requests are blocking; the tool is synchronous end to end and the handful
/// of distinct packages in a hook config does not justify more machinery.
pub struct PypiClient {
    http: reqwest::blocking::Client,
    cache: RefCell<HashMap<String, String>>,
}

impl PypiClient {
    pub fn new() -> Result<Self, ResolveError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(ResolveError::Client)?;
        Ok(Self {
            http,
            cache: RefCell::new(HashMap::new()),
        })
    }

    fn fetch(&self, package: &str) -> Result<String, ResolveError> {
        let url = format!("{PYPI_BASE_URL}/{package}/json");
        let http_err = |source| ResolveError::Http {
            package: package.to_string(),
            source,
        };

        let response = self.http.get(&url).send().map_err(http_err)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::UnknownPackage(package.to_string()));
        }
        let response = response.error_for_status().map_err(http_err)?;
        let project: ProjectResponse = response.json().map_err(http_err)?;
        Ok(project.info.version)
    }
}

impl VersionSource for PypiClient {
    fn lookup(&self, package: &str) -> Result<String, ResolveError> {
        let name = normalize_name(package);
        if let Some(version) = self.cache.borrow().get(&name) {
            return Ok(version.clone());
        }
        let version = self.fetch(&name)?;
        self.cache.borrow_mut().insert(name, version.clone());
        Ok(version)
    }
}

/// Fixed name-to-version mapping. Used by tests and available for offline
/// runs where the caller already knows the wanted versions.
#[derive(Debug, Default, Clone)]
pub struct StaticVersions {
    versions: HashMap<String, String>,
}

impl StaticVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut versions = Self::new();
        for (package, version) in pairs {
            versions.insert(package, version);
        }
        versions
    }

    /// Reads a `name=version` listing, one pair per line. Blank lines and
    /// `#` comments are ignored, and the pin spelling `name==version` is
    /// tolerated.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut versions = Self::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((package, version)) = line.split_once('=') {
                let version = version.strip_prefix('=').unwrap_or(version);
                versions.insert(package.trim(), version.trim());
            }
        }
        Ok(versions)
    }

    pub fn insert(&mut self, package: &str, version: &str) {
        self.versions
            .insert(normalize_name(package), version.to_string());
    }
}

impl VersionSource for StaticVersions {
    fn lookup(&self, package: &str) -> Result<String, ResolveError> {
        let name = normalize_name(package);
        self.versions
            .get(&name)
            .cloned()
            .ok_or(ResolveError::UnknownPackage(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Flake8_Bugbear"), "flake8-bugbear");
        assert_eq!(normalize_name("flake8.bugbear"), "flake8-bugbear");
        assert_eq!(normalize_name("a-_-b"), "a-b");
        assert_eq!(normalize_name("plain"), "plain");
    }

    #[test]
    fn test_static_versions_lookup_is_normalized() {
        let versions = StaticVersions::from_pairs([("Flake8-Bugbear", "24.2.6")]);
        assert_eq!(versions.lookup("flake8_bugbear").unwrap(), "24.2.6");
    }

    #[test]
    fn test_static_versions_load_parses_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versions.txt");
        std::fs::write(
            &path,
            "# overrides for offline runs\nflake8=3.9.2\nFlake8-Bugbear==24.2.6\n\n",
        )
        .unwrap();

        let versions = StaticVersions::load(&path).unwrap();
        assert_eq!(versions.lookup("flake8").unwrap(), "3.9.2");
        assert_eq!(versions.lookup("flake8_bugbear").unwrap(), "24.2.6");
    }

    #[test]
    fn test_static_versions_unknown_package() {
        let versions = StaticVersions::new();
        let err = versions.lookup("missing").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownPackage(name) if name == "missing"));
    }

    #[test]
    #[ignore] // Requires network access to pypi.org
    fn test_pypi_lookup_flake8() {
        let client = PypiClient::new().unwrap();
        let version = client.lookup("flake8").unwrap();
        assert!(!version.is_empty());
        // Second lookup is served from the cache; it must agree.
        assert_eq!(client.lookup("Flake8").unwrap(), version);
    }

    #[test]
    #[ignore] // Requires network access to pypi.org
    fn test_pypi_unknown_package() {
        let client = PypiClient::new().unwrap();
        let err = client
            .lookup("pinpatch-no-such-package-zq19")
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownPackage(_)));
    }
}
