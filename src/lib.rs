//! Pinpatch: location-aware updating of pre-commit `additional_dependencies`.
//!
//! Rewrites `name==version` pins inside `.pre-commit-config.yaml` to the
//! versions currently published on PyPI while preserving every other byte of
//! the file: comments, formatting, key order, and whitespace all survive
//! untouched.
//!
//! # Architecture
//!
//! The pipeline is a straight line. The located parser loads the document
//! with source positions; the planner turns stale pins into [`PinEdit`]s;
//! the aggregator sorts them into file order; the patcher splices them into
//! the original lines with per-line offset tracking; and the result is
//! either rendered as a unified diff (check mode) or written back atomically.
//!
//! # Safety
//!
//! - Every edit verifies the text at its span before splicing
//! - Pin positions are byte offsets anchored against the raw source line
//! - Atomic file writes (tempfile + fsync + rename)
//! - Resolution failures abort before anything reaches disk
//!
//! # Example
//!
//! ```
//! use pinpatch::{apply_edits, parse_document, plan_hook, sort_edits, StaticVersions};
//!
//! let source = "\
//! repos:
//! -   repo: https://github.com/pycqa/flake8
//!     hooks:
//!     -   id: flake8
//!         additional_dependencies: [\"flake8-bugbear==22.1.11\"]
//! ";
//! let document = parse_document(source).unwrap();
//! let versions = StaticVersions::from_pairs([("flake8-bugbear", "24.2.6")]);
//!
//! let mut edits = Vec::new();
//! for repo in &document.repos {
//!     for hook in &repo.hooks {
//!         edits.extend(plan_hook(hook, &versions).unwrap());
//!     }
//! }
//! sort_edits(&mut edits);
//!
//! let lines: Vec<&str> = source.split_inclusive('\n').collect();
//! let patched = apply_edits(&lines, &edits).unwrap();
//! assert!(patched.concat().contains("flake8-bugbear==24.2.6"));
//! ```

pub mod config;
pub mod diff;
pub mod edit;
pub mod plan;
pub mod resolver;
pub mod write;
pub mod yaml;

// Re-exports
pub use config::{Allowlist, ConfigError};
pub use edit::{apply_edits, sort_edits, EditError, LocatedPin, PinEdit};
pub use plan::{plan_hook, split_pin};
pub use resolver::{PypiClient, ResolveError, StaticVersions, VersionSource};
pub use write::{NewlineStyle, WriteError};
pub use yaml::{
    parse_document, HookConfig, ParseError, PrecommitConfig, RepoConfig, CONFIG_FILE_NAME,
};
