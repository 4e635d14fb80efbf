//! Location-aware loading of `.pre-commit-config.yaml`.
//!
//! The file is parsed with `marked-yaml`, which annotates every node with
//! its source position, and lowered into the small typed document the
//! planner consumes. Pin scalars are then anchored against the raw line
//! text: the parser's marker can sit on an opening quote rather than the
//! pin itself, and the patcher needs the byte offset of the exact text it
//! will replace.

use crate::edit::LocatedPin;
use marked_yaml::types::MarkedSequenceNode;
use thiserror::Error;

/// Canonical name of the file this tool rewrites.
pub const CONFIG_FILE_NAME: &str = ".pre-commit-config.yaml";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] marked_yaml::LoadError),

    #[error("expected {key} to be a {expected}")]
    UnexpectedShape {
        key: &'static str,
        expected: &'static str,
    },
}

/// The parsed configuration document: an ordered list of hook repositories.
#[derive(Debug, Clone)]
pub struct PrecommitConfig {
    pub repos: Vec<RepoConfig>,
}

/// One entry of the document's `repos` list.
#[derive(Debug, Clone)]
pub struct RepoConfig {
    /// The repository URL exactly as written in the document.
    pub url: String,
    pub hooks: Vec<HookConfig>,
}

/// One hook declared under a repo, with its located dependency pins.
#[derive(Debug, Clone)]
pub struct HookConfig {
    pub id: String,
    pub additional_dependencies: Vec<LocatedPin>,
}

/// Parses the document and locates every `additional_dependencies` entry.
///
/// The top level must be a mapping with a `repos` sequence; each repo needs
/// a `repo` URL and each hook an `id`. `hooks` and `additional_dependencies`
/// default to empty. A dependency scalar whose text cannot be found verbatim
/// on its source line (block scalars, multi-line strings) is dropped here:
/// it can never be spliced safely, and such entries are not pins anyway.
pub fn parse_document(source: &str) -> Result<PrecommitConfig, ParseError> {
    let root = marked_yaml::parse_yaml(0, source)?;
    let mapping = root.as_mapping().ok_or(ParseError::UnexpectedShape {
        key: "the document",
        expected: "mapping",
    })?;
    let repo_nodes = mapping
        .get_sequence("repos")
        .ok_or(ParseError::UnexpectedShape {
            key: "repos",
            expected: "sequence",
        })?;

    let lines: Vec<&str> = source.split_inclusive('\n').collect();

    let mut repos = Vec::new();
    for node in repo_nodes.iter() {
        let repo = node.as_mapping().ok_or(ParseError::UnexpectedShape {
            key: "repos entry",
            expected: "mapping",
        })?;
        let url = repo
            .get_scalar("repo")
            .ok_or(ParseError::UnexpectedShape {
                key: "repo",
                expected: "string",
            })?
            .as_str()
            .to_string();

        let mut hooks = Vec::new();
        if let Some(hook_nodes) = repo.get_sequence("hooks") {
            for hook_node in hook_nodes.iter() {
                let hook = hook_node.as_mapping().ok_or(ParseError::UnexpectedShape {
                    key: "hooks entry",
                    expected: "mapping",
                })?;
                let id = hook
                    .get_scalar("id")
                    .ok_or(ParseError::UnexpectedShape {
                        key: "id",
                        expected: "string",
                    })?
                    .as_str()
                    .to_string();
                let additional_dependencies = match hook.get_sequence("additional_dependencies") {
                    Some(deps) => located_pins(deps, &lines),
                    None => Vec::new(),
                };
                hooks.push(HookConfig {
                    id,
                    additional_dependencies,
                });
            }
        }

        repos.push(RepoConfig { url, hooks });
    }

    Ok(PrecommitConfig { repos })
}

/// Lowers a dependency sequence into located pins, skipping entries that are
/// not scalars or cannot be anchored to a source line.
fn located_pins(deps: &MarkedSequenceNode, lines: &[&str]) -> Vec<LocatedPin> {
    let mut pins = Vec::new();
    for dep in deps.iter() {
        let Some(scalar) = dep.as_scalar() else {
            continue;
        };
        let Some(marker) = scalar.span().start() else {
            continue;
        };
        // Markers are 1-indexed.
        let line = marker.line().saturating_sub(1);
        let Some(text) = lines.get(line) else {
            continue;
        };
        let Some(column) = anchor_column(text, marker.column().saturating_sub(1), scalar.as_str())
        else {
            continue;
        };
        pins.push(LocatedPin::new(scalar.as_str(), line, column));
    }
    pins
}

/// Resolves a marker column (counted in characters) to the byte offset of
/// `value` within `line`.
///
/// The search starts at the marker and takes the first verbatim occurrence at
/// or after it, which steps over the opening quote of quoted scalars.
/// Duplicate pin strings on one line stay distinct because each marker starts
/// at or past its own element. Returns `None` when the scalar text does not
/// appear verbatim on the line.
fn anchor_column(line: &str, marker_column: usize, value: &str) -> Option<usize> {
    let start = line
        .char_indices()
        .nth(marker_column)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    line[start..].find(value).map(|found| start + found)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# pre-commit hooks
repos:
-   repo: https://github.com/pycqa/flake8
    rev: 6.0.0
    hooks:
    -   id: flake8
        additional_dependencies:
        - \"flake8-bugbear==22.1.11\"
        - flake8-comprehensions==3.10.0
-   repo: https://github.com/psf/black
    rev: 23.1.0
    hooks:
    -   id: black
";

    #[test]
    fn test_parses_repos_and_hooks() {
        let document = parse_document(SAMPLE).unwrap();
        assert_eq!(document.repos.len(), 2);
        assert_eq!(document.repos[0].url, "https://github.com/pycqa/flake8");
        assert_eq!(document.repos[0].hooks.len(), 1);
        assert_eq!(document.repos[0].hooks[0].id, "flake8");
        assert!(document.repos[1].hooks[0].additional_dependencies.is_empty());
    }

    #[test]
    fn test_pins_are_anchored_to_their_text_not_the_quote() {
        let document = parse_document(SAMPLE).unwrap();
        let pins = &document.repos[0].hooks[0].additional_dependencies;
        assert_eq!(pins.len(), 2);

        let lines: Vec<&str> = SAMPLE.split_inclusive('\n').collect();
        for pin in pins {
            let line = lines[pin.line];
            assert_eq!(&line[pin.column..pin.column + pin.value.len()], pin.value);
        }
        assert_eq!(pins[0].value, "flake8-bugbear==22.1.11");
        assert_eq!(pins[1].value, "flake8-comprehensions==3.10.0");
    }

    #[test]
    fn test_flow_style_list_locates_every_pin() {
        let source = "\
repos:
-   repo: https://github.com/pycqa/flake8
    hooks:
    -   id: flake8
        additional_dependencies: [a==1.0.0, b==2.0]
";
        let document = parse_document(source).unwrap();
        let pins = &document.repos[0].hooks[0].additional_dependencies;
        assert_eq!(pins.len(), 2);

        let line = source.split_inclusive('\n').nth(4).unwrap();
        assert_eq!(&line[pins[0].column..pins[0].column + 8], "a==1.0.0");
        assert_eq!(&line[pins[1].column..pins[1].column + 6], "b==2.0");
        assert!(pins[0].column < pins[1].column);
    }

    #[test]
    fn test_duplicate_pins_on_one_line_get_distinct_columns() {
        let source = "\
repos:
-   repo: https://github.com/pycqa/flake8
    hooks:
    -   id: flake8
        additional_dependencies: [a==1.0, a==1.0]
";
        let document = parse_document(source).unwrap();
        let pins = &document.repos[0].hooks[0].additional_dependencies;
        assert_eq!(pins.len(), 2);
        assert!(pins[0].column < pins[1].column);
    }

    #[test]
    fn test_missing_repos_is_an_error() {
        let err = parse_document("default_stages: [commit]\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedShape { key: "repos", .. }
        ));
    }

    #[test]
    fn test_scalar_document_is_an_error() {
        // Rejected either by the parser or by the mapping check.
        assert!(parse_document("just a string\n").is_err());
    }

    #[test]
    fn test_anchor_column_steps_over_quotes() {
        let line = "        - \"flake8==3.9.0\"\n";
        // Marker on the opening quote at character 10.
        assert_eq!(anchor_column(line, 10, "flake8==3.9.0"), Some(11));
        // Marker directly on the text.
        assert_eq!(anchor_column(line, 11, "flake8==3.9.0"), Some(11));
    }

    #[test]
    fn test_anchor_column_counts_bytes_after_multibyte_chars() {
        let line = "  # café: x==1.0\n";
        let column = anchor_column(line, 0, "x==1.0").unwrap();
        assert_eq!(&line[column..column + 6], "x==1.0");
    }

    #[test]
    fn test_anchor_column_converts_nonzero_char_markers_to_bytes() {
        // "café" is four characters but five bytes, so every character
        // count past it disagrees with the byte offset by one.
        let line = "  café: [\"x==1.0\"]\n";
        let byte_column = line.find("x==1.0").unwrap();

        // Marker on the opening quote, counted in characters.
        assert_eq!(anchor_column(line, 9, "x==1.0"), Some(byte_column));
        // Marker directly on the pin text.
        assert_eq!(anchor_column(line, 10, "x==1.0"), Some(byte_column));
    }

    #[test]
    fn test_multibyte_text_before_a_pin_on_its_line() {
        let source = "\
repos:
-   repo: https://github.com/pycqa/flake8
    hooks:
    -   {id: café, additional_dependencies: [\"x==1.0\"]}
";
        let document = parse_document(source).unwrap();
        let pins = &document.repos[0].hooks[0].additional_dependencies;
        assert_eq!(pins.len(), 1);

        let line = source.split_inclusive('\n').nth(3).unwrap();
        assert_eq!(
            &line[pins[0].column..pins[0].column + pins[0].value.len()],
            "x==1.0"
        );
    }

    #[test]
    fn test_anchor_column_misses_cleanly() {
        assert_eq!(anchor_column("short line\n", 4, "absent==1.0"), None);
    }
}
