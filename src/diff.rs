//! Unified diff rendering for check mode.

use similar::TextDiff;

/// Renders a unified diff of `original` against `patched`, labeling both
/// sides with `name` so the output reads as the same file before and after
/// rather than a pair of temporary paths. Returns an empty string when the
/// contents are identical.
pub fn render_unified(original: &str, patched: &str, name: &str) -> String {
    let diff = TextDiff::from_lines(original, patched);
    let mut unified = diff.unified_diff();
    unified.context_radius(3).header(name, name);
    unified.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_renders_nothing() {
        assert_eq!(render_unified("a\nb\n", "a\nb\n", "file.yaml"), "");
    }

    #[test]
    fn test_changed_line_shows_both_sides() {
        let original = "repos:\n  - \"flake8==3.9.0\"\n";
        let patched = "repos:\n  - \"flake8==3.9.2\"\n";
        let rendered = render_unified(original, patched, ".pre-commit-config.yaml");

        assert!(rendered.starts_with("--- .pre-commit-config.yaml\n+++ .pre-commit-config.yaml\n"));
        assert!(rendered.contains("-  - \"flake8==3.9.0\""));
        assert!(rendered.contains("+  - \"flake8==3.9.2\""));
    }
}
