//! Newline-convention handling and atomic persistence of patched content.
//!
//! The rewritten file should not change its line-terminator style just
//! because the tool ran on a different platform: a consistent style is
//! reused, a mixed file resolves to the style seen first, and only a file
//! with no terminator at all falls back to the platform default.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A line-terminator style observed in (or chosen for) a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewlineStyle {
    Lf,
    CrLf,
    Cr,
}

impl NewlineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::CrLf => "\r\n",
            NewlineStyle::Cr => "\r",
        }
    }

    /// The host platform's default terminator, used only for files that
    /// carry none of their own.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            NewlineStyle::CrLf
        } else {
            NewlineStyle::Lf
        }
    }

    /// Every terminator style appearing in `text`, in first-encountered
    /// order, each style reported once.
    pub fn observe(text: &str) -> Vec<NewlineStyle> {
        let bytes = text.as_bytes();
        let mut seen = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let style = match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    Some(NewlineStyle::CrLf)
                }
                b'\r' => {
                    i += 1;
                    Some(NewlineStyle::Cr)
                }
                b'\n' => {
                    i += 1;
                    Some(NewlineStyle::Lf)
                }
                _ => {
                    i += 1;
                    None
                }
            };
            if let Some(style) = style {
                if !seen.contains(&style) {
                    seen.push(style);
                }
            }
        }
        seen
    }

    /// Picks the style for rewriting: nothing observed falls back to the
    /// platform default; otherwise the first-encountered style wins, which
    /// also covers the single-consistent-style case.
    pub fn choose(observed: &[NewlineStyle]) -> NewlineStyle {
        observed.first().copied().unwrap_or_else(Self::platform_default)
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to persist {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Joins patched lines, rewriting every line terminator to `style`.
///
/// A final line that never had a terminator keeps none.
pub fn render(lines: &[String], style: NewlineStyle) -> String {
    let mut out = String::with_capacity(lines.iter().map(String::len).sum());
    for line in lines {
        let body = strip_terminator(line);
        out.push_str(body);
        if body.len() != line.len() {
            out.push_str(style.as_str());
        }
    }
    out
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
        .unwrap_or(line)
}

/// Atomically replaces `path` with `content`: temp file in the same
/// directory, write, fsync, rename. The target is either fully replaced or
/// left untouched.
pub fn persist(path: &Path, content: &str) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Temp file must live in the target's directory so the final rename
    // stays on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(content.as_bytes()).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}
