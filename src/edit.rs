use std::collections::HashMap;
use thiserror::Error;

/// A pin string annotated with its position in the original file text.
///
/// `line` is 0-indexed. `column` is the byte offset of the pin's first
/// character within that line. Both always refer to the file as it was
/// parsed; they are never recomputed after an edit on the same line shifts
/// surrounding text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedPin {
    /// The pin text exactly as it appears in the source, e.g. `flake8==3.9.0`.
    pub value: String,
    /// Line index in the original file, 0-based.
    pub line: usize,
    /// Byte offset of the pin within its line, 0-based.
    pub column: usize,
}

impl LocatedPin {
    pub fn new(value: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            value: value.into(),
            line,
            column,
        }
    }
}

/// One planned substitution: replace `old.value` at its recorded span with
/// `new_value`.
///
/// An edit is a record of both the expected text and its location, so two
/// identical pin strings elsewhere in the file can never be confused with
/// this one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a PinEdit does nothing until apply_edits() is called"]
pub struct PinEdit {
    pub old: LocatedPin,
    pub new_value: String,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("edit targets line {line} but the file has {line_count} lines")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("edit span [{begin}, {end}) does not fit line {line} (length {len})")]
    InvalidSpan {
        line: usize,
        begin: i64,
        end: i64,
        len: usize,
    },

    #[error("expected `{expected}` at {line}:{column}, found `{found}`")]
    PinMismatch {
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },
}

/// Orders edits ascending by `(line, column)` in the original file.
///
/// This establishes the patcher's ordering precondition no matter what order
/// hooks and repos were discovered in the document. The sort is stable, so
/// edits at identical positions keep their discovery order.
pub fn sort_edits(edits: &mut [PinEdit]) {
    edits.sort_by_key(|edit| (edit.old.line, edit.old.column));
}

/// Applies position-ordered edits to the file's lines.
///
/// `lines` must retain their own terminators so that joining them reproduces
/// the file byte for byte. Each edit splices its line at
/// `[column + shift, column + shift + old.value.len())`, where `shift` is the
/// cumulative byte delta of earlier edits on the same line. Edits on a shared
/// line must arrive in ascending column order (see [`sort_edits`]); ordering
/// is the caller's responsibility, but the current text at every span is
/// still checked against the recorded pin so a violated precondition fails
/// loudly instead of corrupting the output.
///
/// Returns the full patched line sequence, byte-identical to the original
/// everywhere outside edited spans.
pub fn apply_edits(lines: &[&str], edits: &[PinEdit]) -> Result<Vec<String>, EditError> {
    let mut patched: Vec<String> = lines.iter().map(|line| (*line).to_string()).collect();
    let mut shifts: HashMap<usize, i64> = HashMap::new();

    for edit in edits {
        let line_count = patched.len();
        let text = patched
            .get_mut(edit.old.line)
            .ok_or(EditError::LineOutOfRange {
                line: edit.old.line,
                line_count,
            })?;
        let shift = shifts.entry(edit.old.line).or_insert(0);

        let begin = edit.old.column as i64 + *shift;
        let end = begin + edit.old.value.len() as i64;
        if begin < 0
            || end > text.len() as i64
            || !text.is_char_boundary(begin as usize)
            || !text.is_char_boundary(end as usize)
        {
            return Err(EditError::InvalidSpan {
                line: edit.old.line,
                begin,
                end,
                len: text.len(),
            });
        }
        let (begin, end) = (begin as usize, end as usize);

        let found = &text[begin..end];
        if found != edit.old.value {
            return Err(EditError::PinMismatch {
                line: edit.old.line,
                column: edit.old.column,
                expected: edit.old.value.clone(),
                found: found.to_string(),
            });
        }

        text.replace_range(begin..end, &edit.new_value);
        *shift += edit.new_value.len() as i64 - edit.old.value.len() as i64;
    }

    Ok(patched)
}
