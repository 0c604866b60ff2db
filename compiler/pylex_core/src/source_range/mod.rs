//! Source position ranges.
//!
//! Lines are 1-based, columns are 0-based and counted in code points (not
//! bytes). A column of `-1` is a deliberate out-of-band value used for
//! synthetic tokens such as the end-of-input marker, so the fields are
//! signed.

/// A half-open range of source positions attached to every token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceRange {
    /// 1-based line of the first code point.
    pub start_line: i32,
    /// 0-based code-point column of the first code point, or `-1`.
    pub start_column: i32,
    /// 1-based line just past the last code point.
    pub end_line: i32,
    /// 0-based code-point column just past the last code point, or `-1`.
    pub end_column: i32,
}

impl SourceRange {
    pub fn new(start_line: i32, start_column: i32, end_line: i32, end_column: i32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Returns a copy of this range with a new end position.
    ///
    /// Used to extend a recorded start position to the tokenizer's current
    /// position once the covered region is known.
    pub fn with_end(self, end_line: i32, end_column: i32) -> Self {
        Self {
            end_line,
            end_column,
            ..self
        }
    }

    /// Returns this range shifted by the start of an enclosing range.
    ///
    /// Line numbers shift on every line; columns shift only on line 1,
    /// which is the only line that can sit mid-line inside the enclosing
    /// source (re-tokenized sub-snippets).
    pub fn shifted_by(self, start_line: i32, start_column: i32) -> Self {
        let mut r = self;
        if r.start_line == 1 {
            r.start_column += start_column;
        }
        if r.end_line == 1 {
            r.end_column += start_column;
        }
        r.start_line += start_line;
        r.end_line += start_line;
        r
    }
}

/// Size assertion: four i32 fields, Copy everywhere.
const _: () = assert!(std::mem::size_of::<SourceRange>() == 16);

#[cfg(test)]
mod tests;
