//! Lexing mode stack for f-strings.
//!
//! The tokenizer always has `Mode::Regular` at the bottom of its mode
//! stack. Each `FSTRING_START` pushes a `Mode::FString` entry; the entry
//! tracks the quote that will terminate the string and a stack of open
//! embedded expressions. While the top entry is an f-string with no open
//! expression (or whose innermost expression is in its format spec), the
//! tokenizer scans literal middle text; otherwise it tokenizes the
//! expression through the regular path.

use smallvec::SmallVec;

/// One open `{...}` expression inside an f-string.
#[derive(Clone, Debug)]
pub(crate) struct ExprFrame {
    /// Bracket stack depth when the expression opened. A `}` closes the
    /// expression only when the depth is back at this base, and a `:` at
    /// this depth starts the format spec.
    pub paren_base: usize,
    /// Set once the top-level `:` of this expression has been consumed;
    /// the text after it is scanned as middle text again.
    pub in_format_spec: bool,
    /// Code-point offset just past the opening `{`, for debug-`=` text
    /// capture.
    pub start: usize,
}

/// State for one f-string being lexed.
#[derive(Clone, Debug)]
pub(crate) struct FStringEntry {
    /// Terminating quote character (`'` or `"`).
    pub quote: i32,
    /// 1 or 3.
    pub quote_size: u8,
    /// `rf`/`fr` prefix: backslash is literal in middle text.
    pub raw: bool,
    /// Offset of the start of the `FSTRING_START` token (the prefix).
    pub start: usize,
    /// Line the f-string started on, for unterminated-string reporting.
    pub first_line: i32,
    /// Line start index at the start of the f-string.
    pub multi_line_start: usize,
    /// Open embedded expressions, innermost last.
    pub exprs: SmallVec<[ExprFrame; 2]>,
}

/// A lexing mode.
#[derive(Clone, Debug)]
pub(crate) enum Mode {
    Regular,
    FString(FStringEntry),
}

impl Mode {
    pub fn as_fstring_mut(&mut self) -> Option<&mut FStringEntry> {
        match self {
            Mode::Regular => None,
            Mode::FString(entry) => Some(entry),
        }
    }

    pub fn as_fstring(&self) -> Option<&FStringEntry> {
        match self {
            Mode::Regular => None,
            Mode::FString(entry) => Some(entry),
        }
    }
}
