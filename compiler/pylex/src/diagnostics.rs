//! Diagnostics interface and status codes.
//!
//! The tokenizer never aborts: problems are reported through an
//! [`ErrorCallback`] the caller supplies, recorded in the tokenizer's
//! [`Status`], and reflected in the returned token (`ErrorToken` with the
//! message as metadata). Construction-time decoding failures are the one
//! exception; those come back as a [`DecodeError`] `Result`.

use pylex_core::charset::DecodeIssue;
use pylex_core::SourceRange;
use thiserror::Error;

/// Tokenizer state after the most recent token.
///
/// `Ok` means scanning can continue. Everything else is terminal for the
/// current input, with the specific value telling the caller what
/// happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// End of input reached normally.
    Eof,
    /// A syntax error was reported; the error token's metadata has the
    /// message.
    SyntaxError,
    /// Tabs and spaces used inconsistently in indentation.
    TabsSpacesInconsistent,
    /// More than the supported number of indentation levels.
    TooDeepIndentation,
    /// A dedent did not land on any enclosing indentation level.
    DedentInvalid,
    /// A backslash continuation was not followed by a newline.
    LineContinuationError,
    /// Interactive input ended with incomplete-source reporting disabled.
    InteractiveStop,
}

/// Classification for [`ErrorCallback::on_error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Indentation,
    Encoding,
}

/// Classification for [`ErrorCallback::on_warning`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    Syntax,
    Deprecation,
}

/// Receiver for tokenizer diagnostics.
///
/// Implementations decide what to do with reports: collect them, print
/// them, or drop them. The tokenizer calls `report_incomplete_source`
/// when interactive input runs dry mid-construct; a REPL uses it to
/// prompt for a continuation line.
pub trait ErrorCallback {
    fn report_incomplete_source(&mut self, line: i32);

    fn on_error(&mut self, kind: ErrorKind, range: SourceRange, message: &str);

    fn on_warning(&mut self, kind: WarningKind, range: SourceRange, message: &str);
}

/// An [`ErrorCallback`] that drops every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentCallback;

impl ErrorCallback for SilentCallback {
    fn report_incomplete_source(&mut self, _line: i32) {}

    fn on_error(&mut self, _kind: ErrorKind, _range: SourceRange, _message: &str) {}

    fn on_warning(&mut self, _kind: WarningKind, _range: SourceRange, _message: &str) {}
}

/// Why raw byte input could not be turned into source text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid UTF-8 at byte offset {pos}")]
    InvalidUtf8 { pos: usize },
    #[error("unknown encoding: {0}")]
    UnsupportedEncoding(Box<str>),
}

impl From<DecodeIssue> for DecodeError {
    fn from(issue: DecodeIssue) -> Self {
        match issue {
            DecodeIssue::InvalidUtf8 { pos } => Self::InvalidUtf8 { pos },
            DecodeIssue::UnsupportedEncoding(name) => Self::UnsupportedEncoding(name),
        }
    }
}
