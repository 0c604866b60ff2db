//! Python-syntax tokenizer with CPython-compatible semantics.
//!
//! A single-pass, pull-based tokenizer: construct a [`Tokenizer`] over
//! source text (or raw bytes, or a line supplier for interactive input)
//! and call [`Tokenizer::next_token`] until it returns
//! [`TokenKind::EndMarker`].
//!
//! The tokenizer reproduces the reference behavior precisely: block
//! structure is reported through `Indent`/`Dedent` tokens driven by a pair
//! of indentation stacks (tab = 8 and tab = 1 widths), f-strings are lexed
//! through a stack of lexing modes that interleave literal middles with
//! normally-tokenized embedded expressions, and every token carries a
//! [`SourceRange`] with 1-based lines and 0-based code-point columns.
//!
//! Failures are values: scanning problems surface as `ErrorToken` tokens
//! plus a [`Status`] code and a report through the [`ErrorCallback`]; the
//! tokenizer itself never panics.

mod diagnostics;
mod flags;
mod mode;
mod token;
mod tokenizer;

pub use diagnostics::{DecodeError, ErrorCallback, ErrorKind, SilentCallback, Status, WarningKind};
pub use flags::Flags;
pub use pylex_core::SourceRange;
pub use token::{Token, TokenKind};
pub use tokenizer::{Readline, Tokenizer};
