//! Low-level source handling for the pylex tokenizer.
//!
//! This crate is standalone: it has no dependencies on other pylex crates,
//! so external tools (highlighters, editor integrations) can use the source
//! model without pulling in the tokenizer itself.
//!
//! It provides three things:
//!
//! - [`CodePointBuffer`]: a growable buffer of Unicode scalar values that
//!   the tokenizer indexes by code point, not by byte. Offsets handed out
//!   by the tokenizer stay valid as the buffer grows (interactive input
//!   appends lines to the same buffer).
//! - [`SourceRange`]: a (line, column) range with 1-based lines and
//!   0-based code-point columns.
//! - [`charset`]: encoding auto-detection for raw byte input, following
//!   the UTF-8 BOM and `coding:` comment rules of PEP 263.

pub mod charset;

mod code_points;
mod source_range;

pub use code_points::CodePointBuffer;
pub use source_range::SourceRange;
