//! Token model and operator dispatch tables.
//!
//! `TokenKind` is the closed set of token types the tokenizer can emit.
//! Keywords are not distinguished here: apart from the `async`/`await`
//! pair (which the tokenizer may need to classify itself, see the async
//! lookahead), keyword recognition belongs to the parser, so `for` and
//! `while` are plain `Name` tokens.
//!
//! The `one_char`/`two_chars`/`three_chars` functions are the fixed
//! operator dispatch tables. The tokenizer tries the longest match first
//! and falls back to the shorter one.

use pylex_core::SourceRange;

/// Token types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    EndMarker,
    Name,
    Number,
    String,
    FStringStart,
    FStringMiddle,
    FStringEnd,
    Newline,
    Indent,
    Dedent,

    LPar,
    RPar,
    LSqb,
    RSqb,
    Colon,
    Comma,
    Semi,
    Plus,
    Minus,
    Star,
    Slash,
    VBar,
    Amper,
    Less,
    Greater,
    Equal,
    Dot,
    Percent,
    LBrace,
    RBrace,
    EqEqual,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Tilde,
    Circumflex,
    LeftShift,
    RightShift,
    DoubleStar,
    PlusEqual,
    MinEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    AmperEqual,
    VBarEqual,
    CircumflexEqual,
    LeftShiftEqual,
    RightShiftEqual,
    DoubleStarEqual,
    DoubleSlash,
    DoubleSlashEqual,
    At,
    AtEqual,
    RArrow,
    Ellipsis,
    ColonEqual,
    Exclamation,

    Await,
    Async,
    TypeIgnore,
    TypeComment,

    /// Comment text. Only emitted under [`Flags::EXTRA_TOKENS`].
    ///
    /// [`Flags::EXTRA_TOKENS`]: crate::Flags::EXTRA_TOKENS
    Comment,
    /// Non-logical newline (blank line or inside brackets). Only emitted
    /// under `EXTRA_TOKENS`.
    Nl,

    ErrorToken,
}

/// A single token.
///
/// Offsets are code-point indices into the tokenizer's input buffer; the
/// text itself is recovered through `Tokenizer::token_text`. `metadata`
/// carries out-of-band text: the error message on an `ErrorToken`, or the
/// captured expression text on the `=` of an f-string debug expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Bracket nesting level at the point of emission.
    pub level: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub range: SourceRange,
    pub metadata: Option<Box<str>>,
}

/// Single-character operator dispatch.
pub(crate) fn one_char(c: i32) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match u8::try_from(c).ok()? {
        b'%' => Percent,
        b'&' => Amper,
        b'(' => LPar,
        b')' => RPar,
        b'*' => Star,
        b'+' => Plus,
        b',' => Comma,
        b'-' => Minus,
        b'.' => Dot,
        b'/' => Slash,
        b':' => Colon,
        b';' => Semi,
        b'<' => Less,
        b'=' => Equal,
        b'>' => Greater,
        b'@' => At,
        b'[' => LSqb,
        b']' => RSqb,
        b'^' => Circumflex,
        b'{' => LBrace,
        b'|' => VBar,
        b'}' => RBrace,
        b'~' => Tilde,
        b'!' => Exclamation,
        _ => return None,
    })
}

/// Two-character operator dispatch.
pub(crate) fn two_chars(c1: i32, c2: i32) -> Option<TokenKind> {
    use TokenKind::*;
    let pair = (u8::try_from(c1).ok()?, u8::try_from(c2).ok()?);
    Some(match pair {
        (b'!', b'=') => NotEqual,
        (b'%', b'=') => PercentEqual,
        (b'&', b'=') => AmperEqual,
        (b'*', b'*') => DoubleStar,
        (b'*', b'=') => StarEqual,
        (b'+', b'=') => PlusEqual,
        (b'-', b'=') => MinEqual,
        (b'-', b'>') => RArrow,
        (b'/', b'/') => DoubleSlash,
        (b'/', b'=') => SlashEqual,
        (b':', b'=') => ColonEqual,
        (b'<', b'<') => LeftShift,
        (b'<', b'=') => LessEqual,
        (b'<', b'>') => NotEqual,
        (b'=', b'=') => EqEqual,
        (b'>', b'=') => GreaterEqual,
        (b'>', b'>') => RightShift,
        (b'@', b'=') => AtEqual,
        (b'^', b'=') => CircumflexEqual,
        (b'|', b'=') => VBarEqual,
        _ => return None,
    })
}

/// Three-character operator dispatch.
pub(crate) fn three_chars(c1: i32, c2: i32, c3: i32) -> Option<TokenKind> {
    use TokenKind::*;
    let triple = (
        u8::try_from(c1).ok()?,
        u8::try_from(c2).ok()?,
        u8::try_from(c3).ok()?,
    );
    Some(match triple {
        (b'*', b'*', b'=') => DoubleStarEqual,
        (b'/', b'/', b'=') => DoubleSlashEqual,
        (b'<', b'<', b'=') => LeftShiftEqual,
        (b'>', b'>', b'=') => RightShiftEqual,
        (b'.', b'.', b'.') => Ellipsis,
        _ => return None,
    })
}

#[cfg(test)]
mod tests;
