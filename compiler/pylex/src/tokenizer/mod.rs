//! The tokenizer state machine.
//!
//! A direct, single-pass port of the reference tokenizer semantics: a
//! pull model where every call to [`Tokenizer::next_token`] produces
//! exactly one token. Character reads go through `next_char`/`one_back`,
//! which normalize `\r\n` and lone `\r` to `\n` on the fly and defer the
//! line-number bump for a consumed newline until the next read, so that a
//! `NEWLINE` token's range stays on the line it terminates.
//!
//! Line structure: at the start of each logical line the indentation is
//! measured twice, once with tabs rounding to multiples of 8 and once
//! with tabs counting 1. Both widths must order consistently against the
//! indentation stack or the mix of tabs and spaces is rejected. Indents
//! and dedents are queued in `pending_indents` and drained one token per
//! call.
//!
//! F-strings are handled through the mode stack (see [`crate::mode`]):
//! `next_token` first decides whether the current position is literal
//! f-string middle text or regular token territory, then dispatches.

mod fstring;
mod number;

use smallvec::{smallvec, SmallVec};
use tracing::trace;

use pylex_core::{charset, CodePointBuffer, SourceRange};

use crate::diagnostics::{DecodeError, ErrorCallback, ErrorKind, Status, WarningKind};
use crate::flags::Flags;
use crate::mode::{ExprFrame, Mode};
use crate::token::{one_char, three_chars, two_chars, Token, TokenKind};

/// End-of-input marker returned by `next_char`.
pub(crate) const EOF: i32 = -1;

const TABSIZE: i32 = 8;
const MAXINDENT: usize = 100;
const MAXLEVEL: usize = 200;
const MAXFSTRINGLEVEL: usize = 150;

const fn ch(c: char) -> i32 {
    c as i32
}

pub(crate) fn is_ident_start(c: i32) -> bool {
    (c >= ch('a') && c <= ch('z')) || (c >= ch('A') && c <= ch('Z')) || c == ch('_') || c >= 128
}

pub(crate) fn is_ident_char(c: i32) -> bool {
    is_ident_start(c) || (c >= ch('0') && c <= ch('9'))
}

pub(crate) fn is_digit(c: i32) -> bool {
    c >= ch('0') && c <= ch('9')
}

fn to_i32(v: usize) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// One entry of the parallel indentation stacks.
#[derive(Clone, Copy, Debug)]
struct IndentLevel {
    /// Width with tabs rounding up to multiples of [`TABSIZE`].
    col: i32,
    /// Width with tabs counting 1.
    alt: i32,
}

/// One open bracket, with the line it was opened on for mismatch
/// reporting.
#[derive(Clone, Copy, Debug)]
struct ParenFrame {
    open: i32,
    line: i32,
}

/// Restorable scalar-and-stack state for one-token lookahead.
///
/// The input buffer is deliberately not part of the snapshot: it only
/// ever grows, and growth during lookahead (a pulled interactive line)
/// must not be un-pulled.
struct Snapshot {
    pos: usize,
    token_start: usize,
    done: Status,
    at_line_start: bool,
    at_eof_no_advance: bool,
    pending_indents: i32,
    line_number: i32,
    first_line_number: i32,
    line_start: usize,
    multi_line_start: usize,
    read_newline: bool,
    comment_newline_pending: bool,
    indents: SmallVec<[IndentLevel; 32]>,
    parens: SmallVec<[ParenFrame; 16]>,
    modes: SmallVec<[Mode; 2]>,
    inside_async_def: bool,
    indentation_of_async_def: usize,
    async_def_followed_by_newline: bool,
}

/// Supplier of interactive input lines.
pub type Readline<'a> = Box<dyn FnMut() -> Option<String> + 'a>;

/// Pull-based tokenizer over a code-point buffer.
pub struct Tokenizer<'a> {
    callback: Box<dyn ErrorCallback + 'a>,
    readline: Option<Readline<'a>>,

    exec_input: bool,
    interactive: bool,
    look_for_type_comments: bool,
    async_hacks: bool,
    extra_tokens: bool,

    input: CodePointBuffer,
    /// Index of the next code point to read.
    pos: usize,
    /// Start of the token being scanned.
    token_start: usize,
    done: Status,
    at_line_start: bool,
    /// Set when `next_char` returned EOF without advancing, so `one_back`
    /// must not move.
    at_eof_no_advance: bool,
    pending_indents: i32,
    /// 1-based.
    line_number: i32,
    /// Line a multi-line string started on.
    first_line_number: i32,
    /// Index of the first code point of the current line.
    line_start: usize,
    /// `line_start` at the start of a multi-line string.
    multi_line_start: usize,
    read_newline: bool,
    /// Set after a `Comment` token on a blank line so the following
    /// newline becomes `Nl` rather than being swallowed.
    comment_newline_pending: bool,

    indents: SmallVec<[IndentLevel; 32]>,
    parens: SmallVec<[ParenFrame; 16]>,
    modes: SmallVec<[Mode; 2]>,

    inside_async_def: bool,
    indentation_of_async_def: usize,
    async_def_followed_by_newline: bool,
    report_incomplete_source: bool,

    src_start_line: i32,
    src_start_column: i32,
}

impl<'a> Tokenizer<'a> {
    fn build(
        input: CodePointBuffer,
        flags: Flags,
        callback: Box<dyn ErrorCallback + 'a>,
        readline: Option<Readline<'a>>,
        source_offset: Option<SourceRange>,
    ) -> Self {
        let (src_start_line, src_start_column) = match source_offset {
            // Lines use 1-based indexing; the column accounts for the
            // extra '(' re-parse wrapping convention.
            Some(range) => (range.start_line - 1, range.start_column - 1),
            None => (0, 0),
        };
        Self {
            callback,
            readline,
            exec_input: flags.contains(Flags::EXEC_INPUT),
            interactive: flags.contains(Flags::INTERACTIVE),
            look_for_type_comments: flags.contains(Flags::TYPE_COMMENT),
            async_hacks: flags.contains(Flags::ASYNC_HACKS),
            extra_tokens: flags.contains(Flags::EXTRA_TOKENS),
            input,
            pos: 0,
            token_start: 0,
            done: Status::Ok,
            at_line_start: true,
            at_eof_no_advance: false,
            pending_indents: 0,
            line_number: 1,
            first_line_number: 0,
            line_start: 0,
            multi_line_start: 0,
            read_newline: false,
            comment_newline_pending: false,
            indents: smallvec![IndentLevel { col: 0, alt: 0 }],
            parens: SmallVec::new(),
            modes: smallvec![Mode::Regular],
            inside_async_def: false,
            indentation_of_async_def: 0,
            async_def_followed_by_newline: false,
            report_incomplete_source: true,
            src_start_line,
            src_start_column,
        }
    }

    /// Tokenizer over already-decoded source text. No encoding detection
    /// is performed; a leading byte order mark is dropped.
    pub fn from_source(source: &str, flags: Flags, callback: Box<dyn ErrorCallback + 'a>) -> Self {
        Self::build(
            CodePointBuffer::from_source(source),
            flags,
            callback,
            None,
            None,
        )
    }

    /// Like [`from_source`](Self::from_source), with positions shifted by
    /// the start of `source_offset`. Used when re-tokenizing a snippet
    /// cut out of a larger source.
    pub fn from_source_with_offset(
        source: &str,
        flags: Flags,
        callback: Box<dyn ErrorCallback + 'a>,
        source_offset: SourceRange,
    ) -> Self {
        Self::build(
            CodePointBuffer::from_source(source),
            flags,
            callback,
            None,
            Some(source_offset),
        )
    }

    /// Tokenizer over raw bytes. The encoding is auto-detected from the
    /// UTF-8 BOM and/or `coding:` comment and the bytes decoded with it.
    pub fn from_bytes(
        bytes: &[u8],
        flags: Flags,
        callback: Box<dyn ErrorCallback + 'a>,
    ) -> Result<Self, DecodeError> {
        let source = charset::detect_and_decode(bytes).map_err(DecodeError::from)?;
        Ok(Self::build(
            CodePointBuffer::from_source(&source),
            flags,
            callback,
            None,
            None,
        ))
    }

    /// Tokenizer fed one line at a time by `readline`. The supplier is
    /// called when the buffer runs dry; returning `None` (or an empty
    /// string) ends the input.
    pub fn from_readline(
        flags: Flags,
        callback: Box<dyn ErrorCallback + 'a>,
        readline: Readline<'a>,
    ) -> Self {
        Self::build(
            CodePointBuffer::new(),
            flags,
            callback,
            Some(readline),
            None,
        )
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn status(&self) -> Status {
        self.done
    }

    /// Current bracket nesting level.
    pub fn paren_level(&self) -> usize {
        self.parens.len()
    }

    /// Disable incomplete-source reporting for interactive input; the
    /// tokenizer then ends the stream with [`Status::InteractiveStop`].
    pub fn set_incomplete_source_reporting(&mut self, enabled: bool) {
        self.report_incomplete_source = enabled;
    }

    /// The source text of `token`, with `\r\n` and lone `\r` normalized
    /// to `\n`.
    pub fn token_text(&self, token: &Token) -> String {
        if token.start_offset >= self.input.len() {
            return String::new();
        }
        let end = token.end_offset.min(self.input.len());
        let s = self.input.text(token.start_offset, end);
        if s.contains('\r') {
            s.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            s
        }
    }

    /// Extend `range` so it ends at the tokenizer's current position.
    pub fn extend_range_to_current_position(&self, range: SourceRange) -> SourceRange {
        let end_col = if self.pos >= self.line_start {
            to_i32(self.pos - self.line_start)
        } else {
            -1
        };
        range.with_end(self.line_number, end_col)
    }

    /// Whether anything but whitespace and comments follows the current
    /// position. Used by callers compiling a "single statement" to reject
    /// trailing garbage.
    pub fn is_bad_single_statement(&self) -> bool {
        let mut cur = self.pos;
        loop {
            let mut c = match self.input.get(cur) {
                Some(c) => c,
                None => return false,
            };
            while c == u32::from(' ')
                || c == u32::from('\t')
                || c == u32::from('\n')
                || c == 0x0C
            {
                cur += 1;
                c = match self.input.get(cur) {
                    Some(c) => c,
                    None => return false,
                };
            }
            if c != u32::from('#') {
                return true;
            }
            while c != u32::from('\n') {
                cur += 1;
                c = match self.input.get(cur) {
                    Some(c) => c,
                    None => return false,
                };
            }
        }
    }

    // ─── Character reads ─────────────────────────────────────────────────

    fn next_char(&mut self) -> i32 {
        self.at_eof_no_advance = false;
        // Refill from the line supplier before resolving a pending
        // newline, so a line pulled at the boundary is numbered.
        if self.pos >= self.input.len() {
            if let Some(readline) = self.readline.as_mut() {
                if let Some(line) = readline() {
                    if !line.is_empty() {
                        trace!(chars = line.chars().count(), "readline underflow");
                        self.input.append(&line);
                    }
                }
            }
        }
        if self.read_newline {
            self.read_newline = false;
            if self.pos < self.input.len() {
                // The line number is not bumped when the last line is
                // empty, matching the reference underflow behavior.
                self.line_number += 1;
            }
            self.line_start = self.pos;
        }
        if self.pos < self.input.len() {
            let mut c = self.input.get(self.pos).map_or(EOF, to_i32_cp);
            if c == ch('\r') {
                if self.input.get(self.pos + 1) == Some(u32::from('\n')) {
                    self.pos += 1;
                }
                c = ch('\n');
            }
            self.pos += 1;
            if c == ch('\n') {
                self.read_newline = true;
            }
            return c;
        }
        if self.pos == self.input.len() && self.exec_input {
            // Synthesize a missing final newline.
            if self.input.is_empty() || self.input.get(self.pos - 1) != Some(u32::from('\n')) {
                self.pos += 1;
                self.read_newline = true;
                return ch('\n');
            }
        }
        self.at_eof_no_advance = true;
        if self.interactive {
            if self.report_incomplete_source {
                self.callback.report_incomplete_source(self.line_number);
            } else {
                self.done = Status::InteractiveStop;
            }
            return EOF;
        }
        self.done = Status::Eof;
        EOF
    }

    fn one_back(&mut self) {
        // A read that hit the end without advancing cancels exactly one
        // backup; earlier reads still back up normally, so characters
        // before the end are never merged into one token.
        if self.at_eof_no_advance {
            self.at_eof_no_advance = false;
            return;
        }
        if self.pos > 0 {
            self.pos -= 1;
            if self.input.get(self.pos) == Some(u32::from('\n'))
                && self.pos > 0
                && self.input.get(self.pos - 1) == Some(u32::from('\r'))
            {
                self.pos -= 1;
            }
            self.read_newline = false;
        }
    }

    fn peek_cp(&self, ahead: usize) -> i32 {
        self.input.get(self.pos + ahead).map_or(EOF, to_i32_cp)
    }

    // ─── Token construction ──────────────────────────────────────────────

    fn current_range(&self, multi_line: bool) -> SourceRange {
        let line_start = if multi_line {
            self.multi_line_start
        } else {
            self.line_start
        };
        let mut lineno = if multi_line {
            self.first_line_number
        } else {
            self.line_number
        };
        let mut end_lineno = self.line_number;
        let mut col = if self.token_start >= line_start {
            to_i32(self.token_start - line_start)
        } else {
            -1
        };
        let mut end_col = if self.pos >= self.line_start {
            to_i32(self.pos - self.line_start)
        } else {
            -1
        };
        if lineno == 1 {
            col += self.src_start_column;
        }
        if end_lineno == 1 {
            end_col += self.src_start_column;
        }
        lineno += self.src_start_line;
        end_lineno += self.src_start_line;
        SourceRange::new(lineno, col, end_lineno, end_col)
    }

    fn create_token(&self, kind: TokenKind) -> Token {
        self.create_token_meta(kind, None)
    }

    fn create_token_meta(&self, kind: TokenKind, metadata: Option<Box<str>>) -> Token {
        let range = if kind == TokenKind::EndMarker {
            SourceRange::new(self.line_number, -1, self.line_number, -1)
        } else {
            let multi_line = matches!(kind, TokenKind::String | TokenKind::FStringMiddle);
            self.current_range(multi_line)
        };
        Token {
            kind,
            level: self.parens.len(),
            start_offset: self.token_start,
            end_offset: self.pos,
            range,
            metadata,
        }
    }

    /// Like [`create_token`](Self::create_token) with an explicit end
    /// offset before the current position. Used for f-string middles that
    /// end at a consumed `{`.
    fn token_with_end(&self, kind: TokenKind, end: usize) -> Token {
        let mut token = self.create_token(kind);
        token.end_offset = end;
        token.range.end_column = if end >= self.line_start {
            to_i32(end - self.line_start)
        } else {
            -1
        };
        if token.range.end_line == 1 + self.src_start_line {
            token.range.end_column += self.src_start_column;
        }
        token
    }

    // ─── Errors ──────────────────────────────────────────────────────────

    #[cold]
    fn syntax_error(&mut self, message: &str) -> Token {
        self.done = Status::SyntaxError;
        let range = self.current_range(false);
        self.callback.on_error(ErrorKind::Syntax, range, message);
        self.create_token_meta(TokenKind::ErrorToken, Some(message.into()))
    }

    #[cold]
    fn indent_error(&mut self, status: Status, message: &str) -> Token {
        self.done = status;
        let range = self.current_range(false);
        self.callback.on_error(ErrorKind::Indentation, range, message);
        self.create_token_meta(TokenKind::ErrorToken, Some(message.into()))
    }

    fn parser_warn(&mut self, message: &str) {
        let range = self.current_range(false);
        self.callback
            .on_warning(WarningKind::Syntax, range, message);
    }

    fn deprecation_warn(&mut self, message: &str) {
        let range = self.current_range(false);
        self.callback
            .on_warning(WarningKind::Deprecation, range, message);
    }

    // ─── Helpers shared by the scanning paths ────────────────────────────

    /// Whether `test` (an ASCII word tail) follows the current position
    /// without running into more identifier characters.
    fn lookahead_word(&self, test: &[u8]) -> bool {
        let end = self.pos + test.len();
        if end + 1 >= self.input.len() {
            return false;
        }
        for (i, &b) in test.iter().enumerate() {
            if self.input.get(self.pos + i) != Some(u32::from(b)) {
                return false;
            }
        }
        !self
            .input
            .get(end)
            .is_some_and(|c| is_ident_char(to_i32_cp(c)))
    }

    fn continuation_line(&mut self) -> i32 {
        let c = self.next_char();
        if c != ch('\n') {
            self.done = Status::LineContinuationError;
            return EOF;
        }
        let c = self.next_char();
        if c == EOF {
            self.done = Status::Eof;
            return EOF;
        }
        self.one_back();
        c
    }

    #[cold]
    fn continuation_error_token(&mut self) -> Token {
        if self.done == Status::LineContinuationError {
            let message = "unexpected character after line continuation character";
            let range = self.current_range(false);
            self.callback.on_error(ErrorKind::Syntax, range, message);
            self.create_token_meta(TokenKind::ErrorToken, Some(message.into()))
        } else {
            self.create_token(TokenKind::ErrorToken)
        }
    }

    /// Open f-string expression on top of the mode stack whose bracket
    /// depth is back at its base, if any.
    fn fstring_expr_at_base(&self) -> Option<&ExprFrame> {
        let entry = self.modes.last().and_then(Mode::as_fstring)?;
        let frame = entry.exprs.last()?;
        (self.parens.len() == frame.paren_base && !frame.in_format_spec).then_some(frame)
    }

    fn in_fstring_expression(&self) -> bool {
        self.modes
            .last()
            .and_then(Mode::as_fstring)
            .is_some_and(|entry| !entry.exprs.is_empty())
    }

    /// Whether `next_token` should scan f-string middle text: the top
    /// mode is an f-string with no open expression, or its innermost
    /// expression is inside its format spec.
    fn in_fstring_middle(&self) -> bool {
        self.modes
            .last()
            .and_then(Mode::as_fstring)
            .is_some_and(|entry| entry.exprs.last().is_none_or(|f| f.in_format_spec))
    }

    // ─── Identifier and string entry points ──────────────────────────────

    fn identifier(&mut self, first: i32) -> Token {
        // String prefix letters: legal combinations of b/u/r/f before a
        // quote hand off to the string scanner.
        let mut saw_b = false;
        let mut saw_r = false;
        let mut saw_u = false;
        let mut saw_f = false;
        let mut c = first;
        loop {
            if !(saw_b || saw_u || saw_f) && (c == ch('b') || c == ch('B')) {
                saw_b = true;
            } else if !(saw_b || saw_u || saw_r || saw_f) && (c == ch('u') || c == ch('U')) {
                saw_u = true;
            } else if !(saw_r || saw_u) && (c == ch('r') || c == ch('R')) {
                saw_r = true;
            } else if !(saw_f || saw_b || saw_u) && (c == ch('f') || c == ch('F')) {
                saw_f = true;
            } else {
                break;
            }
            c = self.next_char();
            if c == ch('"') || c == ch('\'') {
                return self.string_or_fstring(c, saw_r, saw_f);
            }
        }
        let mut nonascii = false;
        while is_ident_char(c) {
            if c >= 128 {
                nonascii = true;
            }
            c = self.next_char();
        }
        self.one_back();

        let text = self.input.text(self.token_start, self.pos);
        if nonascii {
            if let Some(message) = verify_identifier(&text) {
                return self.syntax_error(&message);
            }
        }
        if !self.async_hacks || self.inside_async_def {
            // Without async hacks they are always keywords.
            if text == "async" {
                return self.create_token(TokenKind::Async);
            }
            if text == "await" {
                return self.create_token(TokenKind::Await);
            }
        } else if text == "async" {
            // One token of lookahead to see whether this opens a function.
            let snapshot = self.snapshot();
            let next = self.next_token();
            let is_def = next.kind == TokenKind::Name && self.token_text(&next) == "def";
            self.restore(snapshot);
            if is_def {
                self.inside_async_def = true;
                self.indentation_of_async_def = self.indents.len() - 1;
                return self.create_token(TokenKind::Async);
            }
        }
        self.create_token(TokenKind::Name)
    }

    fn string_or_fstring(&mut self, quote: i32, raw: bool, fstring: bool) -> Token {
        if fstring {
            return self.fstring_start(quote, raw);
        }
        let mut quote_size = 1;
        let mut end_quote_size = 0;

        // Multi-line strings need both the starting line number and the
        // column offset tracked from the opening quote.
        self.first_line_number = self.line_number;
        self.multi_line_start = self.line_start;

        // Find the quote size and start of the string body.
        let mut c = self.next_char();
        if c == quote {
            c = self.next_char();
            if c == quote {
                quote_size = 3;
            } else {
                end_quote_size = 1; // empty string
            }
        }
        if c != quote {
            self.one_back();
        }

        while end_quote_size != quote_size {
            c = self.next_char();
            if c == EOF || (quote_size == 1 && c == ch('\n')) {
                // Shift the position back to the start of the string and
                // report the error from the opening quote.
                self.pos = self.token_start + 1;
                self.line_start = self.multi_line_start;
                let detected = self.line_number;
                self.line_number = self.first_line_number;
                return if quote_size == 3 {
                    self.syntax_error(&format!(
                        "unterminated triple-quoted string literal (detected at line {detected})"
                    ))
                } else {
                    self.syntax_error(&format!(
                        "unterminated string literal (detected at line {detected})"
                    ))
                };
            }
            if c == quote {
                end_quote_size += 1;
            } else {
                end_quote_size = 0;
                if c == ch('\\') {
                    self.next_char(); // skip escaped char
                }
            }
        }

        self.create_token(TokenKind::String)
    }

    // ─── Lookahead snapshots ─────────────────────────────────────────────

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            token_start: self.token_start,
            done: self.done,
            at_line_start: self.at_line_start,
            at_eof_no_advance: self.at_eof_no_advance,
            pending_indents: self.pending_indents,
            line_number: self.line_number,
            first_line_number: self.first_line_number,
            line_start: self.line_start,
            multi_line_start: self.multi_line_start,
            read_newline: self.read_newline,
            comment_newline_pending: self.comment_newline_pending,
            indents: self.indents.clone(),
            parens: self.parens.clone(),
            modes: self.modes.clone(),
            inside_async_def: self.inside_async_def,
            indentation_of_async_def: self.indentation_of_async_def,
            async_def_followed_by_newline: self.async_def_followed_by_newline,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.token_start = snapshot.token_start;
        self.done = snapshot.done;
        self.at_line_start = snapshot.at_line_start;
        self.at_eof_no_advance = snapshot.at_eof_no_advance;
        self.pending_indents = snapshot.pending_indents;
        self.line_number = snapshot.line_number;
        self.first_line_number = snapshot.first_line_number;
        self.line_start = snapshot.line_start;
        self.multi_line_start = snapshot.multi_line_start;
        self.read_newline = snapshot.read_newline;
        self.comment_newline_pending = snapshot.comment_newline_pending;
        self.indents = snapshot.indents;
        self.parens = snapshot.parens;
        self.modes = snapshot.modes;
        self.inside_async_def = snapshot.inside_async_def;
        self.indentation_of_async_def = snapshot.indentation_of_async_def;
        self.async_def_followed_by_newline = snapshot.async_def_followed_by_newline;
    }

    // ─── Main dispatch ───────────────────────────────────────────────────

    /// Produce the next token. After the end of input this keeps
    /// returning `EndMarker`.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.in_fstring_middle() {
                if let Some(token) = self.fstring_middle() {
                    return token;
                }
            } else if let Some(token) = self.next_regular() {
                return token;
            }
        }
    }

    fn next_regular(&mut self) -> Option<Token> {
        'nextline: loop {
            let mut blankline = false;

            if self.at_line_start {
                let mut col: i32 = 0;
                let mut altcol: i32 = 0;
                self.at_line_start = false;
                let mut cont_line_col: i32 = 0;
                let mut c;
                loop {
                    c = self.next_char();
                    if c == ch(' ') {
                        col += 1;
                        altcol += 1;
                    } else if c == ch('\t') {
                        col = (col / TABSIZE + 1) * TABSIZE;
                        altcol += 1;
                    } else if c == ch('\u{c}') {
                        col = 0;
                        altcol = 0;
                    } else if c == ch('\\') {
                        // Indentation cannot be split over physical lines
                        // with backslashes; the first backslash found
                        // fixes the indentation of whatever follows.
                        if cont_line_col == 0 {
                            cont_line_col = col;
                        }
                        if self.continuation_line() == EOF {
                            return Some(self.continuation_error_token());
                        }
                    } else {
                        break;
                    }
                }
                self.one_back();
                if c == ch('#') || c == ch('\n') {
                    // Lines with only whitespace and/or comments don't
                    // affect indentation and produce no NEWLINE, except
                    // the interactive cases below.
                    if col == 0 && c == ch('\n') && self.interactive {
                        // Totally empty interactive line: ends a command
                        // group, let it through.
                    } else if self.interactive && self.line_number == 1 {
                        // First interactive line with only spaces and/or
                        // a comment: let it through.
                        col = 0;
                        altcol = 0;
                    } else {
                        blankline = true;
                    }
                    // Can't restart here; a comment may still need to be
                    // skipped.
                }
                if !blankline && self.parens.is_empty() && self.modes.len() == 1 {
                    if cont_line_col != 0 {
                        col = cont_line_col;
                        altcol = cont_line_col;
                    }
                    let top = *self.indents.last().unwrap_or(&IndentLevel { col: 0, alt: 0 });
                    if col == top.col {
                        if altcol != top.alt {
                            return Some(self.indent_error(
                                Status::TabsSpacesInconsistent,
                                "inconsistent use of tabs and spaces in indentation",
                            ));
                        }
                    } else if col > top.col {
                        // Indent: always exactly one.
                        if self.indents.len() >= MAXINDENT {
                            return Some(self.indent_error(
                                Status::TooDeepIndentation,
                                "too many levels of indentation",
                            ));
                        }
                        if altcol <= top.alt {
                            return Some(self.indent_error(
                                Status::TabsSpacesInconsistent,
                                "inconsistent use of tabs and spaces in indentation",
                            ));
                        }
                        self.pending_indents += 1;
                        self.indents.push(IndentLevel { col, alt: altcol });
                    } else {
                        // Dedent: any number, must land exactly.
                        while self.indents.len() > 1
                            && col < self.indents.last().map_or(0, |l| l.col)
                        {
                            self.pending_indents -= 1;
                            self.indents.pop();
                        }
                        let top = *self.indents.last().unwrap_or(&IndentLevel { col: 0, alt: 0 });
                        if col != top.col {
                            return Some(self.indent_error(
                                Status::DedentInvalid,
                                "unindent does not match any outer indentation level",
                            ));
                        }
                        if altcol != top.alt {
                            return Some(self.indent_error(
                                Status::TabsSpacesInconsistent,
                                "inconsistent use of tabs and spaces in indentation",
                            ));
                        }
                    }
                }
            }

            self.token_start = self.pos;

            // Return pending indents/dedents.
            if self.pending_indents != 0 {
                if self.pending_indents < 0 {
                    self.pending_indents += 1;
                    return Some(self.create_token(TokenKind::Dedent));
                }
                self.pending_indents -= 1;
                return Some(self.create_token(TokenKind::Indent));
            }

            // Peek ahead to check whether an async function body ends
            // here. A TYPE_COMMENT at the start of a function produces a
            // NEWLINE without an indentation level, so wait for some
            // non-newline char before closing the async region.
            let peeked = self.next_char();
            self.one_back();
            if self.inside_async_def
                && !blankline
                && peeked != ch('\n')
                && self.parens.is_empty()
                && self.async_def_followed_by_newline
                && self.indentation_of_async_def >= self.indents.len() - 1
            {
                self.inside_async_def = false;
                self.indentation_of_async_def = 0;
                self.async_def_followed_by_newline = false;
            }

            'again: loop {
                // Skip spaces.
                let mut c;
                loop {
                    c = self.next_char();
                    if c != ch(' ') && c != ch('\t') && c != ch('\u{c}') {
                        break;
                    }
                }

                self.token_start = self.pos.saturating_sub(1);

                // Skip comment, unless it is a type comment.
                if c == ch('#') {
                    loop {
                        c = self.next_char();
                        if c == EOF || c == ch('\n') {
                            break;
                        }
                    }
                    if self.look_for_type_comments {
                        if let Some(token) = self.type_comment(blankline) {
                            return Some(token);
                        }
                    }
                    if self.extra_tokens {
                        self.one_back(); // leave the newline
                        if blankline {
                            self.comment_newline_pending = true;
                        }
                        return Some(self.create_token(TokenKind::Comment));
                    }
                }

                if self.done == Status::InteractiveStop {
                    return Some(self.create_token(TokenKind::EndMarker));
                }

                if c == EOF {
                    self.token_start = self.pos;
                    if self.modes.len() > 1 {
                        return Some(self.unterminated_fstring_error());
                    }
                    if !self.parens.is_empty() {
                        return Some(self.create_token(TokenKind::ErrorToken));
                    }
                    if self.done == Status::Eof {
                        return Some(self.create_token(TokenKind::EndMarker));
                    }
                    return Some(self.create_token(TokenKind::ErrorToken));
                }

                if is_ident_start(c) {
                    return Some(self.identifier(c));
                }

                if c == ch('\n') {
                    self.at_line_start = true;
                    if self.in_fstring_expression() {
                        // A single-quoted f-string cannot span the line
                        // break inside its expression; a triple-quoted
                        // one joins it implicitly.
                        let quote_size = self
                            .modes
                            .last()
                            .and_then(Mode::as_fstring)
                            .map_or(1, |e| e.quote_size);
                        if quote_size == 1 {
                            return Some(self.unterminated_fstring_error());
                        }
                        continue 'nextline;
                    }
                    if blankline || !self.parens.is_empty() || self.comment_newline_pending {
                        self.comment_newline_pending = false;
                        if self.extra_tokens {
                            return Some(self.create_token(TokenKind::Nl));
                        }
                        continue 'nextline;
                    }
                    if self.inside_async_def {
                        // NEWLINE after the signature of an async def.
                        self.async_def_followed_by_newline = true;
                    }
                    return Some(self.create_token(TokenKind::Newline));
                }

                // Period or number starting with a period?
                if c == ch('.') {
                    c = self.next_char();
                    if is_digit(c) {
                        return Some(self.fraction(c));
                    }
                    if c == ch('.') {
                        c = self.next_char();
                        if c == ch('.') {
                            return Some(self.create_token(TokenKind::Ellipsis));
                        }
                        self.one_back();
                        self.one_back();
                    } else {
                        self.one_back();
                    }
                    return Some(self.create_token(TokenKind::Dot));
                }

                if is_digit(c) {
                    return Some(self.number(c));
                }

                if c == ch('\'') || c == ch('"') {
                    return Some(self.string_or_fstring(c, false, false));
                }

                // Line continuation.
                if c == ch('\\') {
                    if self.continuation_line() == EOF {
                        return Some(self.continuation_error_token());
                    }
                    continue 'again;
                }

                // A ':' at the top level of an f-string expression starts
                // the format spec (even before '=', so no walrus here).
                if c == ch(':') && self.fstring_expr_at_base().is_some() {
                    if let Some(entry) = self.modes.last_mut().and_then(Mode::as_fstring_mut) {
                        if let Some(frame) = entry.exprs.last_mut() {
                            frame.in_format_spec = true;
                        }
                    }
                    return Some(self.create_token(TokenKind::Colon));
                }

                // A '}' at the top level of an f-string expression closes
                // it; the brace is consumed, not emitted.
                if c == ch('}') {
                    let closes = self
                        .modes
                        .last()
                        .and_then(Mode::as_fstring)
                        .and_then(|entry| entry.exprs.last())
                        .is_some_and(|frame| self.parens.len() == frame.paren_base);
                    if closes {
                        if let Some(entry) = self.modes.last_mut().and_then(Mode::as_fstring_mut)
                        {
                            entry.exprs.pop();
                        }
                        return None;
                    }
                }

                // Two- and three-character operators.
                let c2 = self.next_char();
                if let Some(kind2) = two_chars(c, c2) {
                    let c3 = self.next_char();
                    if let Some(kind3) = three_chars(c, c2, c3) {
                        return Some(self.create_token(kind3));
                    }
                    self.one_back();
                    return Some(self.create_token(kind2));
                }
                self.one_back();

                // A lone '=' at the top level of an f-string expression,
                // right before '}', ':' or a conversion, marks a debug
                // expression; the raw expression text rides as metadata.
                if c == ch('=') {
                    if let Some(frame) = self.fstring_expr_at_base() {
                        let expr_start = frame.start;
                        let mut k = 0;
                        while self.peek_cp(k) == ch(' ') || self.peek_cp(k) == ch('\t') {
                            k += 1;
                        }
                        let nxt = self.peek_cp(k);
                        let is_debug = nxt == ch('}')
                            || nxt == ch(':')
                            || (nxt == ch('!') && self.peek_cp(k + 1) != ch('='));
                        if is_debug {
                            let text = debug_expr_text(&self.input.text(expr_start, self.pos));
                            return Some(
                                self.create_token_meta(TokenKind::Equal, Some(text.into())),
                            );
                        }
                    }
                }

                // Bracket nesting.
                if c == ch('(') || c == ch('[') || c == ch('{') {
                    if self.parens.len() >= MAXLEVEL {
                        return Some(self.syntax_error("too many nested parentheses"));
                    }
                    self.parens.push(ParenFrame {
                        open: c,
                        line: self.line_number,
                    });
                } else if c == ch(')') || c == ch(']') || c == ch('}') {
                    // Inside an f-string expression the brackets opened
                    // within the expression are the only ones a closer
                    // may pop; at the expression's own depth the closer
                    // has nothing to match.
                    if self.fstring_expr_at_base().is_some() {
                        return Some(
                            self.syntax_error(&format!("f-string: unmatched '{}'", cp_display(c))),
                        );
                    }
                    if let Some(frame) = self.parens.pop() {
                        let matches = (frame.open == ch('(') && c == ch(')'))
                            || (frame.open == ch('[') && c == ch(']'))
                            || (frame.open == ch('{') && c == ch('}'));
                        if !matches && !self.extra_tokens {
                            let closing = cp_display(c);
                            let opening = cp_display(frame.open);
                            return Some(if frame.line != self.line_number {
                                self.syntax_error(&format!(
                                    "closing parenthesis '{closing}' does not match \
                                     opening parenthesis '{opening}' on line {}",
                                    frame.line
                                ))
                            } else {
                                self.syntax_error(&format!(
                                    "closing parenthesis '{closing}' does not match \
                                     opening parenthesis '{opening}'"
                                ))
                            });
                        }
                    } else if !self.extra_tokens {
                        return Some(self.syntax_error(&format!("unmatched '{}'", cp_display(c))));
                    }
                }

                // Punctuation character.
                return Some(match one_char(c) {
                    Some(kind) => self.create_token(kind),
                    None => self.create_token(TokenKind::ErrorToken),
                });
            }
        }
    }

    /// Recognize `# type:` comments. Called with the comment consumed and
    /// the current position at its terminating newline or EOF.
    fn type_comment(&mut self, blankline: bool) -> Option<Token> {
        const PREFIX: &[u8] = b"# type: ";
        // A space in the prefix matches zero or more spaces or tabs.
        let mut prefix_idx = 0;
        let mut ch_idx = self.token_start;
        while ch_idx < self.input.len() && prefix_idx < PREFIX.len() {
            if PREFIX[prefix_idx] == b' ' {
                while matches!(
                    self.input.get(ch_idx),
                    Some(c) if c == u32::from(' ') || c == u32::from('\t')
                ) {
                    ch_idx += 1;
                }
            } else if self.input.get(ch_idx) == Some(u32::from(PREFIX[prefix_idx])) {
                ch_idx += 1;
            } else {
                return None;
            }
            prefix_idx += 1;
        }
        if prefix_idx != PREFIX.len() {
            return None;
        }

        let ignore_end = ch_idx + 6;
        let end_char = self.input.get(ignore_end).map_or(EOF, to_i32_cp);
        self.one_back(); // don't eat the newline or EOF

        // A TYPE_IGNORE is "type: ignore" followed by the end of the
        // token or any non-alphanumeric ASCII.
        let is_ignore_word = self.pos >= ignore_end
            && self
                .input
                .slice(ch_idx, ignore_end)
                .iter()
                .copied()
                .eq("ignore".chars().map(u32::from));
        let alnum_after = self.pos > ignore_end
            && (end_char >= 128
                || u8::try_from(end_char)
                    .map(|b| b.is_ascii_alphanumeric())
                    .unwrap_or(false));
        let is_type_ignore = is_ignore_word && !alnum_after;

        if is_type_ignore {
            // If this type ignore is alone on its line, consume the
            // newline as well.
            if blankline {
                self.next_char();
                self.at_line_start = true;
            }
            self.token_start = ignore_end;
            Some(self.create_token(TokenKind::TypeIgnore))
        } else {
            self.token_start = ch_idx; // after the prefix
            Some(self.create_token(TokenKind::TypeComment))
        }
    }
}

fn to_i32_cp(cp: u32) -> i32 {
    i32::try_from(cp).unwrap_or(i32::MAX)
}

fn cp_display(c: i32) -> char {
    u32::try_from(c)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or('\u{FFFD}')
}

/// Verify that a non-ASCII identifier is valid, returning the error
/// message for the first offending character.
fn verify_identifier(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if first != '_' && !unicode_ident::is_xid_start(first) {
        return Some(invalid_char_message(first));
    }
    for c in chars {
        if !unicode_ident::is_xid_continue(c) {
            return Some(invalid_char_message(c));
        }
    }
    None
}

fn invalid_char_message(c: char) -> String {
    format!("invalid character '{c}' (U+{:x})", u32::from(c))
}

/// Expression text captured for an f-string debug `=`, with any comment
/// tail replaced by a newline.
fn debug_expr_text(raw: &str) -> String {
    if !raw.contains('#') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut in_comment = false;
    for c in raw.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push('\n');
            }
        } else if c == '#' {
            in_comment = true;
        } else {
            out.push(c);
        }
    }
    out
}
