//! F-string scanning.
//!
//! `FSTRING_START` covers the prefix and opening quote(s). The literal
//! text between replacement fields comes out as `FSTRING_MIDDLE` tokens;
//! a middle token is emitted before every `{` (even when empty, so the
//! token stream always alternates middle/expression) but before the
//! closing quotes only when non-empty. The braces themselves are
//! consumed, never emitted: the expression tokens ride on the regular
//! scanning path between them, with the small interceptions in
//! `next_regular` for the top-level `:`, `=` and `}`.

use smallvec::SmallVec;
use tracing::trace;

use super::{ch, Tokenizer, EOF, MAXFSTRINGLEVEL};
use crate::mode::{ExprFrame, FStringEntry, Mode};
use crate::token::{Token, TokenKind};

/// Nesting bound for `{...}` expressions within one f-string.
const MAX_EXPR_DEPTH: usize = 150;

fn is_valid_escape(c: i32) -> bool {
    if c == EOF {
        return false;
    }
    matches!(
        u8::try_from(c),
        Ok(b'\n' | b'\\' | b'\'' | b'"' | b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v'
            | b'0'..=b'7' | b'x' | b'N' | b'u' | b'U')
    )
}

impl Tokenizer<'_> {
    /// Called with the prefix and the first quote consumed.
    pub(super) fn fstring_start(&mut self, quote: i32, raw: bool) -> Token {
        if self.modes.len() >= MAXFSTRINGLEVEL {
            return self.syntax_error("too many nested f-strings");
        }
        let mut quote_size: u8 = 1;
        if self.peek_cp(0) == quote && self.peek_cp(1) == quote {
            quote_size = 3;
            self.next_char();
            self.next_char();
        }
        self.first_line_number = self.line_number;
        self.multi_line_start = self.line_start;
        trace!(depth = self.modes.len(), quote_size, raw, "enter f-string");
        self.modes.push(Mode::FString(FStringEntry {
            quote,
            quote_size,
            raw,
            start: self.token_start,
            first_line: self.line_number,
            multi_line_start: self.line_start,
            exprs: SmallVec::new(),
        }));
        self.create_token(TokenKind::FStringStart)
    }

    /// Scan literal middle text. Returns `None` when a `}` closing a
    /// format spec was consumed without any pending text, so the caller
    /// re-dispatches.
    pub(super) fn fstring_middle(&mut self) -> Option<Token> {
        let (quote, quote_size, raw, in_spec) = {
            let entry = self.modes.last().and_then(Mode::as_fstring)?;
            (
                entry.quote,
                entry.quote_size,
                entry.raw,
                entry.exprs.last().is_some_and(|f| f.in_format_spec),
            )
        };
        self.token_start = self.pos;
        self.first_line_number = self.line_number;
        self.multi_line_start = self.line_start;

        let mut end_quote_count: u8 = 0;
        loop {
            let c = self.next_char();
            if c == EOF || (quote_size == 1 && c == ch('\n')) {
                return Some(self.unterminated_fstring_error());
            }
            if c == quote {
                end_quote_count += 1;
                if end_quote_count == quote_size {
                    if in_spec {
                        // The replacement field was never closed.
                        self.modes.pop();
                        return Some(self.syntax_error("f-string: expecting '}'"));
                    }
                    let middle_end = self.pos - usize::from(quote_size);
                    if middle_end > self.token_start {
                        // Emit the text first; the quotes are re-scanned
                        // on the next call and produce FSTRING_END.
                        self.pos = middle_end;
                        return Some(self.create_token(TokenKind::FStringMiddle));
                    }
                    trace!(depth = self.modes.len(), "leave f-string");
                    self.modes.pop();
                    return Some(self.create_token(TokenKind::FStringEnd));
                }
                continue;
            }
            end_quote_count = 0;

            if c == ch('{') {
                if !in_spec && self.peek_cp(0) == ch('{') {
                    self.next_char(); // literal brace
                    continue;
                }
                let end = self.pos - 1;
                let depth = {
                    let entry = self.modes.last_mut().and_then(Mode::as_fstring_mut)?;
                    if entry.exprs.len() >= MAX_EXPR_DEPTH {
                        None
                    } else {
                        entry.exprs.push(ExprFrame {
                            paren_base: 0, // fixed up below, parens not borrowable here
                            in_format_spec: false,
                            start: 0,
                        });
                        Some(entry.exprs.len())
                    }
                };
                let Some(depth) = depth else {
                    return Some(self.syntax_error("f-string: expressions nested too deeply"));
                };
                let paren_base = self.parens.len();
                let expr_start = self.pos;
                if let Some(entry) = self.modes.last_mut().and_then(Mode::as_fstring_mut) {
                    if let Some(frame) = entry.exprs.last_mut() {
                        frame.paren_base = paren_base;
                        frame.start = expr_start;
                    }
                }
                trace!(depth, "enter f-string expression");
                return Some(self.token_with_end(TokenKind::FStringMiddle, end));
            }

            if c == ch('}') {
                if in_spec {
                    // Ends the format spec and with it the expression.
                    let end = self.pos - 1;
                    if end > self.token_start {
                        self.one_back();
                        return Some(self.create_token(TokenKind::FStringMiddle));
                    }
                    if let Some(entry) = self.modes.last_mut().and_then(Mode::as_fstring_mut) {
                        entry.exprs.pop();
                    }
                    return None;
                }
                if self.peek_cp(0) == ch('}') {
                    self.next_char(); // literal brace
                    continue;
                }
                return Some(self.syntax_error("f-string: single '}' is not allowed"));
            }

            if c == ch('\\') {
                let peek = self.next_char();
                // A backslash before a brace only guards the brace; put it
                // back so the next iteration sees it.
                if peek == ch('{') || peek == ch('}') {
                    if !raw {
                        self.warn_invalid_escape(peek);
                    }
                    self.one_back();
                } else if !raw {
                    self.warn_invalid_escape(peek);
                }
            }
        }
    }

    fn warn_invalid_escape(&mut self, c: i32) {
        if is_valid_escape(c) {
            return;
        }
        let shown = super::cp_display(c);
        self.deprecation_warn(&format!("invalid escape sequence '\\{shown}'"));
    }

    /// Report an unterminated f-string from its opening quote, unwinding
    /// the innermost f-string mode.
    #[cold]
    pub(super) fn unterminated_fstring_error(&mut self) -> Token {
        let entry = match self.modes.pop() {
            Some(Mode::FString(entry)) => entry,
            Some(mode) => {
                self.modes.push(mode);
                return self.syntax_error("unterminated f-string literal");
            }
            None => return self.syntax_error("unterminated f-string literal"),
        };
        let detected = self.line_number;
        self.pos = entry.start + 1;
        self.line_start = entry.multi_line_start;
        self.line_number = entry.first_line;
        self.token_start = entry.start;
        trace!(depth = self.modes.len(), "leave f-string (unterminated)");
        if entry.quote_size == 3 {
            self.syntax_error(&format!(
                "unterminated triple-quoted f-string literal (detected at line {detected})"
            ))
        } else {
            self.syntax_error(&format!(
                "unterminated f-string literal (detected at line {detected})"
            ))
        }
    }
}
