//! Numeric literal scanning.
//!
//! Entered from the main dispatch with the first digit consumed (or, for
//! `.5`-style floats, from the period branch with the first fractional
//! digit consumed). Underscores are digit group separators and must sit
//! between digits. Every path ends with `verify_end_of_number`, which
//! rejects a literal running straight into an identifier character but
//! only warns when that identifier is a keyword that can legally follow
//! a number (`1if x else y` still parses, with a deprecation warning).

use super::{ch, is_digit, Tokenizer, EOF};
use crate::token::{Token, TokenKind};

fn is_hex_digit(c: i32) -> bool {
    is_digit(c) || (c >= ch('a') && c <= ch('f')) || (c >= ch('A') && c <= ch('F'))
}

impl Tokenizer<'_> {
    pub(super) fn number(&mut self, first: i32) -> Token {
        let mut c = first;
        if c == ch('0') {
            // It can be hex, octal or binary.
            c = self.next_char();
            if c == ch('x') || c == ch('X') {
                c = self.next_char();
                loop {
                    if c == ch('_') {
                        c = self.next_char();
                    }
                    if !is_hex_digit(c) {
                        self.one_back();
                        return self.syntax_error("invalid hexadecimal literal");
                    }
                    while is_hex_digit(c) {
                        c = self.next_char();
                    }
                    if c != ch('_') {
                        break;
                    }
                }
                if let Some(error) = self.verify_end_of_number(c, "hexadecimal") {
                    return error;
                }
            } else if c == ch('o') || c == ch('O') {
                c = self.next_char();
                loop {
                    if c == ch('_') {
                        c = self.next_char();
                    }
                    if !(c >= ch('0') && c < ch('8')) {
                        self.one_back();
                        if is_digit(c) {
                            return self.syntax_error(&format!(
                                "invalid digit '{}' in octal literal",
                                super::cp_display(c)
                            ));
                        }
                        self.one_back();
                        return self.syntax_error("invalid octal literal");
                    }
                    while c >= ch('0') && c < ch('8') {
                        c = self.next_char();
                    }
                    if c != ch('_') {
                        break;
                    }
                }
                if is_digit(c) {
                    return self.syntax_error(&format!(
                        "invalid digit '{}' in octal literal",
                        super::cp_display(c)
                    ));
                }
                if let Some(error) = self.verify_end_of_number(c, "octal") {
                    return error;
                }
            } else if c == ch('b') || c == ch('B') {
                c = self.next_char();
                loop {
                    if c == ch('_') {
                        c = self.next_char();
                    }
                    if c != ch('0') && c != ch('1') {
                        self.one_back();
                        if is_digit(c) {
                            return self.syntax_error(&format!(
                                "invalid digit '{}' in binary literal",
                                super::cp_display(c)
                            ));
                        }
                        return self.syntax_error("invalid binary literal");
                    }
                    while c == ch('0') || c == ch('1') {
                        c = self.next_char();
                    }
                    if c != ch('_') {
                        break;
                    }
                }
                if is_digit(c) {
                    return self.syntax_error(&format!(
                        "invalid digit '{}' in binary literal",
                        super::cp_display(c)
                    ));
                }
                if let Some(error) = self.verify_end_of_number(c, "binary") {
                    return error;
                }
            } else {
                // Maybe old-style octal; in any case '0' alone is fine.
                let mut nonzero = false;
                loop {
                    if c == ch('_') {
                        c = self.next_char();
                        if !is_digit(c) {
                            self.one_back();
                            return self.syntax_error("invalid decimal literal");
                        }
                    }
                    if c != ch('0') {
                        break;
                    }
                    c = self.next_char();
                }
                let zeros_end = self.pos;
                if is_digit(c) {
                    nonzero = true;
                    c = self.read_decimal_tail();
                    if c == 0 {
                        return self.syntax_error("invalid decimal literal");
                    }
                }
                if c == ch('.') {
                    c = self.next_char();
                    return self.fraction(c);
                }
                if c == ch('e') || c == ch('E') {
                    return self.exponent(c);
                }
                if c == ch('j') || c == ch('J') {
                    return self.imaginary();
                }
                if nonzero && !self.extra_tokens {
                    // Old-style octal: now disallowed.
                    self.one_back();
                    self.pos = zeros_end;
                    return self.syntax_error(
                        "leading zeros in decimal integer literals are not permitted; \
                         use an 0o prefix for octal integers",
                    );
                }
                if let Some(error) = self.verify_end_of_number(c, "decimal") {
                    return error;
                }
            }
        } else {
            // Decimal.
            c = self.read_decimal_tail();
            if c == 0 {
                return self.syntax_error("invalid decimal literal");
            }
            if c == ch('.') {
                c = self.next_char();
                return self.fraction(c);
            }
            if c == ch('e') || c == ch('E') {
                return self.exponent(c);
            }
            if c == ch('j') || c == ch('J') {
                return self.imaginary();
            }
            if let Some(error) = self.verify_end_of_number(c, "decimal") {
                return error;
            }
        }
        self.one_back();
        self.create_token(TokenKind::Number)
    }

    /// Fractional part, entered with the char after the period consumed.
    pub(super) fn fraction(&mut self, first: i32) -> Token {
        let mut c = first;
        if is_digit(c) {
            c = self.read_decimal_tail();
            if c == 0 {
                return self.syntax_error("invalid decimal literal");
            }
        }
        if c == ch('e') || c == ch('E') {
            return self.exponent(c);
        }
        if c == ch('j') || c == ch('J') {
            return self.imaginary();
        }
        if let Some(error) = self.verify_end_of_number(c, "decimal") {
            return error;
        }
        self.one_back();
        self.create_token(TokenKind::Number)
    }

    fn exponent(&mut self, e: i32) -> Token {
        let mut c = self.next_char();
        if c == ch('+') || c == ch('-') {
            c = self.next_char();
            if !is_digit(c) {
                self.one_back();
                return self.syntax_error("invalid decimal literal");
            }
        } else if !is_digit(c) {
            // Not an exponent after all; the number ends before the 'e'.
            self.one_back();
            if let Some(error) = self.verify_end_of_number(e, "decimal") {
                return error;
            }
            self.one_back();
            return self.create_token(TokenKind::Number);
        }
        c = self.read_decimal_tail();
        if c == 0 {
            return self.syntax_error("invalid decimal literal");
        }
        if c == ch('j') || c == ch('J') {
            return self.imaginary();
        }
        if let Some(error) = self.verify_end_of_number(c, "decimal") {
            return error;
        }
        self.one_back();
        self.create_token(TokenKind::Number)
    }

    fn imaginary(&mut self) -> Token {
        let c = self.next_char();
        if let Some(error) = self.verify_end_of_number(c, "decimal") {
            return error;
        }
        self.one_back();
        self.create_token(TokenKind::Number)
    }

    /// Consume a run of digits with underscore separators. Returns the
    /// first char after the run, or 0 if an underscore was not followed
    /// by a digit (the caller reports "invalid decimal literal").
    fn read_decimal_tail(&mut self) -> i32 {
        let mut c;
        loop {
            loop {
                c = self.next_char();
                if !is_digit(c) {
                    break;
                }
            }
            if c != ch('_') {
                break;
            }
            c = self.next_char();
            if !is_digit(c) {
                self.one_back();
                return 0;
            }
        }
        c
    }

    /// A deprecation warning when the literal runs into a keyword that can
    /// legally follow a number, a syntax error when it runs into any other
    /// identifier character.
    fn verify_end_of_number(&mut self, c: i32, kind: &str) -> Option<Token> {
        let keyword_follows = if c == ch('a') {
            self.lookahead_word(b"nd")
        } else if c == ch('e') {
            self.lookahead_word(b"lse")
        } else if c == ch('f') {
            self.lookahead_word(b"or")
        } else if c == ch('i') {
            let c2 = self.next_char();
            let hit = c2 == ch('f') || c2 == ch('n') || c2 == ch('s');
            self.one_back();
            hit
        } else if c == ch('o') {
            self.lookahead_word(b"r")
        } else if c == ch('n') {
            self.lookahead_word(b"ot")
        } else {
            false
        };
        if keyword_follows {
            self.one_back();
            self.parser_warn(&format!("invalid {kind} literal"));
            self.next_char();
        } else if c != EOF && c < 128 && super::is_ident_char(c) {
            self.one_back();
            return Some(self.syntax_error(&format!("invalid {kind} literal")));
        }
        None
    }
}
