use pretty_assertions::assert_eq;

use super::*;

fn c(ch: char) -> i32 {
    ch as i32
}

#[test]
fn one_char_covers_all_punctuation() {
    assert_eq!(one_char(c('(')), Some(TokenKind::LPar));
    assert_eq!(one_char(c('}')), Some(TokenKind::RBrace));
    assert_eq!(one_char(c('~')), Some(TokenKind::Tilde));
    assert_eq!(one_char(c('!')), Some(TokenKind::Exclamation));
    assert_eq!(one_char(c('$')), None);
    assert_eq!(one_char(c('?')), None);
    assert_eq!(one_char(-1), None);
}

#[test]
fn two_char_operators() {
    assert_eq!(two_chars(c('*'), c('*')), Some(TokenKind::DoubleStar));
    assert_eq!(two_chars(c(':'), c('=')), Some(TokenKind::ColonEqual));
    assert_eq!(two_chars(c('-'), c('>')), Some(TokenKind::RArrow));
    assert_eq!(two_chars(c('<'), c('>')), Some(TokenKind::NotEqual));
    assert_eq!(two_chars(c('+'), c('+')), None);
}

#[test]
fn three_char_operators() {
    assert_eq!(
        three_chars(c('*'), c('*'), c('=')),
        Some(TokenKind::DoubleStarEqual)
    );
    assert_eq!(
        three_chars(c('>'), c('>'), c('=')),
        Some(TokenKind::RightShiftEqual)
    );
    assert_eq!(three_chars(c('*'), c('*'), c('*')), None);
}

#[test]
fn longest_match_is_consistent() {
    // Every three-char operator must extend a two-char operator, since the
    // tokenizer only tries three chars after a two-char hit.
    for (a, b, t) in [
        ('*', '*', '='),
        ('/', '/', '='),
        ('<', '<', '='),
        ('>', '>', '='),
    ] {
        assert!(two_chars(c(a), c(b)).is_some());
        assert!(three_chars(c(a), c(b), c(t)).is_some());
    }
}
