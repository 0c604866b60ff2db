use pretty_assertions::assert_eq;

use super::*;

#[test]
fn with_end_replaces_only_the_end() {
    let r = SourceRange::new(3, 4, 3, 4);
    let extended = r.with_end(5, 0);
    assert_eq!(extended, SourceRange::new(3, 4, 5, 0));
}

#[test]
fn shift_moves_all_lines() {
    let r = SourceRange::new(2, 7, 3, 1);
    assert_eq!(r.shifted_by(10, 5), SourceRange::new(12, 7, 13, 1));
}

#[test]
fn shift_moves_columns_only_on_first_line() {
    let r = SourceRange::new(1, 2, 1, 6);
    assert_eq!(r.shifted_by(4, 5), SourceRange::new(5, 7, 5, 11));

    let spanning = SourceRange::new(1, 2, 2, 0);
    assert_eq!(spanning.shifted_by(4, 5), SourceRange::new(5, 7, 6, 0));
}
