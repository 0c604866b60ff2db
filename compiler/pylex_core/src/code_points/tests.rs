use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn empty_buffer() {
    let buf = CodePointBuffer::new();
    assert!(buf.is_empty());
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.get(0), None);
    assert_eq!(buf.text(0, 10), "");
}

#[test]
fn indexes_by_code_point_not_byte() {
    let buf = CodePointBuffer::from_source("aé漢");
    assert_eq!(buf.len(), 3);
    assert_eq!(buf.get(0), Some(u32::from('a')));
    assert_eq!(buf.get(1), Some(u32::from('é')));
    assert_eq!(buf.get(2), Some(u32::from('漢')));
}

#[test]
fn strips_leading_bom() {
    let buf = CodePointBuffer::from_source("\u{FEFF}x = 1");
    assert_eq!(buf.get(0), Some(u32::from('x')));
    assert_eq!(buf.len(), 5);
}

#[test]
fn interior_bom_is_kept() {
    let buf = CodePointBuffer::from_source("a\u{FEFF}b");
    assert_eq!(buf.len(), 3);
    assert_eq!(buf.get(1), Some(0xFEFF));
}

#[test]
fn append_keeps_existing_indices() {
    let mut buf = CodePointBuffer::from_source("print(");
    let before: Vec<_> = (0..buf.len()).filter_map(|i| buf.get(i)).collect();
    buf.append("1)\n");
    let after: Vec<_> = (0..before.len()).filter_map(|i| buf.get(i)).collect();
    assert_eq!(before, after);
    assert_eq!(buf.text(0, buf.len()), "print(1)\n");
}

#[test]
fn slice_clamps_out_of_range() {
    let buf = CodePointBuffer::from_source("abc");
    assert_eq!(buf.slice(1, 100), &[u32::from('b'), u32::from('c')]);
    assert_eq!(buf.slice(50, 100), &[] as &[u32]);
    assert_eq!(buf.slice(2, 1), &[] as &[u32]);
}

#[test]
fn text_round_trips() {
    let src = "def f(x):\n    return x\n";
    let buf = CodePointBuffer::from_source(src);
    assert_eq!(buf.text(0, buf.len()), src);
}

proptest! {
    #[test]
    fn append_in_pieces_equals_one_shot(pieces in prop::collection::vec(".{0,20}", 0..8)) {
        let mut incremental = CodePointBuffer::new();
        let mut whole = String::new();
        for piece in &pieces {
            incremental.append(piece);
            whole.push_str(piece);
        }
        prop_assert_eq!(incremental.text(0, incremental.len()), whole);
    }

    #[test]
    fn len_counts_code_points(s in ".{0,40}") {
        let mut buf = CodePointBuffer::new();
        buf.append(&s);
        prop_assert_eq!(buf.len(), s.chars().count());
    }
}
