use pretty_assertions::assert_eq;

use super::*;

// === Detection ===

#[test]
fn defaults_to_utf8() {
    let d = detect(b"print('hi')\n");
    assert_eq!(d.source_start, 0);
    assert_eq!(d.encoding, Encoding::Utf8);
}

#[test]
fn coding_comment_first_line() {
    let d = detect(b"# -*- coding: latin-1 -*-\nx = 1\n");
    assert_eq!(d.encoding, Encoding::Iso8859_1);
}

#[test]
fn coding_comment_second_line() {
    let d = detect(b"#!/usr/bin/env python\n# coding=iso-8859-1\nx\n");
    assert_eq!(d.encoding, Encoding::Iso8859_1);
}

#[test]
fn third_line_is_too_late() {
    let d = detect(b"\n\n# coding: latin-1\n");
    assert_eq!(d.encoding, Encoding::Utf8);
}

#[test]
fn code_on_first_line_commits_to_utf8() {
    // Real content before any comment rules out coding comments entirely.
    let d = detect(b"x = 1\n# coding: latin-1\n");
    assert_eq!(d.encoding, Encoding::Utf8);
}

#[test]
fn spec_needs_separator_after_coding() {
    let d = detect(b"# encodingstuff latin-1\n");
    assert_eq!(d.encoding, Encoding::Utf8);
    // "coding" with no ':' or '=' after it is not a spec either.
    let d = detect(b"# coding latin-1\n");
    assert_eq!(d.encoding, Encoding::Utf8);
}

#[test]
fn alias_normalization() {
    assert_eq!(detect(b"# coding: utf-8-sig\n").encoding, Encoding::Utf8);
    assert_eq!(
        detect(b"# coding: iso-latin-1\n").encoding,
        Encoding::Iso8859_1
    );
    assert_eq!(
        detect(b"# coding: cp1252\n").encoding,
        Encoding::Other("cp1252".into())
    );
}

#[test]
fn bom_skips_three_bytes() {
    let d = detect(b"\xEF\xBB\xBFx = 1\n");
    assert_eq!(d.source_start, 3);
    assert_eq!(d.encoding, Encoding::Utf8);
}

#[test]
fn bom_wins_over_coding_comment() {
    // The documented quirk: a BOM forces UTF-8 even when a coding comment
    // names something else.
    let d = detect(b"\xEF\xBB\xBF# coding: latin-1\n\xC3\xA9\n");
    assert_eq!(d.encoding, Encoding::Utf8);
}

#[test]
fn bom_does_not_hide_unknown_coding_name() {
    // The comment is still scanned under a BOM; a name we cannot decode
    // stays an error even though the BOM would force UTF-8.
    let d = detect(b"\xEF\xBB\xBF# coding: ebcdic\nx\n");
    assert_eq!(d.encoding, Encoding::Other("ebcdic".into()));
    let r = detect_and_decode(b"\xEF\xBB\xBF# coding: ebcdic\nx\n");
    assert_eq!(r, Err(DecodeIssue::UnsupportedEncoding("ebcdic".into())));
}

// === Decoding ===

#[test]
fn decodes_latin1_bytes() {
    let s = decode(b"s = '\xE9'\n", &Encoding::Iso8859_1);
    assert_eq!(s, Ok("s = 'é'\n".to_owned()));
}

#[test]
fn invalid_utf8_reports_position() {
    let r = decode(b"ab\xFFcd", &Encoding::Utf8);
    assert_eq!(r, Err(DecodeIssue::InvalidUtf8 { pos: 2 }));
}

#[test]
fn unsupported_encoding_is_an_error() {
    let r = detect_and_decode(b"# coding: cp1252\nx\n");
    assert_eq!(r, Err(DecodeIssue::UnsupportedEncoding("cp1252".into())));
}

#[test]
fn pipeline_decodes_declared_latin1() {
    let r = detect_and_decode(b"# coding: latin-1\ns = '\xE9'\n");
    assert_eq!(r, Ok("# coding: latin-1\ns = '\u{E9}'\n".to_owned()));
}

#[test]
fn pipeline_bom_plus_latin1_comment_decodes_as_utf8() {
    let r = detect_and_decode(b"\xEF\xBB\xBF# coding: latin-1\ns = '\xC3\xA9'\n");
    assert_eq!(r, Ok("# coding: latin-1\ns = '\u{E9}'\n".to_owned()));
}
