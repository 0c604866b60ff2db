//! Source encoding detection for raw byte input.
//!
//! Python source may declare its encoding in a `# -*- coding: ... -*-`
//! comment on one of the first two lines (PEP 263), and may carry a UTF-8
//! byte order mark. Detection runs on raw bytes before any decoding: a
//! valid coding comment consists of single-byte characters in every
//! encoding we accept, so byte-level scanning is safe.
//!
//! One deliberate quirk is preserved from the reference implementation:
//! when a UTF-8 BOM is present, the input is decoded as UTF-8 even if a
//! coding comment names a different encoding. Respecting the comment in
//! that situation would re-decode bytes that were already committed to
//! UTF-8 by the BOM. The comment is still scanned, so a name we cannot
//! decode at all is reported rather than silently overridden.

/// The encoding a byte input should be decoded with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    /// Also reachable via the `latin-1` and `iso-latin-1` aliases.
    Iso8859_1,
    /// A coding comment named an encoding this crate does not decode.
    Other(Box<str>),
}

/// Result of scanning the head of a byte input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    /// Offset of the first source byte (3 when a UTF-8 BOM was skipped).
    pub source_start: usize,
    pub encoding: Encoding,
}

/// Why a byte input could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeIssue {
    /// The input declared (or defaulted to) UTF-8 but is not valid UTF-8.
    InvalidUtf8 {
        /// Byte offset of the first invalid sequence.
        pos: usize,
    },
    /// A coding comment named an encoding this crate does not decode.
    UnsupportedEncoding(Box<str>),
}

const BOM_BYTES: &[u8; 3] = &[0xEF, 0xBB, 0xBF];

fn has_bom(bytes: &[u8]) -> bool {
    bytes.len() >= 3 && &bytes[..3] == BOM_BYTES
}

/// Map encoding aliases onto canonical names.
///
/// Matches on prefix: `utf-8-sig` or `latin-1-quirk` style suffixes are
/// accepted the same way the reference detector accepts them.
fn normal_name(name: &str) -> Encoding {
    if name.starts_with("utf-8") {
        Encoding::Utf8
    } else if name.starts_with("latin-1")
        || name.starts_with("iso-8859-1")
        || name.starts_with("iso-latin-1")
    {
        Encoding::Iso8859_1
    } else {
        Encoding::Other(name.into())
    }
}

fn is_coding_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.'
}

/// Extract the coding spec from the line starting at `line_start`, if any.
///
/// The line must contain nothing but whitespace before the `#` comment;
/// any other content means the line cannot carry a coding spec.
fn coding_spec(bytes: &[u8], line_start: usize) -> Option<Encoding> {
    let mut i = line_start;
    loop {
        let b = *bytes.get(i)?;
        match b {
            b'\n' => return None,
            b'#' => break,
            b' ' | b'\t' | 0x0C => i += 1,
            _ => return None,
        }
    }
    // Inside the comment: look for "coding" followed by ':' or '='.
    while i + 6 < bytes.len() {
        if bytes[i] == b'\n' {
            return None;
        }
        if &bytes[i..i + 6] == b"coding" {
            let mut t = i + 6;
            match bytes.get(t) {
                Some(b'\n') | None => return None,
                Some(b':' | b'=') => {}
                Some(_) => {
                    i += 1;
                    continue;
                }
            }
            t += 1;
            while matches!(bytes.get(t), Some(b' ' | b'\t')) {
                t += 1;
            }
            let begin = t;
            while bytes.get(t).is_some_and(|&b| is_coding_name_byte(b)) {
                t += 1;
            }
            if begin < t {
                let name = String::from_utf8_lossy(&bytes[begin..t]).into_owned();
                return Some(normal_name(&name));
            }
        }
        i += 1;
    }
    None
}

/// Check one line for a coding spec.
///
/// Returns `Some` when the line decides the encoding: either it carries a
/// spec, or it contains real content, which rules out coding comments on
/// any later line and commits the input to UTF-8. Returns `None` when the
/// line is blank or comment-only without a spec.
fn check_coding_spec(bytes: &[u8], line_start: usize) -> Option<Encoding> {
    if let Some(spec) = coding_spec(bytes, line_start) {
        return Some(spec);
    }
    for &b in &bytes[line_start.min(bytes.len())..] {
        match b {
            b'#' | b'\n' | b'\r' => break,
            b' ' | b'\t' | 0x0C => {}
            _ => return Some(Encoding::Utf8),
        }
    }
    None
}

/// Detect the encoding of a byte input from its first two lines.
pub fn detect(bytes: &[u8]) -> Detection {
    let source_start = if has_bom(bytes) { 3 } else { 0 };
    let mut encoding = check_coding_spec(bytes, source_start);
    if encoding.is_none() {
        // The first line didn't decide; a blank or comment-only first line
        // keeps the second line eligible.
        if let Some(nl) = memchr::memchr(b'\n', &bytes[source_start..]) {
            let second = source_start + nl + 1;
            if second < bytes.len() {
                encoding = check_coding_spec(bytes, second);
            }
        }
    }
    if source_start > 0 && !matches!(encoding, Some(Encoding::Other(_))) {
        // BOM wins over a known coding comment, but an unknown name is
        // still an error; see the module docs.
        return Detection {
            source_start,
            encoding: Encoding::Utf8,
        };
    }
    Detection {
        source_start,
        encoding: encoding.unwrap_or(Encoding::Utf8),
    }
}

/// Decode `bytes` (already past any BOM) with `encoding`.
pub fn decode(bytes: &[u8], encoding: &Encoding) -> Result<String, DecodeIssue> {
    match encoding {
        Encoding::Utf8 => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(e) => Err(DecodeIssue::InvalidUtf8 {
                pos: e.valid_up_to(),
            }),
        },
        Encoding::Iso8859_1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Encoding::Other(name) => Err(DecodeIssue::UnsupportedEncoding(name.clone())),
    }
}

/// Full pipeline: detect the encoding, then decode the source bytes.
pub fn detect_and_decode(bytes: &[u8]) -> Result<String, DecodeIssue> {
    let detection = detect(bytes);
    decode(&bytes[detection.source_start..], &detection.encoding)
}

#[cfg(test)]
mod tests;
