//! Growable buffer of Unicode scalar values.
//!
//! The tokenizer addresses source text by code-point index, never by byte.
//! Storing the decoded scalars up front makes every position a plain array
//! index and keeps columns in code points for free.
//!
//! The buffer only ever grows (interactive input appends one line at a
//! time), so indices handed out earlier remain valid for the lifetime of
//! the buffer. Sub-range views are `(offset, length)` pairs resolved
//! against the buffer on demand; no text is copied until a caller asks
//! for a `String`.

/// Growable buffer of code points with stable indices.
#[derive(Clone, Debug, Default)]
pub struct CodePointBuffer {
    points: Vec<u32>,
}

impl CodePointBuffer {
    /// Create an empty buffer. Used for line-at-a-time input.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a buffer holding the code points of `source`.
    ///
    /// A leading U+FEFF byte order mark is dropped; it is an encoding
    /// artifact, not source text.
    pub fn from_source(source: &str) -> Self {
        let mut buf = Self::new();
        let stripped = source.strip_prefix('\u{FEFF}').unwrap_or(source);
        buf.append(stripped);
        buf
    }

    /// Append the code points of `text` to the end of the buffer.
    ///
    /// Growth reserves at least half the current capacity again, so a
    /// long run of short interactive lines stays amortized linear.
    pub fn append(&mut self, text: &str) {
        let added = text.chars().count();
        let needed = self.points.len() + added;
        if needed > self.points.capacity() {
            let grown = self.points.capacity() + self.points.capacity() / 2;
            let target = grown.max(needed);
            self.points.reserve_exact(target - self.points.len());
        }
        self.points.extend(text.chars().map(|c| c as u32));
    }

    /// Number of code points in the buffer.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the buffer holds no code points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Code point at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.points.get(index).copied()
    }

    /// View of the code points in `[start, end)`, clamped to the buffer.
    pub fn slice(&self, start: usize, end: usize) -> &[u32] {
        let end = end.min(self.points.len());
        let start = start.min(end);
        &self.points[start..end]
    }

    /// The text covered by `[start, end)` as an owned string.
    ///
    /// Buffers are only ever filled from `&str` input, so every stored
    /// value is a valid scalar; anything else would indicate memory
    /// corruption and is mapped to U+FFFD rather than trusted.
    pub fn text(&self, start: usize, end: usize) -> String {
        self.slice(start, end)
            .iter()
            .map(|&cp| char::from_u32(cp).unwrap_or('\u{FFFD}'))
            .collect()
    }
}

#[cfg(test)]
mod tests;
