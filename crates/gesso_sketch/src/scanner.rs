//! Source cursor with line/column tracking.

use gesso_canvas::{Position, SourceLocation};

/// HTML whitespace: `[\t\r\n\f ]`
#[inline]
pub(crate) fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\r' | b'\n' | b'\x0c' | b' ')
}

pub(crate) struct Scanner<'a> {
    source: &'a str,
    pos: Position,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: Position::new(0, 1, 1),
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Rewinds to a previously observed position
    pub fn reset(&mut self, pos: Position) {
        self.pos = pos;
    }

    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos.offset as usize..]
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos.offset as usize >= self.source.len()
    }

    #[inline]
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Byte at `i` relative to the cursor
    #[inline]
    pub fn peek(&self, i: usize) -> Option<u8> {
        self.rest().as_bytes().get(i).copied()
    }

    /// Relative index of `needle`, searching from relative index `from`
    pub fn find(&self, needle: &str, from: usize) -> Option<usize> {
        let hay = self.rest().as_bytes();
        if from > hay.len() {
            return None;
        }
        if let [b] = needle.as_bytes() {
            return memchr::memchr(*b, &hay[from..]).map(|i| i + from);
        }
        memchr::memmem::find(&hay[from..], needle.as_bytes()).map(|i| i + from)
    }

    /// Consumes `n` bytes; `n` must land on a char boundary.
    pub fn advance_by(&mut self, n: usize) {
        let rest = self.rest();
        let n = n.min(rest.len());
        self.pos = self.pos.advanced(&rest[..n]);
    }

    pub fn advance_spaces(&mut self) {
        let n = self
            .rest()
            .bytes()
            .take_while(|b| is_html_whitespace(*b))
            .count();
        if n > 0 {
            self.advance_by(n);
        }
    }

    /// Location from `start` to the cursor
    pub fn selection(&self, start: Position) -> SourceLocation {
        self.selection_between(start, self.pos)
    }

    pub fn selection_between(&self, start: Position, end: Position) -> SourceLocation {
        SourceLocation::new(
            start,
            end,
            &self.source[start.offset as usize..end.offset as usize],
        )
    }
}
