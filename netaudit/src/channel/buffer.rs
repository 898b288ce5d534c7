//! Pattern buffer with incremental, destructive matching.
//!
//! Output is accumulated here until a pattern matches; the match and
//! everything before it is then split off, so the next search only ever sees
//! output that arrived after the previous match.
//!
//! Searching restarts `search_depth` bytes before the previously scanned end
//! rather than at the start of the buffer, which keeps prompt detection cheap
//! on large outputs (e.g. full running configurations) while still finding
//! prompts split across reads.

use std::fmt;
use std::ops::Range;

use bytes::{Bytes, BytesMut};
use vte::{Parser, Perform};

use super::patterns::{PromptMatcher, earliest_match};

/// Buffer for accumulating output and searching it for patterns.
pub struct PatternBuffer {
    /// The accumulated, escape-stripped output.
    buffer: BytesMut,

    /// Terminal parser, kept across reads so split escape sequences are
    /// still recognised.
    parser: Parser,

    /// How far before the last scanned position a new search starts.
    search_depth: usize,

    /// Length of the buffer at the last unsuccessful search.
    scanned: usize,
}

/// Collects the printable part of the terminal stream.
struct Printable<'a> {
    out: &'a mut BytesMut,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // Keep line structure; drop CR, BEL, backspace and friends.
        if byte == b'\n' || byte == b'\t' {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            parser: Parser::new(),
            search_depth,
            scanned: 0,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut printable = Printable {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut printable, data);
    }

    /// Search the unscanned part of the buffer for the earliest match.
    ///
    /// Returns the index of the matching pattern and the match span relative
    /// to the start of the buffer. A miss remembers how far the buffer was
    /// scanned so the next call skips most of it. The search window always
    /// starts at a line boundary so line-anchored prompts stay anchored.
    pub fn find<M: PromptMatcher>(&mut self, patterns: &[M]) -> Option<(usize, Range<usize>)> {
        let tail = self.scanned.saturating_sub(self.search_depth);
        let start = memchr::memrchr(b'\n', &self.buffer[..tail]).map_or(0, |newline| newline + 1);
        let found = earliest_match(patterns, &self.buffer[start..])
            .map(|(index, span)| (index, span.start + start..span.end + start));
        if found.is_none() {
            self.scanned = self.buffer.len();
        }
        found
    }

    /// Split off everything up to `end` and reset the scan position.
    pub fn consume(&mut self, end: usize) -> Bytes {
        self.scanned = 0;
        self.buffer.split_to(end.min(self.buffer.len())).freeze()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Bytes {
        self.scanned = 0;
        self.buffer.split().freeze()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .field("scanned", &self.scanned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Pattern;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_slice(), b"Green text");
    }

    #[test]
    fn test_escape_split_across_reads() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"router\x1b[3");
        buffer.extend(b"2m#");
        assert_eq!(buffer.as_slice(), b"router#");
    }

    #[test]
    fn test_carriage_returns_dropped() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"line one\r\nline two\r\n");
        assert_eq!(buffer.as_slice(), b"line one\nline two\n");
    }

    #[test]
    fn test_consume_is_destructive() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Username: admin\nPassword: ");
        let patterns = [Pattern::literal("Username:")];

        let (_, span) = buffer.find(&patterns).unwrap();
        assert_eq!(&buffer.consume(span.end)[..], b"Username:");

        // Same pattern must not match the consumed text again
        assert!(buffer.find(&patterns).is_none());
        assert_eq!(buffer.as_slice(), b" admin\nPassword: ");
    }

    #[test]
    fn test_match_straddling_reads() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nrout");

        let patterns = [Pattern::regex(r"router#\s*$").unwrap()];
        assert!(buffer.find(&patterns).is_none());

        buffer.extend(b"er#");
        let (index, span) = buffer.find(&patterns).unwrap();
        assert_eq!(index, 0);
        assert_eq!(&buffer.as_slice()[span], b"router#");
    }

    #[test]
    fn test_anchored_prompt_ignores_hash_inside_a_line() {
        let mut buffer = PatternBuffer::new(3);
        let patterns = [Pattern::regex(r"(?m:^)[\w.\-@/:]{1,63}#\s*$").unwrap()];

        buffer.extend(b"snmp-server community pub");
        assert!(buffer.find(&patterns).is_none());
        buffer.extend(b"#");
        assert!(buffer.find(&patterns).is_none());

        buffer.extend(b"lic RO\nr1#");
        let (_, span) = buffer.find(&patterns).unwrap();
        assert_eq!(&buffer.as_slice()[span], b"r1#");
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(&buffer.take()[..], b"test data");
        assert!(buffer.is_empty());
    }
}
