//! Pattern buffer with efficient tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt patterns,
//! rather than the entire output. A full `show running-config` can run to
//! hundreds of kilobytes, so rescanning it on every chunk would dominate.

use regex::bytes::Regex;

/// Buffer for accumulating output and efficiently searching for patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    ///
    /// # Arguments
    ///
    /// * `search_depth` - Number of bytes from the end to search for patterns.
    ///   Default recommendation is 1000 bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Returns the match if found, with byte offsets relative to the
    /// start of the search region (not the full buffer).
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..])
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Cisco IOS Software");
        assert_eq!(buffer.take(), b"Cisco IOS Software");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mSW1#\x1b[0m");
        assert_eq!(buffer.take(), b"SW1#");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nSW1#");

        let pattern = Regex::new(r"SW1#").unwrap();
        assert!(buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"SW1#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"SW1#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"hostname SW1");
        assert_eq!(buffer.take(), b"hostname SW1");
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = PatternBuffer::new(1000);
        buffer.extend(b"stale banner");
        buffer.clear();
        assert!(buffer.take().is_empty());
    }
}
