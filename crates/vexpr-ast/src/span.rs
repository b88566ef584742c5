//! Source location tracking for error reporting.
//!
//! Expression programs are single anonymous strings handed over by the host,
//! so there is no file table here: a [`Span`] is a byte range into the one
//! source string, and [`SourceText`] provides line indexing for turning byte
//! offsets into human-readable (line, column) positions.

use serde::{Deserialize, Serialize};

/// Compact source location reference.
///
/// Points to a byte range in the program source (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a zero-length span at the start of the source.
    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Check if this span is zero-length.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Get the length of this span in bytes.
    ///
    /// # Panics
    /// Panics if end < start (malformed span).
    pub fn len(&self) -> u32 {
        assert!(
            self.end >= self.start,
            "malformed span: end ({}) < start ({})",
            self.end,
            self.start
        );
        self.end - self.start
    }

    /// Merge two spans (returns span covering both).
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Extend this span to include another span.
    pub fn extend(&mut self, other: &Span) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }
}

/// Program source with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceText {
    /// Original source text
    pub source: String,
    /// Byte offsets of each line start
    ///
    /// line_starts[0] is always 0 (start of source).
    /// line_starts.len() == number of lines + 1 (includes EOF sentinel).
    pub line_starts: Vec<u32>,
}

impl SourceText {
    /// Create a new source text with precomputed line starts.
    pub fn new(source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            source,
            line_starts,
        }
    }

    /// Get the source snippet for a span.
    pub fn snippet(&self, span: &Span) -> &str {
        &self.source[span.start as usize..span.end as usize]
    }

    /// Get (line, column) for a byte offset.
    ///
    /// Both line and column are 1-based.
    ///
    /// # Panics
    /// Panics if offset is beyond EOF.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        assert!(
            offset <= self.source.len() as u32,
            "offset {} is beyond EOF (len = {})",
            offset,
            self.source.len()
        );

        // Binary search to find the line
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,             // Exact match (start of line)
            Err(idx) => idx.max(1) - 1, // Falls within line idx-1
        };

        let line = (line_idx + 1) as u32; // 1-based line number
        let col = (offset - self.line_starts[line_idx]) + 1; // 1-based column

        (line, col)
    }

    /// Get the byte range for a given line number (1-based).
    ///
    /// Returns None if the line number is out of bounds.
    pub fn line_range(&self, line: u32) -> Option<(u32, u32)> {
        // Valid lines are 1..=(line_starts.len() - 1)
        // since line_starts[N-1] is the EOF sentinel
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }

        let line_idx = (line - 1) as usize;
        let start = self.line_starts[line_idx];
        let end = self.line_starts[line_idx + 1];

        Some((start, end))
    }

    /// Get the text of a specific line (1-based).
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let (start, end) = self.line_range(line)?;
        Some(&self.source[start as usize..end as usize])
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        // line_starts includes EOF sentinel, so count is len - 1
        self.line_starts.len() - 1
    }
}

/// Compute byte offsets of line starts in source text.
///
/// Returns a Vec where:
/// - line_starts[0] is byte 0 (start of line 1)
/// - line_starts[i] is the start of line i+1
/// - line_starts[N-1] is EOF (sentinel for last line's end)
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0]; // First line always starts at 0

    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32); // Next line starts after '\n'
        }
    }

    // EOF sentinel (needed to compute the last line's range)
    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }

    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_creation() {
        let span = Span::new(10, 20);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());

        let empty = Span::zero();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn test_span_merge() {
        let span1 = Span::new(10, 20);
        let span2 = Span::new(15, 30);
        let merged = span1.merge(&span2);

        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    fn test_span_extend() {
        let mut span1 = Span::new(10, 20);
        let span2 = Span::new(15, 30);
        span1.extend(&span2);

        assert_eq!(span1.start, 10);
        assert_eq!(span1.end, 30);
    }

    #[test]
    fn test_compute_line_starts() {
        // Source without trailing newline
        let source = "line 1\nline 2\nline 3";
        let line_starts = compute_line_starts(source);
        // Lines start at: 0, 7, 14, EOF at 20
        assert_eq!(line_starts, vec![0, 7, 14, 20]);

        // Source with trailing newline
        let source_with_trailing = "line 1\nline 2\n";
        let line_starts = compute_line_starts(source_with_trailing);
        assert_eq!(line_starts, vec![0, 7, 14]);
    }

    #[test]
    fn test_line_col() {
        let text = SourceText::new("hello\nworld\n".to_string());

        assert_eq!(text.line_col(0), (1, 1)); // 'h'
        assert_eq!(text.line_col(5), (1, 6)); // '\n'
        assert_eq!(text.line_col(6), (2, 1)); // 'w'
        assert_eq!(text.line_col(11), (2, 6)); // '\n'
    }

    #[test]
    fn test_line_range_and_text() {
        let text = SourceText::new("hello\nworld\n".to_string());

        assert_eq!(text.line_range(1), Some((0, 6))); // "hello\n"
        assert_eq!(text.line_range(2), Some((6, 12))); // "world\n"
        assert_eq!(text.line_range(3), None); // Out of bounds

        assert_eq!(text.line_text(1), Some("hello\n"));
        assert_eq!(text.line_text(3), None);
    }

    #[test]
    fn test_snippet() {
        let text = SourceText::new("RESULT = src0 + 1;".to_string());
        let span = Span::new(9, 13);
        assert_eq!(text.snippet(&span), "src0");
    }

    #[test]
    #[should_panic(expected = "malformed span")]
    fn test_span_len_panics_on_inverted() {
        let span = Span::new(10, 5); // end < start
        let _ = span.len();
    }

    #[test]
    #[should_panic(expected = "beyond EOF")]
    fn test_line_col_panics_on_out_of_bounds() {
        let text = SourceText::new("abc".to_string());
        let _ = text.line_col(4); // offset beyond EOF
    }
}
