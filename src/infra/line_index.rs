//! Newline index with LF/CRLF-robust line/byte mapping.
//!
//! Goals
//! - Single pass over bytes to record '\n' positions.
//! - 1-based external line numbers (friendly for UX).
//! - O(1) line→byte start/end via the index.
//! - End byte excludes trailing '\r' for CRLF lines.
//! - Binary search for byte→line mapping.
//! - Columns are 1-based and counted in chars, matching editor cursors.
//!
//! Notes
//! - An empty buffer has 0 lines.
//! - A non-empty buffer without '\n' has 1 line.
//! - For ranges, end is exclusive (Rust slicing convention).

#[derive(Debug, Clone)]
pub struct NewlineIndex {
    /// Byte positions of every '\n' in the buffer.
    nl_positions: Vec<usize>,
    /// Total byte length of the buffer.
    len: usize,
}

impl NewlineIndex {
    /// Build an index recording positions of '\n'.
    pub fn build(bytes: &[u8]) -> Self {
        let mut nl_positions = Vec::with_capacity(bytes.len() / 48);
        let mut i = 0usize;

        // Single pass; record every '\n' offset.
        while let Some(pos) = memchr::memchr(b'\n', &bytes[i..]) {
            let abs = i + pos;
            nl_positions.push(abs);
            i = abs + 1;
        }

        Self {
            nl_positions,
            len: bytes.len(),
        }
    }

    /// Total number of logical lines.
    /// Empty buffer => 0 lines; else (#'\n' + 1).
    pub fn line_count(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.nl_positions.len() + 1
        }
    }

    /// Start byte (inclusive) of a 1-based line.
    /// Returns None if line is out of range.
    pub fn start_byte_of_line(&self, line1: usize) -> Option<usize> {
        let total = self.line_count();
        if line1 == 0 || line1 > total {
            return None;
        }
        if line1 == 1 {
            return Some(0);
        }
        // For line L>1, start is one past the previous '\n'.
        self.nl_positions
            .get(line1 - 2)
            .map(|&prev_nl| prev_nl + 1)
    }

    /// End byte (exclusive) of a 1-based line.
    /// Returns None if line is out of range.
    /// For CRLF, excludes trailing '\r' before '\n'.
    pub fn end_byte_of_line(&self, line1: usize, bytes: &[u8]) -> Option<usize> {
        let total = self.line_count();
        if line1 == 0 || line1 > total {
            return None;
        }

        // Lines that end with '\n' (not the last line without NL)
        if line1 <= self.nl_positions.len() {
            let nl = self.nl_positions[line1 - 1];
            // If preceding byte is '\r', exclude it.
            if nl > 0 && bytes.get(nl.wrapping_sub(1)) == Some(&b'\r') {
                return Some(nl - 1);
            }
            return Some(nl);
        }

        // Last line without trailing '\n' ends at EOF.
        Some(self.len)
    }

    /// 1-based line number covering the given byte offset.
    /// Offsets at '\n' belong to the *next* line.
    /// Returns 0 for empty buffers.
    pub fn line_of_byte(&self, byte: usize) -> usize {
        if self.len == 0 {
            return 0;
        }
        // Count how many '\n' are strictly before `byte`.
        // upper_bound on nl_positions for `byte - 1`.
        let idx = match self.nl_positions.binary_search(&byte) {
            Ok(pos) => pos + 1, // at NL → next line
            Err(pos) => pos,    // number of NLs before `byte`
        };
        idx + 1
    }

    /// 1-based `(line, column)` of a byte offset; column counts chars.
    pub fn position_of_byte(&self, byte: usize, bytes: &[u8]) -> (usize, usize) {
        let line = self.line_of_byte(byte).max(1);
        let start = self.start_byte_of_line(line).unwrap_or(0);
        let end = byte.min(self.len).max(start);
        let column = String::from_utf8_lossy(&bytes[start..end]).chars().count() + 1;
        (line, column)
    }

    /// Byte offset of a 1-based `(line, column)`; `None` past the line end.
    pub fn byte_of_position(&self, line1: usize, column1: usize, bytes: &[u8]) -> Option<usize> {
        if column1 == 0 {
            return None;
        }
        let start = self.start_byte_of_line(line1)?;
        let end = self.end_byte_of_line(line1, bytes)?;
        let text = std::str::from_utf8(&bytes[start..end]).ok()?;
        if column1 == 1 {
            return Some(start);
        }
        // Column one past the last char addresses the line end
        match text.char_indices().nth(column1 - 1) {
            Some((offset, _)) => Some(start + offset),
            None if text.chars().count() + 1 == column1 => Some(end),
            None => None,
        }
    }
}
