use std::collections::VecDeque;

/// Accumulates raw body bytes and hands out complete lines
///
/// Network chunks split lines (and UTF-8 sequences) at arbitrary offsets, so
/// bytes stay buffered until a `\n` arrives. Returned lines have the trailing
/// `\r\n` / `\n` removed.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line, or `None` until more bytes arrive
    ///
    /// The inner `Err` carries a line that was not valid UTF-8; it has already
    /// been consumed so the caller can skip it.
    pub fn next_line(&mut self) -> Option<Result<String, std::str::Utf8Error>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line(&line_bytes))
    }

    /// Drain whatever is left once the body has ended without a final newline
    pub fn take_remainder(&mut self) -> Option<Result<String, std::str::Utf8Error>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(&line_bytes))
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> Result<String, std::str::Utf8Error> {
    std::str::from_utf8(bytes).map(|line| line.trim_end_matches(['\n', '\r']).to_string())
}
